pub mod auth;
pub mod home;
pub mod register;
pub mod users;
