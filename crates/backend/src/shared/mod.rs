pub mod config;
pub mod data;
pub mod pictures;
pub mod state;
