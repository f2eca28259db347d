pub mod defect;
pub mod document;
pub mod inspection;
pub mod playdevice;
pub mod playground;
