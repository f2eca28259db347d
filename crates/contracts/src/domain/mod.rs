pub mod defect;
pub mod inspection;
pub mod playdevice;
pub mod playground;
