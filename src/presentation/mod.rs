pub mod frame;
pub mod frames;
pub mod images;
pub mod views;
