pub mod clip;
pub mod optics;
pub mod pose;
pub mod resolution;
pub mod surface;
pub mod view;
