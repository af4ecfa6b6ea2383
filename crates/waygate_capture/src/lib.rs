pub mod capture;
pub mod gpu;
pub mod manager;
pub mod settings;
pub mod target;
