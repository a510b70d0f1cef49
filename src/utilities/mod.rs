pub mod data_loader;
pub mod enums;
pub mod helpers;
