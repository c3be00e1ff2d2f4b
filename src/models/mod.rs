pub mod dtos;
pub mod entry;
