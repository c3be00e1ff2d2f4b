pub mod error;
pub mod paths;
pub mod prompt;
