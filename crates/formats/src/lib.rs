pub mod config;
pub mod manifest;
pub mod stats;
pub mod track;

pub use config::*;
pub use manifest::*;
pub use stats::*;
pub use track::*;
