//! Pipeline module - data loading, cleaning, exploration, resampling
//! partitions, and preprocessing recipes

pub mod clean;
pub mod explore;
pub mod impute;
pub mod loader;
pub mod recipe;
pub mod split;

pub use clean::*;
pub use explore::*;
pub use impute::*;
pub use loader::*;
pub use recipe::*;
pub use split::*;
