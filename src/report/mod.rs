//! Report module - terminal rendering and artifact export

pub mod session;
pub mod summary;

pub use session::*;
pub use summary::*;
