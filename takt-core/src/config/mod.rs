//! Configuration types
//!
//! Board-agnostic configuration structures. Parsing from files lives in the
//! application crate.

pub mod hardware;
pub mod types;

pub use hardware::*;
pub use types::*;
