//! threadboard/crates/tb-core/src/lib.rs
//!
//! The central domain types and interface definitions for threadboard.

pub mod error;
pub mod models;
pub mod traits;
pub mod validation;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;
