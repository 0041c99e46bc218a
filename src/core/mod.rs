/*!
 * Core Module
 * Fundamental harness types, limits, synchronization primitives and error handling
 */

pub mod data_structures;
pub mod errors;
pub mod limits;
pub mod sync;
pub mod types;

// Re-export for convenience
pub use data_structures::InlineString;
pub use errors::*;
pub use types::*;
