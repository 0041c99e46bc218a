/*!
 * Lock-Based and Atomic Building Blocks
 *
 * - Striped locks (reduce contention via partitioning)
 * - Fixed slot tables (padded atomic cells for a known key set)
 */

mod slots;
mod striped;

// Re-export public API
pub use slots::{Slot, SlotTable};
pub use striped::StripedMap;
