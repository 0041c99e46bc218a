/*!
 * Synchronization Primitives
 *
 * Building blocks the strategies and the driver are assembled from:
 * - Fixed-count wait group with RAII completion tokens
 * - Abortable start gate so workers begin mutating together
 * - Lock-striped map for the sharded concurrent backend
 * - Cache-line padded slot tables for atomic counters
 *
 * # Performance
 *
 * - Cache-line aligned slots to prevent false sharing
 * - Power-of-two stripe masks instead of modulo
 */

mod gate;
mod locks;
mod wait_group;

pub use gate::StartGate;
pub use locks::{Slot, SlotTable, StripedMap};
pub use wait_group::{CompletionToken, WaitGroup};
