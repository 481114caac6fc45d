//! GPU resource accounting.
//!
//! Every handle the renderer creates is wrapped in a `Tracked<T>` bound to the
//! renderer's `ResourceLedger`. Dropping the handle releases the GPU object and
//! records the release, so a scene that drops everything it created leaves the
//! ledger balanced.

mod ledger;
mod tracked;

pub use ledger::{LedgerSnapshot, ResourceKind, ResourceLedger};
pub use tracked::Tracked;
