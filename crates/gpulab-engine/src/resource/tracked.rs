use std::fmt;
use std::ops::Deref;

use super::ledger::{ResourceKind, ResourceLedger};

/// A GPU handle whose lifetime is recorded in a `ResourceLedger`.
///
/// Creation is recorded by `Tracked::new`; release is recorded when the value
/// is dropped, right before the inner handle is dropped.
pub struct Tracked<T> {
    inner: T,
    kind: ResourceKind,
    ledger: ResourceLedger,
}

impl<T> Tracked<T> {
    pub fn new(inner: T, kind: ResourceKind, ledger: &ResourceLedger) -> Self {
        ledger.record_create(kind);
        Self {
            inner,
            kind,
            ledger: ledger.clone(),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Replaces the inner handle, dropping the previous one.
    ///
    /// Counts as one release followed by one create of the same kind.
    pub fn replace(&mut self, inner: T) {
        self.ledger.record_release(self.kind);
        self.ledger.record_create(self.kind);
        self.inner = inner;
    }
}

impl<T> Deref for Tracked<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T> Drop for Tracked<T> {
    fn drop(&mut self) {
        self.ledger.record_release(self.kind);
    }
}

impl<T: fmt::Debug> fmt::Debug for Tracked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracked")
            .field("kind", &self.kind)
            .field("inner", &self.inner)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_records_release() {
        let ledger = ResourceLedger::new();
        let handle = Tracked::new(7u32, ResourceKind::Texture, &ledger);
        assert_eq!(*handle, 7);
        assert_eq!(ledger.live(ResourceKind::Texture), 1);

        drop(handle);
        assert!(ledger.snapshot().is_balanced());
    }

    #[test]
    fn dropping_a_container_releases_everything() {
        struct Resources {
            _a: Tracked<()>,
            _b: Tracked<()>,
            _c: Vec<Tracked<()>>,
        }

        let ledger = ResourceLedger::new();
        let mut held = Some(Resources {
            _a: Tracked::new((), ResourceKind::Shader, &ledger),
            _b: Tracked::new((), ResourceKind::GraphicsPipeline, &ledger),
            _c: (0..6)
                .map(|_| Tracked::new((), ResourceKind::Sampler, &ledger))
                .collect(),
        });
        assert_eq!(ledger.snapshot().total_live(), 8);

        drop(held.take());
        assert!(ledger.snapshot().is_balanced());
    }

    #[test]
    fn replace_keeps_live_count() {
        let ledger = ResourceLedger::new();
        let mut handle = Tracked::new(1u8, ResourceKind::TransferBuffer, &ledger);
        handle.replace(2);
        assert_eq!(*handle, 2);
        assert_eq!(ledger.live(ResourceKind::TransferBuffer), 1);
        assert_eq!(ledger.snapshot().created(ResourceKind::TransferBuffer), 2);
    }
}
