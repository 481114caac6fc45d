use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Category of a renderer-created resource.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ResourceKind {
    Shader,
    GraphicsPipeline,
    ComputePipeline,
    Buffer,
    Texture,
    Sampler,
    TransferBuffer,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::Shader,
        ResourceKind::GraphicsPipeline,
        ResourceKind::ComputePipeline,
        ResourceKind::Buffer,
        ResourceKind::Texture,
        ResourceKind::Sampler,
        ResourceKind::TransferBuffer,
    ];

    #[inline]
    fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::Shader => "shader",
            ResourceKind::GraphicsPipeline => "graphics pipeline",
            ResourceKind::ComputePipeline => "compute pipeline",
            ResourceKind::Buffer => "buffer",
            ResourceKind::Texture => "texture",
            ResourceKind::Sampler => "sampler",
            ResourceKind::TransferBuffer => "transfer buffer",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Default)]
struct Counters {
    created: [AtomicU64; ResourceKind::ALL.len()],
    released: [AtomicU64; ResourceKind::ALL.len()],
}

/// Shared create/release counters, one pair per `ResourceKind`.
///
/// Cloning is cheap and every clone observes the same counters.
#[derive(Debug, Clone, Default)]
pub struct ResourceLedger {
    counters: Arc<Counters>,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_create(&self, kind: ResourceKind) {
        self.counters.created[kind.index()].fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_release(&self, kind: ResourceKind) {
        self.counters.released[kind.index()].fetch_add(1, Ordering::Relaxed);
    }

    /// Handles of `kind` created and not yet released.
    pub fn live(&self, kind: ResourceKind) -> u64 {
        let created = self.counters.created[kind.index()].load(Ordering::Relaxed);
        let released = self.counters.released[kind.index()].load(Ordering::Relaxed);
        created.saturating_sub(released)
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        let mut live = [0u64; ResourceKind::ALL.len()];
        let mut created = [0u64; ResourceKind::ALL.len()];
        for kind in ResourceKind::ALL {
            live[kind.index()] = self.live(kind);
            created[kind.index()] = self.counters.created[kind.index()].load(Ordering::Relaxed);
        }
        LedgerSnapshot { live, created }
    }
}

/// Point-in-time copy of the ledger counters.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct LedgerSnapshot {
    live: [u64; ResourceKind::ALL.len()],
    created: [u64; ResourceKind::ALL.len()],
}

impl LedgerSnapshot {
    pub fn live(&self, kind: ResourceKind) -> u64 {
        self.live[kind.index()]
    }

    pub fn created(&self, kind: ResourceKind) -> u64 {
        self.created[kind.index()]
    }

    pub fn total_live(&self) -> u64 {
        self.live.iter().sum()
    }

    pub fn is_balanced(&self) -> bool {
        self.total_live() == 0
    }

    /// Kinds with live handles, paired with their count.
    pub fn leaks(&self) -> impl Iterator<Item = (ResourceKind, u64)> + '_ {
        ResourceKind::ALL
            .into_iter()
            .map(|kind| (kind, self.live(kind)))
            .filter(|(_, n)| *n > 0)
    }
}

impl fmt::Display for LedgerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_balanced() {
            return f.write_str("no live resources");
        }
        let mut first = true;
        for (kind, n) in self.leaks() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{n} {kind}")?;
            first = false;
        }
        Ok(())
    }
}
