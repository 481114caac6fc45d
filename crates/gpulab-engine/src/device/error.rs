use thiserror::Error;

use super::lifecycle::Pass;

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM); terminate gracefully.
    Fatal,
}

/// Frame and pass ordering violations.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Error)]
pub enum LifecycleError {
    #[error("a frame is already in progress")]
    FrameAlreadyBegun,

    #[error("no frame in progress")]
    NoFrame,

    #[error("cannot begin a {requested} pass while a {open} pass is open")]
    PassAlreadyOpen { requested: Pass, open: Pass },

    #[error("cannot end a {requested} pass: {}", describe_open(.open))]
    PassNotOpen { requested: Pass, open: Option<Pass> },

    #[error("cannot end the frame while a {0} pass is open")]
    PassOpenAtFrameEnd(Pass),

    #[error("operation requires no open pass, but a {0} pass is open")]
    PassOpen(Pass),
}

/// Transfer buffer misuse.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Error)]
pub enum TransferError {
    #[error("transfer buffer was consumed by an upload; map it with cycle = true to reuse it")]
    NotCycled,

    #[error("transfer buffer has no data; map and write it before uploading")]
    NotWritten,

    #[error("transfer buffer was already consumed by a previous copy pass")]
    AlreadyConsumed,

    #[error("write of {len} bytes at offset {offset} exceeds transfer buffer size {size}")]
    OutOfBounds { offset: u64, len: u64, size: u64 },
}

fn describe_open(open: &Option<Pass>) -> String {
    match open {
        Some(pass) => format!("a {pass} pass is open"),
        None => "no pass is open".to_string(),
    }
}
