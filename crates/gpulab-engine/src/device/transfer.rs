use crate::resource::Tracked;

use super::error::TransferError;

/// Where a transfer buffer is in its map/upload cycle.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TransferState {
    /// Created, never written.
    Unmapped,
    /// Written and unmapped; ready for an upload.
    Written,
    /// Read by an upload in the copy pass with this id.
    Consumed { pass: u64 },
}

impl TransferState {
    /// Validates a map request.
    ///
    /// Returns `true` when the buffer must get fresh backing storage before the
    /// write, which is the case when a consumed buffer is cycled.
    pub fn begin_map(self, cycle: bool) -> Result<bool, TransferError> {
        match self {
            TransferState::Unmapped | TransferState::Written => Ok(false),
            TransferState::Consumed { .. } if cycle => Ok(true),
            TransferState::Consumed { .. } => Err(TransferError::NotCycled),
        }
    }

    /// Validates an upload from the buffer during copy pass `pass`.
    ///
    /// Several uploads may read the same data within one copy pass.
    pub fn consume(self, pass: u64) -> Result<TransferState, TransferError> {
        match self {
            TransferState::Unmapped => Err(TransferError::NotWritten),
            TransferState::Written => Ok(TransferState::Consumed { pass }),
            TransferState::Consumed { pass: used } if used == pass => Ok(self),
            TransferState::Consumed { .. } => Err(TransferError::AlreadyConsumed),
        }
    }
}

/// Staging memory used to move CPU data into GPU buffers and textures.
///
/// Writes land in a CPU-side copy first; unmapping queues the whole copy into
/// the GPU staging buffer, which uploads then read from.
pub struct TransferBuffer {
    pub(crate) buffer: Tracked<wgpu::Buffer>,
    pub(crate) data: Vec<u8>,
    pub(crate) state: TransferState,
}

impl TransferBuffer {
    pub(crate) fn new(buffer: Tracked<wgpu::Buffer>, size: usize) -> Self {
        Self {
            buffer,
            data: vec![0; size],
            state: TransferState::Unmapped,
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub(crate) fn raw(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Checks that `len` bytes starting at `offset` lie inside the buffer.
    pub(crate) fn check_range(&self, offset: u64, len: u64) -> Result<(), TransferError> {
        let size = self.size();
        match offset.checked_add(len) {
            Some(end) if end <= size => Ok(()),
            _ => Err(TransferError::OutOfBounds { offset, len, size }),
        }
    }
}

/// Rounds a transfer size up to the buffer copy alignment.
pub(crate) fn aligned_transfer_size(size: u64) -> u64 {
    let align = wgpu::COPY_BUFFER_ALIGNMENT;
    size.div_ceil(align).max(1) * align
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_buffer_maps_without_cycle() {
        assert_eq!(TransferState::Unmapped.begin_map(false), Ok(false));
        assert_eq!(TransferState::Unmapped.begin_map(true), Ok(false));
    }

    #[test]
    fn consumed_buffer_requires_cycle() {
        let consumed = TransferState::Consumed { pass: 1 };
        assert_eq!(consumed.begin_map(false), Err(TransferError::NotCycled));
        assert_eq!(consumed.begin_map(true), Ok(true));
    }

    #[test]
    fn upload_requires_written_data() {
        assert_eq!(
            TransferState::Unmapped.consume(1),
            Err(TransferError::NotWritten)
        );
        assert_eq!(
            TransferState::Written.consume(1),
            Ok(TransferState::Consumed { pass: 1 })
        );
    }

    #[test]
    fn same_pass_may_read_twice() {
        let consumed = TransferState::Written.consume(4).unwrap();
        assert_eq!(consumed.consume(4), Ok(consumed));
        assert_eq!(consumed.consume(5), Err(TransferError::AlreadyConsumed));
    }

    #[test]
    fn rewriting_before_upload_is_allowed() {
        assert_eq!(TransferState::Written.begin_map(false), Ok(false));
    }

    #[test]
    fn transfer_sizes_are_copy_aligned() {
        assert_eq!(aligned_transfer_size(0), 4);
        assert_eq!(aligned_transfer_size(3), 4);
        assert_eq!(aligned_transfer_size(92), 92);
        assert_eq!(aligned_transfer_size(93), 96);
    }
}
