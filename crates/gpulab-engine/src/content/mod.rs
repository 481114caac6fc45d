//! On-disk content lookup: shaders and images under `Content/`.

mod bitmap;
mod paths;

pub use bitmap::{padded_bytes_per_row, pad_rows, Image};
pub use paths::ContentPaths;
