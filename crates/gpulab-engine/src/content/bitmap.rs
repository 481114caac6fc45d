use std::path::Path;

use anyhow::{Context, Result};

/// Decoded image, tightly packed RGBA8 rows.
#[derive(Debug, Clone)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Image {
    /// Decodes a BMP file and converts it to RGBA8.
    pub fn load_bmp(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read image {}", path.display()))?;
        Self::decode_bmp(&bytes).with_context(|| format!("failed to decode {}", path.display()))
    }

    pub fn decode_bmp(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Bmp)
            .context("BMP decode failed")?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }

    pub fn row_bytes(&self) -> u32 {
        self.width * 4
    }
}

/// Row pitch accepted by buffer-to-texture copies for `row_bytes` of data.
pub fn padded_bytes_per_row(row_bytes: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    row_bytes.div_ceil(align) * align
}

/// Copies tightly packed rows into `dst` using `padded` bytes per row.
///
/// `dst` must hold at least `padded * rows` bytes. Padding bytes are left
/// untouched.
pub fn pad_rows(src: &[u8], row_bytes: usize, padded: usize, dst: &mut [u8]) {
    for (row, chunk) in src.chunks_exact(row_bytes).enumerate() {
        let start = row * padded;
        dst[start..start + row_bytes].copy_from_slice(chunk);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2x1, 24-bit, bottom-up: blue pixel then red pixel, row padded to 8 bytes.
    const TINY_BMP: [u8; 62] = [
        b'B', b'M', 62, 0, 0, 0, 0, 0, 0, 0, 54, 0, 0, 0, // file header
        40, 0, 0, 0, 2, 0, 0, 0, 1, 0, 0, 0, 1, 0, 24, 0, // info header
        0, 0, 0, 0, 8, 0, 0, 0, 0x13, 0x0b, 0, 0, 0x13, 0x0b, 0, 0, //
        0, 0, 0, 0, 0, 0, 0, 0, //
        255, 0, 0, 0, 0, 255, 0, 0, // pixels (BGR) + padding
    ];

    #[test]
    fn decodes_bmp_to_rgba() {
        let img = Image::decode_bmp(&TINY_BMP).unwrap();
        assert_eq!((img.width, img.height), (2, 1));
        assert_eq!(img.pixels, vec![0, 0, 255, 255, 255, 0, 0, 255]);
        assert_eq!(img.row_bytes(), 8);
    }

    #[test]
    fn rejects_garbage() {
        assert!(Image::decode_bmp(b"not a bitmap").is_err());
    }

    #[test]
    fn row_pitch_rounds_up_to_copy_alignment() {
        assert_eq!(padded_bytes_per_row(4), 256);
        assert_eq!(padded_bytes_per_row(256), 256);
        assert_eq!(padded_bytes_per_row(257), 512);
        assert_eq!(padded_bytes_per_row(0), 0);
    }

    #[test]
    fn pad_rows_places_each_row_at_pitch() {
        let src = [1u8, 2, 3, 4, 5, 6];
        let mut dst = [0u8; 12];
        pad_rows(&src, 2, 4, &mut dst);
        assert_eq!(dst, [1, 2, 0, 0, 3, 4, 0, 0, 5, 6, 0, 0]);
    }
}
