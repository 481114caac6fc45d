//! Helpers shared by several scenes: pod copies into transfer buffers,
//! quad geometry and image textures.

use anyhow::Result;
use bytemuck::Pod;

use gpulab_engine::content::{pad_rows, padded_bytes_per_row, Image};
use gpulab_engine::device::{binding, Renderer, TransferBuffer};
use gpulab_engine::resource::Tracked;

/// Two triangles over a four-vertex quad.
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// Copies `items` into `dst` at `offset`; returns the end offset.
pub fn write_pod<T: Pod>(dst: &mut [u8], offset: usize, items: &[T]) -> usize {
    let bytes: &[u8] = bytemuck::cast_slice(items);
    let end = offset + bytes.len();
    dst[offset..end].copy_from_slice(bytes);
    end
}

/// Byte length of `items` as a GPU size.
pub fn byte_size<T: Pod>(items: &[T]) -> u64 {
    std::mem::size_of_val(items) as u64
}

/// Geometry buffers uploaded once at load time.
pub struct Geometry {
    pub vertices: Tracked<wgpu::Buffer>,
    pub indices: Option<Tracked<wgpu::Buffer>>,
}

/// Uploads `vertices` (and `indices` when given) through one transfer buffer
/// and one copy pass. The transfer buffer is released once the upload is
/// submitted.
pub fn upload_geometry<V: Pod>(
    renderer: &mut Renderer<'_>,
    label: &str,
    vertices: &[V],
    indices: Option<&[u16]>,
) -> Result<Geometry> {
    let vertex_size = byte_size(vertices);
    let index_size = indices.map_or(0, byte_size);

    let vertex_buffer = renderer.create_buffer(
        label,
        wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        vertex_size,
    );
    let index_buffer = indices.map(|_| {
        renderer.create_buffer(
            label,
            wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            index_size,
        )
    });

    let mut transfer = renderer.create_transfer_buffer(vertex_size + index_size);
    renderer.map_transfer_buffer(&mut transfer, false, |data| {
        let end = write_pod(data, 0, vertices);
        if let Some(indices) = indices {
            write_pod(data, end, indices);
        }
    })?;

    renderer.begin_upload()?;
    renderer.upload_to_buffer(&mut transfer, 0, &vertex_buffer, 0, vertex_size)?;
    if let Some(index_buffer) = index_buffer.as_ref() {
        renderer.upload_to_buffer(&mut transfer, vertex_size, index_buffer, 0, index_size)?;
    }
    renderer.end_upload()?;
    renderer.release(transfer);

    Ok(Geometry {
        vertices: vertex_buffer,
        indices: index_buffer,
    })
}

/// Sampled RGBA8 texture sized for `image`, ready to receive an upload.
pub fn create_image_texture(
    renderer: &Renderer<'_>,
    label: &str,
    image: &Image,
) -> Tracked<wgpu::Texture> {
    renderer.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: image_extent(image),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    })
}

pub fn image_extent(image: &Image) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: image.width,
        height: image.height,
        depth_or_array_layers: 1,
    }
}

/// Image rows staged in a transfer buffer with the row pitch texture copies
/// require.
pub struct StagedImage {
    pub transfer: TransferBuffer,
    pub bytes_per_row: u32,
    pub extent: wgpu::Extent3d,
}

pub fn stage_image(renderer: &Renderer<'_>, image: &Image) -> Result<StagedImage> {
    let row_bytes = image.row_bytes();
    let bytes_per_row = padded_bytes_per_row(row_bytes);
    let mut transfer =
        renderer.create_transfer_buffer(u64::from(bytes_per_row) * u64::from(image.height));

    renderer.map_transfer_buffer(&mut transfer, false, |data| {
        pad_rows(
            &image.pixels,
            row_bytes as usize,
            bytes_per_row as usize,
            data,
        );
    })?;

    Ok(StagedImage {
        transfer,
        bytes_per_row,
        extent: image_extent(image),
    })
}

/// Loads `Content/Images/<name>` into a new sampled texture.
pub fn load_image_texture(renderer: &mut Renderer<'_>, name: &str) -> Result<Tracked<wgpu::Texture>> {
    let image = renderer.load_bmp_image(name)?;
    let texture = create_image_texture(renderer, name, &image);
    let mut staged = stage_image(renderer, &image)?;

    renderer.begin_upload()?;
    renderer.upload_to_texture(
        &mut staged.transfer,
        0,
        staged.bytes_per_row,
        &texture,
        staged.extent,
    )?;
    renderer.end_upload()?;
    renderer.release(staged);

    Ok(texture)
}

/// Layout for a texture at binding 0 and its sampler at binding 1, both
/// visible to the fragment stage.
pub fn texture_sampler_layout(renderer: &Renderer<'_>, label: &str) -> wgpu::BindGroupLayout {
    renderer.create_bind_group_layout(
        label,
        &[
            binding::sampled_texture(0, wgpu::ShaderStages::FRAGMENT),
            binding::filtering_sampler(1, wgpu::ShaderStages::FRAGMENT),
        ],
    )
}

pub fn texture_sampler_group(
    renderer: &Renderer<'_>,
    label: &str,
    layout: &wgpu::BindGroupLayout,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    renderer.create_bind_group(
        label,
        layout,
        &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vertex::PositionTextureVertex;

    #[test]
    fn write_pod_appends_after_previous_items() {
        let mut data = vec![0u8; 32];
        let verts = [PositionTextureVertex::new(1.0, 0.0, 0.0, 0.0, 0.0)];
        let end = write_pod(&mut data, 0, &verts);
        assert_eq!(end, 20);

        let end = write_pod(&mut data, end, &QUAD_INDICES);
        assert_eq!(end, 32);
        assert_eq!(&data[20..22], &0u16.to_ne_bytes());
        assert_eq!(&data[30..32], &3u16.to_ne_bytes());
        assert_eq!(&data[0..4], &1.0f32.to_ne_bytes());
    }

    #[test]
    fn quad_indices_cover_both_triangles() {
        assert_eq!(byte_size(&QUAD_INDICES), 12);
        let mut used = QUAD_INDICES.to_vec();
        used.sort_unstable();
        used.dedup();
        assert_eq!(used, vec![0, 1, 2, 3]);
    }
}
