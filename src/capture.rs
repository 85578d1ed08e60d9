//! Copying rendered frames back to the CPU.

use anyhow::Context as _;

use crate::context::Context;

/// Read `texture` (RGBA8, `COPY_SRC`) into an image.
///
/// Rows are copied with the padding wgpu requires and stripped again, so any
/// width works.
pub async fn read_texture(ctx: &Context, texture: &wgpu::Texture) -> anyhow::Result<image::RgbaImage> {
    let (width, height) = (texture.width(), texture.height());
    let bytes_per_pixel = 4u32;
    let unpadded = bytes_per_pixel * width;
    let padded = unpadded.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
        * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

    let output_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("capture buffer"),
        size: (padded * height) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Capture Encoder"),
        });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &output_buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    ctx.queue.submit(std::iter::once(encoder.finish()));

    // Map first, then poll, then await. Otherwise the future never resolves.
    let buffer_slice = output_buffer.slice(..);
    let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    #[cfg(target_arch = "wasm32")]
    ctx.device.poll(wgpu::PollType::Poll)?;
    #[cfg(not(target_arch = "wasm32"))]
    ctx.device.poll(wgpu::PollType::Wait {
        submission_index: None,
        timeout: None,
    })?;
    rx.receive()
        .await
        .context("buffer mapping was cancelled")??;

    let pixels = {
        let data = buffer_slice.get_mapped_range();
        unpad_rows(&data, unpadded as usize, padded as usize, height as usize)
    };
    output_buffer.unmap();

    image::RgbaImage::from_raw(width, height, pixels)
        .context("captured pixel data does not fit the texture size")
}

fn unpad_rows(data: &[u8], row: usize, padded_row: usize, rows: usize) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(row * rows);
    for chunk in data.chunks(padded_row).take(rows) {
        pixels.extend_from_slice(&chunk[..row]);
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_row_padding() {
        let data = [1, 2, 3, 0, 0, 4, 5, 6, 0, 0];
        assert_eq!(unpad_rows(&data, 3, 5, 2), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn ignores_trailing_rows() {
        let data = [9; 12];
        assert_eq!(unpad_rows(&data, 2, 4, 2).len(), 4);
    }
}
