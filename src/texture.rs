//! Image decoding and GPU textures.
//!
//! Decoding and uploading are split so the expensive half can run anywhere:
//!
//! - [`ImageData`] holds decoded RGBA8 pixels and needs no device. The model
//!   loader produces these on its worker thread, and comparison images are
//!   opened with [`ImageData::open`] at start-up.
//! - [`Texture`] is the uploaded, sampleable form. All textures are
//!   `Rgba8UnormSrgb`, so shaders read linear values.
//!
//! Textures are only created on the render thread, from an [`ImageData`] or
//! raw bytes.

use std::path::Path;

use crate::gpu::GpuContext;

/// Decoded RGBA8 pixels, produced off the render thread.
///
/// `pixels` is tightly packed, row-major, `width * height * 4` bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl ImageData {
    pub fn from_rgba(image: image::RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            pixels: image.into_raw(),
        }
    }

    /// Open and decode an image file in any format the `image` crate
    /// recognises.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, image::ImageError> {
        Ok(Self::from_rgba(image::open(path)?.to_rgba8()))
    }

    /// Width over height, or 1 for an empty image.
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// A GPU texture that can be bound to shaders.
///
/// Carries its own linear, repeating sampler so a texture can be bound as a
/// texture/sampler pair in one step.
#[derive(Debug)]
pub struct Texture {
    #[allow(dead_code)]
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    /// Create an sRGB texture from raw RGBA data.
    pub fn from_rgba(gpu: &GpuContext, data: &[u8], width: u32, height: u32, label: &str) -> Self {
        use wgpu::util::DeviceExt;

        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", label)),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            width,
            height,
        }
    }

    pub fn from_image(gpu: &GpuContext, image: &ImageData, label: &str) -> Self {
        Self::from_rgba(gpu, &image.pixels, image.width, image.height, label)
    }

    /// 1x1 opaque white, bound where a material has no texture.
    pub fn white(gpu: &GpuContext) -> Self {
        Self::from_rgba(gpu, &[255, 255, 255, 255], 1, 1, "White Texture")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_png_files() {
        let path = std::env::temp_dir().join(format!("vitrine-{}-wide.png", std::process::id()));
        image::RgbaImage::from_pixel(4, 2, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let decoded = ImageData::open(&path).unwrap();
        assert_eq!((decoded.width, decoded.height), (4, 2));
        assert_eq!(&decoded.pixels[..4], &[10, 20, 30, 255]);
        assert_eq!(decoded.aspect(), 2.0);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn rejects_missing_files() {
        assert!(ImageData::open(std::env::temp_dir().join("vitrine-no-such-image.png")).is_err());
    }

    #[test]
    fn empty_image_has_unit_aspect() {
        let data = ImageData::from_rgba(image::RgbaImage::new(0, 0));
        assert_eq!(data.aspect(), 1.0);
    }
}
