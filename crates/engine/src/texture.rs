//! Texture images: decode from disk, build mip chains on the CPU, upload.
//!
//! Mip levels are generated here with a triangle filter instead of a GPU blit
//! pass, and uploaded together with `create_texture_with_data`. An image that
//! cannot be read can be replaced by a 1x1 white texel so a scene still draws.

use std::path::Path;

use image::{Rgba, RgbaImage, imageops::FilterType};
use wgpu::util::DeviceExt;

use crate::error::TextureError;

/// Decoded RGBA8 pixels, one buffer per mip level (largest first).
#[derive(Debug, Clone)]
pub struct ImageData {
    width: u32,
    height: u32,
    levels: Vec<Vec<u8>>,
}

impl ImageData {
    pub fn load(path: impl AsRef<Path>, mipmaps: bool) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|source| TextureError::Image {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();
        tracing::debug!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "loaded texture image"
        );
        Ok(Self::from_rgba(image, mipmaps))
    }

    /// Like [`ImageData::load`], but falls back to [`ImageData::white`]
    /// and logs a warning when the file cannot be decoded.
    pub fn load_or_white(path: impl AsRef<Path>, mipmaps: bool) -> Self {
        match Self::load(path, mipmaps) {
            Ok(data) => data,
            Err(TextureError::Image { path, source }) => {
                tracing::warn!(
                    path = %path.display(),
                    "{source}; using a white texture instead"
                );
                Self::white()
            }
        }
    }

    pub fn from_rgba(image: RgbaImage, mipmaps: bool) -> Self {
        let (width, height) = image.dimensions();
        let levels = if mipmaps {
            mip_chain(&image).into_iter().map(RgbaImage::into_raw).collect()
        } else {
            vec![image.into_raw()]
        };
        Self {
            width,
            height,
            levels,
        }
    }

    /// A single opaque white texel.
    pub fn white() -> Self {
        let texel = RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 255]));
        Self::from_rgba(texel, false)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn mip_level_count(&self) -> u32 {
        self.levels.len() as u32
    }

    pub fn level(&self, index: usize) -> Option<&[u8]> {
        self.levels.get(index).map(Vec::as_slice)
    }
}

/// Successive half-size copies of `image`, down to 1x1.
pub fn mip_chain(image: &RgbaImage) -> Vec<RgbaImage> {
    let mut chain = vec![image.clone()];
    let (mut width, mut height) = image.dimensions();
    while width > 1 || height > 1 {
        width = (width / 2).max(1);
        height = (height / 2).max(1);
        let previous = chain.last().unwrap_or(image);
        let next = image::imageops::resize(previous, width, height, FilterType::Triangle);
        chain.push(next);
    }
    chain
}

/// How stored texel values are interpreted when sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// Colour images; sampling converts to linear.
    Srgb,
    /// Masks and other data; sampled as stored.
    Linear,
}

impl ColorSpace {
    pub fn format(self) -> wgpu::TextureFormat {
        match self {
            ColorSpace::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            ColorSpace::Linear => wgpu::TextureFormat::Rgba8Unorm,
        }
    }
}

/// An uploaded texture and its default view.
pub struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl GpuTexture {
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        data: &ImageData,
        color_space: ColorSpace,
    ) -> Self {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: data.width,
                    height: data.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: data.mip_level_count(),
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: color_space.format(),
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &data.levels.concat(),
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn destroy(&self) {
        self.texture.destroy();
    }
}

/// Repeat-wrapped linear sampler; `mipmaps` also blends between levels.
pub fn create_sampler(device: &wgpu::Device, label: &str, mipmaps: bool) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: if mipmaps {
            wgpu::FilterMode::Linear
        } else {
            wgpu::FilterMode::Nearest
        },
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mip_chain_halves_to_one_texel() {
        let chain = mip_chain(&RgbaImage::new(8, 4));
        let sizes: Vec<_> = chain.iter().map(|i| i.dimensions()).collect();
        assert_eq!(sizes, vec![(8, 4), (4, 2), (2, 1), (1, 1)]);
    }

    #[test]
    fn level_sizes_match_dimensions() {
        let data = ImageData::from_rgba(RgbaImage::new(16, 16), true);
        assert_eq!(data.mip_level_count(), 5);
        assert_eq!(data.level(0).unwrap().len(), 16 * 16 * 4);
        assert_eq!(data.level(4).unwrap().len(), 4);
        assert!(data.level(5).is_none());
    }

    #[test]
    fn without_mipmaps_only_the_base_level_exists() {
        let data = ImageData::from_rgba(RgbaImage::new(16, 16), false);
        assert_eq!(data.mip_level_count(), 1);
    }

    #[test]
    fn masks_are_not_gamma_decoded() {
        assert_eq!(ColorSpace::Srgb.format(), wgpu::TextureFormat::Rgba8UnormSrgb);
        assert_eq!(ColorSpace::Linear.format(), wgpu::TextureFormat::Rgba8Unorm);
        assert!(!ColorSpace::Linear.format().is_srgb());
    }

    #[test]
    fn loads_png_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checker.png");
        RgbaImage::from_pixel(4, 2, Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let data = ImageData::load(&path, false).unwrap();
        assert_eq!((data.width(), data.height()), (4, 2));
        assert_eq!(&data.level(0).unwrap()[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn missing_file_falls_back_to_white() {
        assert!(ImageData::load("no/such/texture.png", false).is_err());
        let data = ImageData::load_or_white("no/such/texture.png", true);
        assert_eq!((data.width(), data.height()), (1, 1));
        assert_eq!(data.level(0).unwrap(), &[255, 255, 255, 255]);
    }
}
