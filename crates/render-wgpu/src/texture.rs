use starscape_assets::{CubeTextureData, TextureData};

use crate::error::RenderError;

/// Scene colour target format.
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// How texel values are interpreted when sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColorSpace {
    /// Colour maps and backgrounds; decoded to linear on sampling.
    Srgb,
    /// Normal maps and masks.
    Linear,
}

impl ColorSpace {
    fn format(self) -> wgpu::TextureFormat {
        match self {
            ColorSpace::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            ColorSpace::Linear => wgpu::TextureFormat::Rgba8Unorm,
        }
    }
}

/// A texture plus the view the pipelines bind.
pub struct GpuTexture {
    #[allow(dead_code)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl GpuTexture {
    /// Upload a decoded image as a 2D texture.
    pub fn from_data(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        data: &TextureData,
        space: ColorSpace,
    ) -> Result<Self, RenderError> {
        check_size(device, label, data.width.max(data.height))?;
        let size = wgpu::Extent3d {
            width: data.width,
            height: data.height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: space.format(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        write_layer(queue, &texture, 0, data);
        let view = texture.create_view(&Default::default());
        Ok(Self { texture, view })
    }

    /// Upload six faces as a cube map, sampled as sRGB.
    pub fn cube(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        data: &CubeTextureData,
    ) -> Result<Self, RenderError> {
        check_size(device, label, data.size)?;
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: data.size,
                height: data.size,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: ColorSpace::Srgb.format(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        for (layer, face) in data.faces.iter().enumerate() {
            write_layer(queue, &texture, layer as u32, face);
        }
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        Ok(Self { texture, view })
    }

    /// 1x1 texture used when a material has no map bound.
    pub fn solid(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        rgba: [u8; 4],
        space: ColorSpace,
    ) -> Result<Self, RenderError> {
        Self::from_data(device, queue, label, &TextureData::solid(rgba), space)
    }

    /// 1x1 black cube map.
    pub fn black_cube(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
    ) -> Result<Self, RenderError> {
        let faces = vec![TextureData::solid([0, 0, 0, 255]); 6];
        let cube = CubeTextureData { size: 1, faces };
        Self::cube(device, queue, label, &cube)
    }

    /// Sampled colour attachment.
    pub fn render_target(
        device: &wgpu::Device,
        label: &str,
        (width, height): (u32, u32),
        format: wgpu::TextureFormat,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&Default::default());
        Self { texture, view }
    }

    pub fn depth(device: &wgpu::Device, (width, height): (u32, u32)) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&Default::default());
        Self { texture, view }
    }
}

fn check_size(device: &wgpu::Device, label: &str, size: u32) -> Result<(), RenderError> {
    let max = device.limits().max_texture_dimension_2d;
    if size > max {
        return Err(RenderError::TextureTooLarge {
            label: label.to_string(),
            size,
            max,
        });
    }
    Ok(())
}

fn write_layer(queue: &wgpu::Queue, texture: &wgpu::Texture, layer: u32, data: &TextureData) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d {
                x: 0,
                y: 0,
                z: layer,
            },
            aspect: wgpu::TextureAspect::All,
        },
        &data.pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * data.width),
            rows_per_image: Some(data.height),
        },
        wgpu::Extent3d {
            width: data.width,
            height: data.height,
            depth_or_array_layers: 1,
        },
    );
}

/// Whether the surface format already encodes sRGB on write.
pub fn encodes_srgb(format: wgpu::TextureFormat) -> bool {
    format.is_srgb()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colour_space_formats() {
        assert!(ColorSpace::Srgb.format().is_srgb());
        assert!(!ColorSpace::Linear.format().is_srgb());
    }

    #[test]
    fn surface_encoding_detection() {
        assert!(encodes_srgb(wgpu::TextureFormat::Bgra8UnormSrgb));
        assert!(!encodes_srgb(wgpu::TextureFormat::Bgra8Unorm));
    }
}
