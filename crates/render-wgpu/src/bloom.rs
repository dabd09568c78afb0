//! Bloom and output pass.
//!
//! Bright pixels of the tone-mapped scene are extracted into a half-size
//! target, then each of the [`BLOOM_MIPS`] levels blurs the previous one
//! horizontally and vertically at half the size again. The composite tone
//! maps the scene, adds the weighted levels and writes the surface.

use bytemuck::{Pod, Zeroable};
use starscape_render::PostChain;
use starscape_render::post::{BLOOM_KERNEL_RADII, BLOOM_MIPS};
use wgpu::util::DeviceExt;

use crate::shaders;
use crate::texture::{GpuTexture, HDR_FORMAT, encodes_srgb};

/// Width of the soft edge above the threshold, in luminance.
const SMOOTH_WIDTH: f32 = 0.01;
const MAX_KERNEL: usize = 12;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct ExtractParams {
    threshold: f32,
    smooth_width: f32,
    exposure: f32,
    _pad: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct BlurParams {
    direction: [f32; 2],
    inv_size: [f32; 2],
    coefficients: [[f32; 4]; 3],
    kernel_radius: u32,
    _pad: [u32; 3],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct CompositeParams {
    weights: [[f32; 4]; 2],
    strength: f32,
    exposure: f32,
    encode_srgb: f32,
    bloom_enabled: f32,
}

/// Normalised Gaussian weights for a kernel of `radius` taps, sigma = radius.
pub fn blur_coefficients(radius: u32) -> Vec<f32> {
    let sigma = radius as f32;
    (0..radius)
        .map(|i| {
            let x = i as f32;
            0.39894 * (-0.5 * x * x / (sigma * sigma)).exp() / sigma
        })
        .collect()
}

fn pack_coefficients(radius: u32) -> [[f32; 4]; 3] {
    let mut packed = [[0.0; 4]; 3];
    for (i, c) in blur_coefficients(radius).into_iter().take(MAX_KERNEL).enumerate() {
        packed[i / 4][i % 4] = c;
    }
    packed
}

struct Level {
    horizontal: GpuTexture,
    vertical: GpuTexture,
    horizontal_pass: wgpu::BindGroup,
    vertical_pass: wgpu::BindGroup,
}

/// Size-dependent resources, rebuilt on resize.
struct Targets {
    size: (u32, u32),
    bright: GpuTexture,
    extract_group: wgpu::BindGroup,
    levels: Vec<Level>,
    composite_group: wgpu::BindGroup,
}

pub struct BloomPass {
    extract_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,
    pass_layout: wgpu::BindGroupLayout,
    composite_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    extract_params: wgpu::Buffer,
    composite_params: wgpu::Buffer,
    encode_srgb: bool,
    targets: Option<Targets>,
}

impl BloomPass {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let pass_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("bloom_pass_layout"),
            entries: &[
                uniform_entry(0),
                texture_entry(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let mut composite_entries = vec![uniform_entry(0)];
        composite_entries.extend((1..=1 + BLOOM_MIPS as u32).map(texture_entry));
        composite_entries.push(wgpu::BindGroupLayoutEntry {
            binding: 2 + BLOOM_MIPS as u32,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
        let composite_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("bloom_composite_layout"),
            entries: &composite_entries,
        });

        let extract_pipeline = fullscreen_pipeline(
            device,
            "bloom_extract",
            shaders::BLOOM_EXTRACT_SHADER,
            "fs_extract",
            &pass_layout,
            HDR_FORMAT,
        );
        let blur_pipeline = fullscreen_pipeline(
            device,
            "bloom_blur",
            shaders::BLOOM_BLUR_SHADER,
            "fs_blur",
            &pass_layout,
            HDR_FORMAT,
        );
        let composite_pipeline = fullscreen_pipeline(
            device,
            "bloom_composite",
            shaders::BLOOM_COMPOSITE_SHADER,
            "fs_composite",
            &composite_layout,
            surface_format,
        );

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("bloom_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let extract_params = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("bloom_extract_params"),
            contents: bytemuck::bytes_of(&ExtractParams {
                threshold: 1.0,
                smooth_width: SMOOTH_WIDTH,
                exposure: 1.0,
                _pad: 0.0,
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let composite_params = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("bloom_composite_params"),
            size: std::mem::size_of::<CompositeParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            extract_pipeline,
            blur_pipeline,
            composite_pipeline,
            pass_layout,
            composite_layout,
            sampler,
            extract_params,
            composite_params,
            encode_srgb: !encodes_srgb(surface_format),
            targets: None,
        }
    }

    /// Rebuild the bloom levels when the scene target changes size.
    pub fn resize(&mut self, device: &wgpu::Device, post: &PostChain, scene: &GpuTexture) {
        let size = post.buffer_size();
        let mips = post.bloom_mip_sizes();
        tracing::debug!(?size, ?mips, "rebuilding bloom targets");

        let bright = GpuTexture::render_target(device, "bloom_bright", mips[0], HDR_FORMAT);
        let extract_group = self.pass_group(device, "bloom_extract", &self.extract_params, scene);

        let mut levels: Vec<Level> = Vec::with_capacity(BLOOM_MIPS);
        for (i, &mip) in mips.iter().enumerate() {
            let horizontal = GpuTexture::render_target(device, "bloom_h", mip, HDR_FORMAT);
            let vertical = GpuTexture::render_target(device, "bloom_v", mip, HDR_FORMAT);
            let radius = BLOOM_KERNEL_RADII[i];
            let inv_size = [1.0 / mip.0 as f32, 1.0 / mip.1 as f32];
            let horizontal_params = blur_params(device, [1.0, 0.0], inv_size, radius);
            let vertical_params = blur_params(device, [0.0, 1.0], inv_size, radius);
            let input = levels.last().map_or(&bright, |prev| &prev.vertical);
            let horizontal_pass = self.pass_group(device, "bloom_h", &horizontal_params, input);
            let vertical_pass = self.pass_group(device, "bloom_v", &vertical_params, &horizontal);
            levels.push(Level {
                horizontal,
                vertical,
                horizontal_pass,
                vertical_pass,
            });
        }

        let mut entries = vec![
            wgpu::BindGroupEntry {
                binding: 0,
                resource: self.composite_params.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&scene.view),
            },
        ];
        entries.extend(levels.iter().enumerate().map(|(i, level)| wgpu::BindGroupEntry {
            binding: 2 + i as u32,
            resource: wgpu::BindingResource::TextureView(&level.vertical.view),
        }));
        entries.push(wgpu::BindGroupEntry {
            binding: 2 + BLOOM_MIPS as u32,
            resource: wgpu::BindingResource::Sampler(&self.sampler),
        });
        let composite_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("bloom_composite_group"),
            layout: &self.composite_layout,
            entries: &entries,
        });

        self.targets = Some(Targets {
            size,
            bright,
            extract_group,
            levels,
            composite_group,
        });
    }

    pub fn size(&self) -> Option<(u32, u32)> {
        self.targets.as_ref().map(|t| t.size)
    }

    /// Upload the current settings from the chain.
    pub fn update(&self, queue: &wgpu::Queue, post: &PostChain) {
        let w = post.bloom.level_weights();
        queue.write_buffer(
            &self.extract_params,
            0,
            bytemuck::bytes_of(&ExtractParams {
                threshold: post.bloom.threshold,
                smooth_width: SMOOTH_WIDTH,
                exposure: post.exposure,
                _pad: 0.0,
            }),
        );
        queue.write_buffer(
            &self.composite_params,
            0,
            bytemuck::bytes_of(&CompositeParams {
                weights: [[w[0], w[1], w[2], w[3]], [w[4], 0.0, 0.0, 0.0]],
                strength: post.bloom.strength,
                exposure: post.exposure,
                encode_srgb: if self.encode_srgb { 1.0 } else { 0.0 },
                bloom_enabled: if post.has_bloom() { 1.0 } else { 0.0 },
            }),
        );
    }

    /// Record the bloom chain and the final composite into `output`.
    pub fn execute(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        output: &wgpu::TextureView,
        with_bloom: bool,
    ) {
        let Some(targets) = &self.targets else {
            tracing::warn!("bloom pass executed before resize");
            return;
        };
        if with_bloom {
            self.run(
                encoder,
                "bloom_extract",
                &self.extract_pipeline,
                &targets.extract_group,
                &targets.bright.view,
            );
            for level in &targets.levels {
                self.run(
                    encoder,
                    "bloom_blur_h",
                    &self.blur_pipeline,
                    &level.horizontal_pass,
                    &level.horizontal.view,
                );
                self.run(
                    encoder,
                    "bloom_blur_v",
                    &self.blur_pipeline,
                    &level.vertical_pass,
                    &level.vertical.view,
                );
            }
        }
        self.run(
            encoder,
            "bloom_composite",
            &self.composite_pipeline,
            &targets.composite_group,
            output,
        );
    }

    fn run(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        label: &str,
        pipeline: &wgpu::RenderPipeline,
        group: &wgpu::BindGroup,
        target: &wgpu::TextureView,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            ..Default::default()
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, group, &[]);
        pass.draw(0..3, 0..1);
    }

    fn pass_group(
        &self,
        device: &wgpu::Device,
        label: &str,
        params: &wgpu::Buffer,
        input: &GpuTexture,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.pass_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: params.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&input.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }
}

fn blur_params(
    device: &wgpu::Device,
    direction: [f32; 2],
    inv_size: [f32; 2],
    radius: u32,
) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("bloom_blur_params"),
        contents: bytemuck::bytes_of(&BlurParams {
            direction,
            inv_size,
            coefficients: pack_coefficients(radius),
            kernel_radius: radius.min(MAX_KERNEL as u32),
            _pad: [0; 3],
        }),
        usage: wgpu::BufferUsages::UNIFORM,
    })
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    source: &str,
    fragment_entry: &str,
    layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[layout],
        push_constant_ranges: &[],
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_fullscreen"),
            compilation_options: Default::default(),
            buffers: &[],
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some(fragment_entry),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_sizes_are_16_byte_multiples() {
        assert_eq!(std::mem::size_of::<ExtractParams>(), 16);
        assert_eq!(std::mem::size_of::<BlurParams>(), 80);
        assert_eq!(std::mem::size_of::<CompositeParams>(), 48);
    }

    #[test]
    fn coefficients_fall_off_from_centre() {
        let c = blur_coefficients(5);
        assert_eq!(c.len(), 5);
        assert!((c[0] - 0.39894 / 5.0).abs() < 1e-6);
        assert!(c.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn largest_kernel_fits_the_uniform() {
        let radius = *BLOOM_KERNEL_RADII.iter().max().unwrap();
        assert!(radius as usize <= MAX_KERNEL);
        let packed = pack_coefficients(radius);
        let expected = blur_coefficients(radius);
        assert_eq!(packed[2][2], expected[10]);
        assert_eq!(packed[2][3], 0.0);
    }
}
