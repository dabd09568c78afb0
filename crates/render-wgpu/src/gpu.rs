use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};
use starscape_assets::{AssetId, CubeTextureData, TextureData};
use starscape_common::{Color, NodeId};
use starscape_render::{PerspectiveCamera, PostChain};
use starscape_scene::{
    MatcapMaterial, MeshData, MeshMaterial, NodeKind, PointsMaterial, Scene, StandardMaterial,
};
use wgpu::util::DeviceExt;

use crate::bloom::BloomPass;
use crate::error::RenderError;
use crate::mesh::{GpuMesh, GpuVertices, MeshVertex, POINT_INSTANCE_LAYOUT};
use crate::shaders;
use crate::texture::{ColorSpace, DEPTH_FORMAT, GpuTexture, HDR_FORMAT};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
struct Globals {
    view_proj: [[f32; 4]; 4],
    sky_inv: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    viewport: [f32; 4],
    point_pos: [f32; 4],
    point_color: [f32; 4],
    dir_direction: [f32; 4],
    dir_color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct MeshUniforms {
    model: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
    color: [f32; 4],
    params: [f32; 4],
    maps: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct PointsUniforms {
    model: [[f32; 4]; 4],
    color: [f32; 4],
    params: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct MatcapUniforms {
    model: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
    color: [f32; 4],
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Authored colours are sRGB; shading happens in linear space.
fn linear(color: Color) -> Vec3 {
    Vec3::from(color.to_array().map(srgb_to_linear))
}

fn flag(on: bool) -> f32 {
    if on { 1.0 } else { 0.0 }
}

/// Pack camera, viewport and the first light of each kind.
fn frame_globals(scene: &Scene, camera: &PerspectiveCamera, post: &PostChain) -> Globals {
    let mut rotation_only = camera.view_matrix();
    rotation_only.w_axis = Vec4::W;
    let sky_inv = (camera.projection_matrix() * rotation_only).inverse();
    let (width, height) = post.buffer_size();

    let mut globals = Globals {
        view_proj: camera.view_projection().to_cols_array_2d(),
        sky_inv: sky_inv.to_cols_array_2d(),
        camera_pos: camera.position.extend(1.0).to_array(),
        viewport: [width as f32, height as f32, post.pixel_ratio(), 0.0],
        point_pos: [0.0; 4],
        point_color: [0.0; 4],
        dir_direction: [0.0, 1.0, 0.0, 0.0],
        dir_color: [0.0; 4],
    };

    let mut have_point = false;
    let mut have_directional = false;
    for (id, node) in scene.nodes() {
        let Some(position) = scene.world_position(id) else {
            continue;
        };
        match &node.kind {
            NodeKind::PointLight(light) if !have_point => {
                have_point = true;
                globals.point_pos = position.extend(light.distance).to_array();
                globals.point_color = (linear(light.color) * light.intensity)
                    .extend(light.decay)
                    .to_array();
            }
            NodeKind::DirectionalLight(light) if !have_directional => {
                have_directional = true;
                // Lights aim at the origin.
                let direction = position.try_normalize().unwrap_or(Vec3::Y);
                globals.dir_direction = direction.extend(0.0).to_array();
                globals.dir_color = (linear(light.color) * light.intensity).extend(1.0).to_array();
            }
            _ => {}
        }
    }
    globals
}

fn normal_matrix(model: Mat4) -> Mat4 {
    if model.determinant().abs() < f32::EPSILON {
        return Mat4::IDENTITY;
    }
    model.inverse().transpose()
}

struct MeshSlot {
    geometry: Arc<MeshData>,
    gpu: GpuMesh,
    uniforms: wgpu::Buffer,
    group: wgpu::BindGroup,
    maps: [Option<AssetId>; 3],
    epoch: u64,
}

struct PointsSlot {
    positions: Vec<[f32; 3]>,
    instances: GpuVertices,
    uniforms: wgpu::Buffer,
    group: wgpu::BindGroup,
    alpha_map: Option<AssetId>,
    epoch: u64,
}

struct MatcapSlot {
    geometry: Arc<MeshData>,
    gpu: GpuMesh,
    uniforms: wgpu::Buffer,
    group: wgpu::BindGroup,
}

/// wgpu renderer for a [`Scene`].
///
/// Node geometry is uploaded the first time a node is seen and kept until
/// the node disappears. Textures are uploaded through
/// [`register_texture`](Self::register_texture) once their assets resolve;
/// until then materials sample neutral defaults.
pub struct WgpuRenderer {
    surface_format: wgpu::TextureFormat,
    globals_buffer: wgpu::Buffer,
    globals_group: wgpu::BindGroup,
    mesh_layout: wgpu::BindGroupLayout,
    points_layout: wgpu::BindGroupLayout,
    matcap_layout: wgpu::BindGroupLayout,
    sky_layout: wgpu::BindGroupLayout,
    standard_pipeline: wgpu::RenderPipeline,
    points_pipeline: wgpu::RenderPipeline,
    matcap_pipeline: wgpu::RenderPipeline,
    sky_pipeline: wgpu::RenderPipeline,
    sampler: wgpu::Sampler,
    white: GpuTexture,
    flat_normal: GpuTexture,
    black_cube: GpuTexture,
    textures: BTreeMap<AssetId, GpuTexture>,
    cubes: BTreeMap<AssetId, GpuTexture>,
    texture_epoch: u64,
    meshes: BTreeMap<NodeId, MeshSlot>,
    points: BTreeMap<NodeId, PointsSlot>,
    matcaps: BTreeMap<NodeId, MatcapSlot>,
    sky_group: Option<(AssetId, wgpu::BindGroup)>,
    scene_target: GpuTexture,
    depth: GpuTexture,
    bloom: BloomPass,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        post: &PostChain,
    ) -> Result<Self, RenderError> {
        let globals_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("globals_buffer"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globals_layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT)],
        });
        let globals_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globals_group"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let mesh_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("mesh_layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT),
                texture_entry(1, wgpu::TextureViewDimension::D2),
                texture_entry(2, wgpu::TextureViewDimension::D2),
                texture_entry(3, wgpu::TextureViewDimension::Cube),
                sampler_entry(4),
            ],
        });
        let points_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("points_layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT),
                texture_entry(1, wgpu::TextureViewDimension::D2),
                sampler_entry(2),
            ],
        });
        let matcap_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("matcap_layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT)],
        });
        let sky_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sky_layout"),
            entries: &[
                texture_entry(0, wgpu::TextureViewDimension::Cube),
                sampler_entry(1),
            ],
        });

        let standard_pipeline = scene_pipeline(
            device,
            SceneStage {
                label: "standard_pipeline",
                source: shaders::STANDARD_SHADER,
                layouts: &[&globals_layout, &mesh_layout],
                buffers: &[MeshVertex::LAYOUT],
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                blend: wgpu::BlendState::REPLACE,
                depth_write: true,
                depth_compare: wgpu::CompareFunction::Less,
            },
        );
        let points_pipeline = scene_pipeline(
            device,
            SceneStage {
                label: "points_pipeline",
                source: shaders::POINTS_SHADER,
                layouts: &[&globals_layout, &points_layout],
                buffers: &[POINT_INSTANCE_LAYOUT],
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                blend: wgpu::BlendState::ALPHA_BLENDING,
                depth_write: false,
                depth_compare: wgpu::CompareFunction::Less,
            },
        );
        let matcap_pipeline = scene_pipeline(
            device,
            SceneStage {
                label: "matcap_pipeline",
                source: shaders::MATCAP_SHADER,
                layouts: &[&globals_layout, &matcap_layout],
                buffers: &[MeshVertex::LAYOUT],
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                blend: wgpu::BlendState::REPLACE,
                depth_write: true,
                depth_compare: wgpu::CompareFunction::Less,
            },
        );
        let sky_pipeline = scene_pipeline(
            device,
            SceneStage {
                label: "sky_pipeline",
                source: shaders::SKYBOX_SHADER,
                layouts: &[&globals_layout, &sky_layout],
                buffers: &[],
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                blend: wgpu::BlendState::REPLACE,
                depth_write: false,
                depth_compare: wgpu::CompareFunction::Always,
            },
        );

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("map_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let white = GpuTexture::solid(device, queue, "white", [255; 4], ColorSpace::Srgb)?;
        let flat_normal =
            GpuTexture::solid(device, queue, "flat_normal", [128, 128, 255, 255], ColorSpace::Linear)?;
        let black_cube = GpuTexture::black_cube(device, queue, "black_cube")?;

        let size = post.buffer_size();
        let scene_target = GpuTexture::render_target(device, "scene_target", size, HDR_FORMAT);
        let depth = GpuTexture::depth(device, size);
        let mut bloom = BloomPass::new(device, surface_format);
        bloom.resize(device, post, &scene_target);

        Ok(Self {
            surface_format,
            globals_buffer,
            globals_group,
            mesh_layout,
            points_layout,
            matcap_layout,
            sky_layout,
            standard_pipeline,
            points_pipeline,
            matcap_pipeline,
            sky_pipeline,
            sampler,
            white,
            flat_normal,
            black_cube,
            textures: BTreeMap::new(),
            cubes: BTreeMap::new(),
            texture_epoch: 0,
            meshes: BTreeMap::new(),
            points: BTreeMap::new(),
            matcaps: BTreeMap::new(),
            sky_group: None,
            scene_target,
            depth,
            bloom,
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Upload a 2D texture. Re-registering an id is a no-op.
    pub fn register_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        id: AssetId,
        data: &TextureData,
        space: ColorSpace,
    ) -> Result<(), RenderError> {
        if self.textures.contains_key(&id) {
            return Ok(());
        }
        let texture = GpuTexture::from_data(device, queue, &format!("texture_{}", id.0), data, space)?;
        tracing::debug!(id = id.0, width = data.width, height = data.height, ?space, "texture uploaded");
        self.textures.insert(id, texture);
        self.texture_epoch += 1;
        Ok(())
    }

    /// Upload a cube map. Re-registering an id is a no-op.
    pub fn register_cube(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        id: AssetId,
        data: &CubeTextureData,
    ) -> Result<(), RenderError> {
        if self.cubes.contains_key(&id) {
            return Ok(());
        }
        if data.faces.len() != 6 {
            return Err(RenderError::IncompleteCube(id, data.faces.len()));
        }
        let texture = GpuTexture::cube(device, queue, &format!("cube_{}", id.0), data)?;
        tracing::debug!(id = id.0, size = data.size, "cube map uploaded");
        self.cubes.insert(id, texture);
        self.texture_epoch += 1;
        Ok(())
    }

    pub fn has_texture(&self, id: AssetId) -> bool {
        self.textures.contains_key(&id) || self.cubes.contains_key(&id)
    }

    /// Render one frame into `view`: scene pass, then bloom and tone mapping.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        scene: &Scene,
        camera: &PerspectiveCamera,
        post: &PostChain,
    ) {
        if self.bloom.size() != Some(post.buffer_size()) {
            self.resize_targets(device, post);
        }
        queue.write_buffer(
            &self.globals_buffer,
            0,
            bytemuck::bytes_of(&frame_globals(scene, camera, post)),
        );
        self.sync_nodes(device, queue, scene);
        self.sync_sky(device, scene);
        self.bloom.update(queue, post);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.scene_target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            pass.set_bind_group(0, &self.globals_group, &[]);

            if let Some((_, group)) = &self.sky_group {
                pass.set_pipeline(&self.sky_pipeline);
                pass.set_bind_group(1, group, &[]);
                pass.draw(0..3, 0..1);
            }

            pass.set_pipeline(&self.standard_pipeline);
            for slot in self.meshes.values() {
                pass.set_bind_group(1, &slot.group, &[]);
                pass.set_vertex_buffer(0, slot.gpu.vertex_buffer.slice(..));
                pass.set_index_buffer(slot.gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..slot.gpu.index_count, 0, 0..1);
            }

            pass.set_pipeline(&self.matcap_pipeline);
            for slot in self.matcaps.values().filter(|s| s.gpu.index_count > 0) {
                pass.set_bind_group(1, &slot.group, &[]);
                pass.set_vertex_buffer(0, slot.gpu.vertex_buffer.slice(..));
                pass.set_index_buffer(slot.gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..slot.gpu.index_count, 0, 0..1);
            }

            // Transparent points go last.
            pass.set_pipeline(&self.points_pipeline);
            for slot in self.points.values().filter(|s| s.instances.count > 0) {
                pass.set_bind_group(1, &slot.group, &[]);
                pass.set_vertex_buffer(0, slot.instances.buffer.slice(..));
                pass.draw(0..6, 0..slot.instances.count);
            }
        }

        self.bloom.execute(&mut encoder, view, post.has_bloom());
        queue.submit(std::iter::once(encoder.finish()));
    }

    fn resize_targets(&mut self, device: &wgpu::Device, post: &PostChain) {
        let size = post.buffer_size();
        self.scene_target = GpuTexture::render_target(device, "scene_target", size, HDR_FORMAT);
        self.depth = GpuTexture::depth(device, size);
        self.bloom.resize(device, post, &self.scene_target);
    }

    fn sync_nodes(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, scene: &Scene) {
        let mut seen = BTreeSet::new();
        for (id, node) in scene.nodes() {
            let Some(world) = scene.world_matrix(id) else {
                continue;
            };
            match &node.kind {
                NodeKind::Mesh {
                    geometry,
                    material: MeshMaterial::Standard(material),
                } => {
                    self.sync_mesh(device, queue, id, world, geometry, material);
                }
                NodeKind::Mesh {
                    geometry,
                    material: MeshMaterial::Matcap(material),
                } => {
                    self.sync_matcap(device, queue, id, world, geometry, material);
                }
                NodeKind::Points { positions, material } => {
                    self.sync_points(device, queue, id, world, positions, material);
                }
                _ => continue,
            }
            seen.insert(id);
        }
        self.meshes.retain(|id, _| seen.contains(id));
        self.points.retain(|id, _| seen.contains(id));
        self.matcaps.retain(|id, _| seen.contains(id));
    }

    fn sync_mesh(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        id: NodeId,
        world: Mat4,
        geometry: &Arc<MeshData>,
        material: &StandardMaterial,
    ) {
        let maps = [material.color_map, material.normal_map, material.env_map];
        let fresh = self
            .meshes
            .get(&id)
            .is_none_or(|slot| !Arc::ptr_eq(&slot.geometry, geometry));
        if fresh {
            let label = format!("mesh_{id}");
            let uniforms = uniform_buffer::<MeshUniforms>(device, &label);
            let group = self.mesh_group(device, &uniforms, maps);
            self.meshes.insert(
                id,
                MeshSlot {
                    geometry: Arc::clone(geometry),
                    gpu: GpuMesh::upload(device, &label, geometry),
                    uniforms,
                    group,
                    maps,
                    epoch: self.texture_epoch,
                },
            );
        } else if let Some(slot) = self.meshes.get(&id) {
            if slot.maps != maps || slot.epoch != self.texture_epoch {
                let group = self.mesh_group(device, &slot.uniforms, maps);
                let epoch = self.texture_epoch;
                if let Some(slot) = self.meshes.get_mut(&id) {
                    slot.group = group;
                    slot.maps = maps;
                    slot.epoch = epoch;
                }
            }
        }

        let Some(slot) = self.meshes.get(&id) else {
            return;
        };
        let has_env = material.env_map.is_some_and(|m| self.cubes.contains_key(&m));
        let uniforms = MeshUniforms {
            model: world.to_cols_array_2d(),
            normal_matrix: normal_matrix(world).to_cols_array_2d(),
            color: linear(material.color).extend(1.0).to_array(),
            params: [
                material.metalness,
                material.roughness,
                material.normal_scale,
                flag(has_env),
            ],
            maps: [
                flag(material.color_map.is_some_and(|m| self.textures.contains_key(&m))),
                flag(material.normal_map.is_some_and(|m| self.textures.contains_key(&m))),
                0.0,
                0.0,
            ],
        };
        queue.write_buffer(&slot.uniforms, 0, bytemuck::bytes_of(&uniforms));
    }

    fn sync_points(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        id: NodeId,
        world: Mat4,
        positions: &[[f32; 3]],
        material: &PointsMaterial,
    ) {
        let fresh = self
            .points
            .get(&id)
            .is_none_or(|slot| slot.positions != positions);
        if fresh {
            let label = format!("points_{id}");
            let uniforms = uniform_buffer::<PointsUniforms>(device, &label);
            let group = self.points_group(device, &uniforms, material.alpha_map);
            self.points.insert(
                id,
                PointsSlot {
                    positions: positions.to_vec(),
                    instances: GpuVertices::upload(device, &label, positions),
                    uniforms,
                    group,
                    alpha_map: material.alpha_map,
                    epoch: self.texture_epoch,
                },
            );
        } else if let Some(slot) = self.points.get(&id) {
            if slot.alpha_map != material.alpha_map || slot.epoch != self.texture_epoch {
                let group = self.points_group(device, &slot.uniforms, material.alpha_map);
                let epoch = self.texture_epoch;
                if let Some(slot) = self.points.get_mut(&id) {
                    slot.group = group;
                    slot.alpha_map = material.alpha_map;
                    slot.epoch = epoch;
                }
            }
        }

        let Some(slot) = self.points.get(&id) else {
            return;
        };
        let has_alpha = material
            .alpha_map
            .is_some_and(|m| self.textures.contains_key(&m));
        let uniforms = PointsUniforms {
            model: world.to_cols_array_2d(),
            color: linear(material.color).extend(1.0).to_array(),
            params: [
                material.size,
                flag(material.size_attenuation),
                flag(has_alpha && material.transparent),
                0.0,
            ],
        };
        queue.write_buffer(&slot.uniforms, 0, bytemuck::bytes_of(&uniforms));
    }

    fn sync_matcap(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        id: NodeId,
        world: Mat4,
        geometry: &Arc<MeshData>,
        material: &MatcapMaterial,
    ) {
        let fresh = self
            .matcaps
            .get(&id)
            .is_none_or(|slot| !Arc::ptr_eq(&slot.geometry, geometry));
        if fresh {
            let label = format!("matcap_{id}");
            let uniforms = uniform_buffer::<MatcapUniforms>(device, &label);
            let group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&label),
                layout: &self.matcap_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.as_entire_binding(),
                }],
            });
            self.matcaps.insert(
                id,
                MatcapSlot {
                    geometry: Arc::clone(geometry),
                    gpu: GpuMesh::upload(device, &label, geometry),
                    uniforms,
                    group,
                },
            );
        }
        if let Some(slot) = self.matcaps.get(&id) {
            let uniforms = MatcapUniforms {
                model: world.to_cols_array_2d(),
                normal_matrix: normal_matrix(world).to_cols_array_2d(),
                color: linear(material.color).extend(1.0).to_array(),
            };
            queue.write_buffer(&slot.uniforms, 0, bytemuck::bytes_of(&uniforms));
        }
    }

    fn sync_sky(&mut self, device: &wgpu::Device, scene: &Scene) {
        let Some(id) = scene.background() else {
            self.sky_group = None;
            return;
        };
        if self.sky_group.as_ref().is_some_and(|(current, _)| *current == id) {
            return;
        }
        let Some(cube) = self.cubes.get(&id) else {
            self.sky_group = None;
            return;
        };
        let group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sky_group"),
            layout: &self.sky_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&cube.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });
        self.sky_group = Some((id, group));
    }

    fn mesh_group(
        &self,
        device: &wgpu::Device,
        uniforms: &wgpu::Buffer,
        [color, normal, env]: [Option<AssetId>; 3],
    ) -> wgpu::BindGroup {
        let color = color.and_then(|id| self.textures.get(&id)).unwrap_or(&self.white);
        let normal = normal
            .and_then(|id| self.textures.get(&id))
            .unwrap_or(&self.flat_normal);
        let env = env.and_then(|id| self.cubes.get(&id)).unwrap_or(&self.black_cube);
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("mesh_group"),
            layout: &self.mesh_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&color.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&normal.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&env.view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }

    fn points_group(
        &self,
        device: &wgpu::Device,
        uniforms: &wgpu::Buffer,
        alpha_map: Option<AssetId>,
    ) -> wgpu::BindGroup {
        let alpha = alpha_map
            .and_then(|id| self.textures.get(&id))
            .unwrap_or(&self.white);
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("points_group"),
            layout: &self.points_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&alpha.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }
}

fn uniform_buffer<T: Pod>(device: &wgpu::Device, label: &str) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::bytes_of(&T::zeroed()),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entry(binding: u32, view_dimension: wgpu::TextureViewDimension) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

struct SceneStage<'a> {
    label: &'a str,
    source: &'a str,
    layouts: &'a [&'a wgpu::BindGroupLayout],
    buffers: &'a [wgpu::VertexBufferLayout<'a>],
    topology: wgpu::PrimitiveTopology,
    cull_mode: Option<wgpu::Face>,
    blend: wgpu::BlendState,
    depth_write: bool,
    depth_compare: wgpu::CompareFunction,
}

/// Pipeline drawing into the HDR scene target with depth.
fn scene_pipeline(device: &wgpu::Device, stage: SceneStage<'_>) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(stage.label),
        source: wgpu::ShaderSource::Wgsl(stage.source.into()),
    });
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(stage.label),
        bind_group_layouts: stage.layouts,
        push_constant_ranges: &[],
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(stage.label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: stage.buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: HDR_FORMAT,
                blend: Some(stage.blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: stage.topology,
            cull_mode: stage.cull_mode,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: stage.depth_write,
            depth_compare: stage.depth_compare,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}
