//! GPU meshes and models for the scene pass.
//!
//! Loaders produce `ModelData` (positions, normals, uvs, indices and one
//! optional diffuse image per material); `GPUModel::upload` turns it into
//! vertex/index buffers and one material bind group per material.

use crate::backend::{GPUContext, GPUTexture};
use crate::error::Result;

/// RGBA8 image pixels, rows top first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// xyz per vertex.
    pub positions: Vec<f32>,
    /// xyz per vertex; may be empty.
    pub normals: Vec<f32>,
    /// uv per vertex; may be empty.
    pub uvs: Vec<f32>,
    pub indices: Vec<u32>,
    pub material: Option<usize>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Zero-fill missing or short normal/uv streams so every vertex buffer
    /// covers all vertices.
    pub fn fill_missing_attributes(&mut self) {
        let n = self.vertex_count();
        if self.normals.len() != n * 3 {
            self.normals = vec![0.0; n * 3];
        }
        if self.uvs.len() != n * 2 {
            self.uvs = vec![0.0; n * 2];
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelData {
    pub name: String,
    pub meshes: Vec<MeshData>,
    /// Diffuse image for each material index.
    pub materials: Vec<Option<TextureData>>,
}

/// GPU mesh with vertex and index buffers.
pub struct GPUMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub normal_buffer: wgpu::Buffer,
    pub uv_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    pub material: Option<usize>,
}

/// Upload mesh data to GPU buffers.
pub fn upload_mesh(device: &wgpu::Device, mesh: &MeshData) -> GPUMesh {
    use wgpu::util::DeviceExt;

    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Vertex Position Buffer"),
        contents: bytemuck::cast_slice(&mesh.positions),
        usage: wgpu::BufferUsages::VERTEX,
    });

    let normal_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Vertex Normal Buffer"),
        contents: bytemuck::cast_slice(&mesh.normals),
        usage: wgpu::BufferUsages::VERTEX,
    });

    let uv_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Vertex UV Buffer"),
        contents: bytemuck::cast_slice(&mesh.uvs),
        usage: wgpu::BufferUsages::VERTEX,
    });

    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Index Buffer"),
        contents: bytemuck::cast_slice(&mesh.indices),
        usage: wgpu::BufferUsages::INDEX,
    });

    GPUMesh {
        vertex_buffer,
        normal_buffer,
        uv_buffer,
        index_buffer,
        index_count: mesh.indices.len() as u32,
        material: mesh.material,
    }
}

/// Meshes plus one diffuse bind group per material. The last bind group is
/// a plain white material used by meshes without one.
pub struct GPUModel {
    pub name: String,
    pub meshes: Vec<GPUMesh>,
    textures: Vec<GPUTexture>,
    material_bind_groups: Vec<wgpu::BindGroup>,
}

impl GPUModel {
    pub fn upload(gpu: &GPUContext, material_bgl: &wgpu::BindGroupLayout, data: &ModelData) -> Result<Self> {
        let mut textures = Vec::with_capacity(data.materials.len() + 1);
        for (i, material) in data.materials.iter().enumerate() {
            let texture = match material {
                Some(image) => gpu.upload_texture(
                    &format!("{} Material {i}", data.name),
                    &image.pixels,
                    image.width,
                    image.height,
                )?,
                None => white_texture(gpu)?,
            };
            textures.push(texture);
        }
        textures.push(white_texture(gpu)?);

        let material_bind_groups = textures
            .iter()
            .map(|texture| {
                gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Material BG"),
                    layout: material_bgl,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&texture.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(&texture.sampler),
                        },
                    ],
                })
            })
            .collect();

        let meshes: Vec<GPUMesh> = data
            .meshes
            .iter()
            .filter(|m| !m.indices.is_empty() && m.vertex_count() > 0)
            .map(|m| {
                let mut m = m.clone();
                m.fill_missing_attributes();
                upload_mesh(&gpu.device, &m)
            })
            .collect();

        log::info!(
            "Uploaded model '{}': {} meshes, {} materials",
            data.name,
            meshes.len(),
            data.materials.len()
        );

        Ok(Self {
            name: data.name.clone(),
            meshes,
            textures,
            material_bind_groups,
        })
    }

    /// Bind group for `material`, falling back to white for `None` or an
    /// out-of-range index.
    pub fn material_bind_group(&self, material: Option<usize>) -> &wgpu::BindGroup {
        let fallback = self.material_bind_groups.len() - 1;
        let index = material.filter(|&i| i < fallback).unwrap_or(fallback);
        &self.material_bind_groups[index]
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }
}

fn white_texture(gpu: &GPUContext) -> Result<GPUTexture> {
    gpu.upload_texture("Default 1x1 White", &[255u8, 255, 255, 255], 1, 1)
}
