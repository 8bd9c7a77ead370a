use lumen_common::Transform;
use lumen_engine::{ColorSpace, GpuTexture, ImageData, UniformBlock, UniformError, create_sampler};
use wgpu::util::DeviceExt;

use crate::mesh::MeshData;

/// Textures and material constants for one model.
pub struct Material {
    pub diffuse: ImageData,
    pub specular: ImageData,
    /// Blend between mip levels when sampling.
    pub mipmaps: bool,
    pub shininess: f32,
}

impl Material {
    /// Diffuse maps hold colour.
    pub const DIFFUSE_SPACE: ColorSpace = ColorSpace::Srgb;
    /// Specular maps hold intensities and are sampled as stored.
    pub const SPECULAR_SPACE: ColorSpace = ColorSpace::Linear;
}

/// Object bind group layout: per-object uniforms, diffuse map, specular map,
/// sampler.
pub fn object_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let texture = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    };
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("object_bind_group_layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            texture(1),
            texture(2),
            wgpu::BindGroupLayoutEntry {
                binding: 3,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

/// A mesh on the GPU with its textures and per-object uniforms.
pub struct TexturedModel {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    diffuse: GpuTexture,
    specular: GpuTexture,
    uniforms: UniformBlock,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    shininess: f32,
    pub transform: Transform,
}

impl TexturedModel {
    /// `uniforms` is a fresh copy of the shader's `object` block.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        label: &str,
        mesh: &MeshData,
        material: &Material,
        uniforms: UniformBlock,
    ) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_vertex_buffer")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_index_buffer")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let diffuse = GpuTexture::upload(
            device,
            queue,
            &format!("{label}_diffuse"),
            &material.diffuse,
            Material::DIFFUSE_SPACE,
        );
        let specular = GpuTexture::upload(
            device,
            queue,
            &format!("{label}_specular"),
            &material.specular,
            Material::SPECULAR_SPACE,
        );
        let sampler = create_sampler(device, &format!("{label}_sampler"), material.mipmaps);
        let uniform_buffer = uniforms.create_buffer(device);

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label}_bind_group")),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(diffuse.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(specular.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        tracing::debug!(
            model = label,
            vertices = mesh.vertices.len(),
            indices = mesh.indices.len(),
            "model uploaded"
        );

        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.index_count(),
            diffuse,
            specular,
            uniforms,
            uniform_buffer,
            bind_group,
            shininess: material.shininess,
            transform: Transform::default(),
        }
    }

    /// Write the model matrix and material into the object uniforms.
    pub fn upload(&mut self, queue: &wgpu::Queue) -> Result<(), UniformError> {
        self.uniforms.set("model", self.transform.matrix())?;
        self.uniforms.set("shininess", self.shininess)?;
        self.uniforms.upload(queue, &self.uniform_buffer);
        Ok(())
    }

    /// Record the draw. The pipeline and frame bind group must already be set.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_bind_group(1, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }

    pub fn destroy(&self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
        self.uniform_buffer.destroy();
        self.diffuse.destroy();
        self.specular.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_diffuse_maps_are_srgb() {
        assert_eq!(Material::DIFFUSE_SPACE, ColorSpace::Srgb);
        assert_eq!(Material::SPECULAR_SPACE, ColorSpace::Linear);
        assert!(!Material::SPECULAR_SPACE.format().is_srgb());
    }
}
