//! Named uniform slots backed by a reflected WGSL struct.
//!
//! A [`UniformBlock`] mirrors one `var<uniform>` global. Values are written by
//! path (`dir_light.direction`, `point_lights[2].attenuation`) into a CPU
//! staging buffer laid out exactly as the shader declares it; the whole block
//! is then uploaded with a single `write_buffer`. Paths are resolved against
//! the reflected types on every `set`, nothing is cached.

use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use crate::error::UniformError;

/// A value that can be stored in a uniform slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    F32(f32),
    Vec3(Vec3),
    Mat4(Mat4),
}

impl UniformValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            UniformValue::F32(_) => "f32",
            UniformValue::Vec3(_) => "vec3<f32>",
            UniformValue::Mat4(_) => "mat4x4<f32>",
        }
    }

    fn write_to(&self, dst: &mut [u8]) {
        match self {
            UniformValue::F32(v) => dst.copy_from_slice(bytemuck::bytes_of(v)),
            UniformValue::Vec3(v) => dst.copy_from_slice(bytemuck::cast_slice(&v.to_array())),
            UniformValue::Mat4(m) => dst.copy_from_slice(bytemuck::cast_slice(&m.to_cols_array())),
        }
    }

    fn byte_len(&self) -> usize {
        match self {
            UniformValue::F32(_) => 4,
            UniformValue::Vec3(_) => 12,
            UniformValue::Mat4(_) => 64,
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::F32(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<Mat4> for UniformValue {
    fn from(v: Mat4) -> Self {
        UniformValue::Mat4(v)
    }
}

/// CPU staging storage for one uniform struct.
#[derive(Debug, Clone)]
pub struct UniformBlock {
    name: String,
    types: naga::UniqueArena<naga::Type>,
    root: naga::Handle<naga::Type>,
    group: u32,
    binding: u32,
    data: Vec<u8>,
}

impl UniformBlock {
    /// Reflect the `var<uniform>` global called `name` in `module`.
    pub fn from_module(module: &naga::Module, name: &str) -> Result<Self, UniformError> {
        let var = module
            .global_variables
            .iter()
            .map(|(_, var)| var)
            .find(|var| {
                var.space == naga::AddressSpace::Uniform && var.name.as_deref() == Some(name)
            })
            .ok_or_else(|| UniformError::UnknownBlock(name.to_string()))?;

        let span = match &module.types[var.ty].inner {
            naga::TypeInner::Struct { span, .. } => *span,
            _ => return Err(UniformError::NotAStruct(name.to_string())),
        };
        let (group, binding) = var
            .binding
            .as_ref()
            .map(|b| (b.group, b.binding))
            .unwrap_or((0, 0));

        Ok(Self {
            name: name.to_string(),
            types: module.types.clone(),
            root: var.ty,
            group,
            binding,
            data: vec![0; span as usize],
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group(&self) -> u32 {
        self.group
    }

    pub fn binding(&self) -> u32 {
        self.binding
    }

    /// Size of the block in bytes, including trailing padding.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Write `value` into the slot at `path`.
    pub fn set(&mut self, path: &str, value: impl Into<UniformValue>) -> Result<(), UniformError> {
        let value = value.into();
        let (offset, ty) = self.resolve(path)?;
        let inner = &self.types[ty].inner;
        let expected = type_name(inner);
        if expected != Some(value.type_name()) {
            return Err(UniformError::TypeMismatch {
                path: path.to_string(),
                expected: expected.map_or_else(|| format!("{inner:?}"), str::to_string),
                actual: value.type_name(),
            });
        }
        let start = offset as usize;
        value.write_to(&mut self.data[start..start + value.byte_len()]);
        Ok(())
    }

    /// Byte offset of the slot at `path`.
    pub fn offset_of(&self, path: &str) -> Result<u32, UniformError> {
        self.resolve(path).map(|(offset, _)| offset)
    }

    pub fn create_buffer(&self, device: &wgpu::Device) -> wgpu::Buffer {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&self.name),
            contents: &self.data,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        })
    }

    /// Copy the staging bytes into `buffer`.
    pub fn upload(&self, queue: &wgpu::Queue, buffer: &wgpu::Buffer) {
        queue.write_buffer(buffer, 0, &self.data);
    }

    fn resolve(&self, path: &str) -> Result<(u32, naga::Handle<naga::Type>), UniformError> {
        let malformed = || UniformError::MalformedPath(path.to_string());
        let mut offset = 0u32;
        let mut ty = self.root;

        for part in path.split('.') {
            let (field, mut rest) = match part.find('[') {
                Some(i) => (&part[..i], &part[i..]),
                None => (part, ""),
            };
            if field.is_empty() {
                return Err(malformed());
            }

            let member = match &self.types[ty].inner {
                naga::TypeInner::Struct { members, .. } => members
                    .iter()
                    .find(|m| m.name.as_deref() == Some(field))
                    .ok_or_else(|| UniformError::UnknownField(path.to_string()))?,
                _ => return Err(UniformError::UnknownField(path.to_string())),
            };
            offset += member.offset;
            ty = member.ty;

            while !rest.is_empty() {
                let inner = rest.strip_prefix('[').ok_or_else(malformed)?;
                let close = inner.find(']').ok_or_else(malformed)?;
                let index: u32 = inner[..close].trim().parse().map_err(|_| malformed())?;
                rest = &inner[close + 1..];

                let (base, len, stride) = match &self.types[ty].inner {
                    naga::TypeInner::Array { base, size, stride } => {
                        let len = match size {
                            naga::ArraySize::Constant(n) => n.get(),
                            _ => 0,
                        };
                        (*base, len, *stride)
                    }
                    _ => return Err(malformed()),
                };
                if index >= len {
                    return Err(UniformError::IndexOutOfRange {
                        path: path.to_string(),
                        index,
                        len,
                    });
                }
                offset += index * stride;
                ty = base;
            }
        }

        Ok((offset, ty))
    }
}

fn type_name(inner: &naga::TypeInner) -> Option<&'static str> {
    use naga::{Scalar, TypeInner, VectorSize};

    match inner {
        TypeInner::Scalar(s) if *s == Scalar::F32 => Some("f32"),
        TypeInner::Vector {
            size: VectorSize::Tri,
            scalar,
        } if *scalar == Scalar::F32 => Some("vec3<f32>"),
        TypeInner::Matrix {
            columns: VectorSize::Quad,
            rows: VectorSize::Quad,
            scalar,
        } if *scalar == Scalar::F32 => Some("mat4x4<f32>"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"
struct Light {
    position: vec3<f32>,
    color: vec3<f32>,
    intensity: f32,
};

struct Frame {
    view: mat4x4<f32>,
    eye: vec3<f32>,
    lights: array<Light, 2>,
    exposure: f32,
};

@group(0) @binding(3)
var<uniform> frame: Frame;
"#;

    fn block() -> UniformBlock {
        let module = naga::front::wgsl::parse_str(SOURCE).unwrap();
        UniformBlock::from_module(&module, "frame").unwrap()
    }

    fn read_f32(block: &UniformBlock, offset: u32) -> f32 {
        let start = offset as usize;
        f32::from_le_bytes(block.as_bytes()[start..start + 4].try_into().unwrap())
    }

    #[test]
    fn reflects_binding_and_size() {
        let block = block();
        assert_eq!(block.name(), "frame");
        assert_eq!((block.group(), block.binding()), (0, 3));
        assert_eq!(block.size(), 160);
    }

    #[test]
    fn offsets_follow_wgsl_layout() {
        let block = block();
        assert_eq!(block.offset_of("view").unwrap(), 0);
        assert_eq!(block.offset_of("eye").unwrap(), 64);
        assert_eq!(block.offset_of("lights[0].position").unwrap(), 80);
        assert_eq!(block.offset_of("lights[0].color").unwrap(), 96);
        assert_eq!(block.offset_of("lights[1].intensity").unwrap(), 140);
        assert_eq!(block.offset_of("exposure").unwrap(), 144);
    }

    #[test]
    fn set_writes_values_in_place() {
        let mut block = block();
        block.set("eye", Vec3::new(1.0, 2.0, 3.0)).unwrap();
        block.set("lights[1].intensity", 0.5_f32).unwrap();
        block.set("view", Mat4::IDENTITY).unwrap();

        assert_eq!(read_f32(&block, 64), 1.0);
        assert_eq!(read_f32(&block, 68), 2.0);
        assert_eq!(read_f32(&block, 72), 3.0);
        assert_eq!(read_f32(&block, 140), 0.5);
        assert_eq!(read_f32(&block, 0), 1.0);
        assert_eq!(read_f32(&block, 4), 0.0);
        assert_eq!(read_f32(&block, 60), 1.0);
    }

    #[test]
    fn unknown_names_are_rejected() {
        let mut block = block();
        assert!(matches!(
            block.set("missing", 1.0_f32),
            Err(UniformError::UnknownField(_))
        ));
        assert!(matches!(
            block.set("lights[0].radius", 1.0_f32),
            Err(UniformError::UnknownField(_))
        ));
        assert!(matches!(
            block.set("eye.x", 1.0_f32),
            Err(UniformError::UnknownField(_))
        ));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut block = block();
        let err = block.set("lights[2].intensity", 1.0_f32).unwrap_err();
        assert!(matches!(
            err,
            UniformError::IndexOutOfRange { index: 2, len: 2, .. }
        ));
    }

    #[test]
    fn malformed_paths_are_rejected() {
        let block = block();
        for path in ["", "lights[", "lights[x].color", ".eye", "lights]0["] {
            assert!(block.offset_of(path).is_err(), "{path} should not resolve");
        }
    }

    #[test]
    fn type_mismatch_is_rejected() {
        let mut block = block();
        let err = block.set("eye", 1.0_f32).unwrap_err();
        match err {
            UniformError::TypeMismatch {
                expected, actual, ..
            } => {
                assert_eq!(expected, "vec3<f32>");
                assert_eq!(actual, "f32");
            }
            other => panic!("expected type mismatch, got {other:?}"),
        }
    }

    #[test]
    fn unknown_block_is_rejected() {
        let module = naga::front::wgsl::parse_str(SOURCE).unwrap();
        assert!(matches!(
            UniformBlock::from_module(&module, "camera"),
            Err(UniformError::UnknownBlock(_))
        ));
    }
}
