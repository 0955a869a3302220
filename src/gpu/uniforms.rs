//! Named uniform blocks laid out with WGSL uniform-buffer alignment rules.

use glam::{Mat4, Vec3};

/// Member types a uniform block may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    F32,
    U32,
    Vec3,
    Mat4,
}

impl UniformKind {
    pub fn size(self) -> usize {
        match self {
            UniformKind::F32 | UniformKind::U32 => 4,
            UniformKind::Vec3 => 12,
            UniformKind::Mat4 => 64,
        }
    }

    pub fn align(self) -> usize {
        match self {
            UniformKind::F32 | UniformKind::U32 => 4,
            UniformKind::Vec3 | UniformKind::Mat4 => 16,
        }
    }
}

#[derive(Debug, Clone)]
struct Member {
    name: &'static str,
    kind: UniformKind,
    offset: usize,
}

/// Byte layout of a WGSL struct, members in declaration order
#[derive(Debug, Clone)]
pub struct UniformLayout {
    members: Vec<Member>,
    size: usize,
}

fn align_up(value: usize, align: usize) -> usize {
    value.div_ceil(align) * align
}

impl UniformLayout {
    pub fn new(fields: &[(&'static str, UniformKind)]) -> Self {
        let mut members = Vec::with_capacity(fields.len());
        let mut offset = 0;
        for &(name, kind) in fields {
            offset = align_up(offset, kind.align());
            members.push(Member { name, kind, offset });
            offset += kind.size();
        }

        // Uniform buffer structs are padded to 16 bytes
        Self {
            members,
            size: align_up(offset.max(16), 16),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn offset_of(&self, name: &str) -> Option<(usize, UniformKind)> {
        self.members
            .iter()
            .find(|m| m.name == name)
            .map(|m| (m.offset, m.kind))
    }
}

/// Host copy of a uniform block plus the GPU buffer it is flushed to
pub struct UniformBlock {
    label: &'static str,
    layout: UniformLayout,
    bytes: Vec<u8>,
    buffer: wgpu::Buffer,
    dirty: bool,
}

impl UniformBlock {
    pub fn new(device: &wgpu::Device, label: &'static str, layout: UniformLayout) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: layout.size() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            label,
            bytes: vec![0; layout.size()],
            layout,
            buffer,
            dirty: true,
        }
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    fn write(&mut self, name: &str, kind: UniformKind, data: &[u8]) {
        match self.layout.offset_of(name) {
            Some((offset, expected)) if expected == kind => {
                self.bytes[offset..offset + data.len()].copy_from_slice(data);
                self.dirty = true;
            }
            Some((_, expected)) => log::warn!(
                "{}: uniform '{}' is {:?}, ignoring {:?} write",
                self.label,
                name,
                expected,
                kind
            ),
            None => log::warn!("{}: no uniform named '{}'", self.label, name),
        }
    }

    pub fn set_f32(&mut self, name: &str, value: f32) {
        self.write(name, UniformKind::F32, bytemuck::bytes_of(&value));
    }

    pub fn set_u32(&mut self, name: &str, value: u32) {
        self.write(name, UniformKind::U32, bytemuck::bytes_of(&value));
    }

    pub fn set_vec3(&mut self, name: &str, value: Vec3) {
        self.write(name, UniformKind::Vec3, bytemuck::cast_slice(&value.to_array()));
    }

    pub fn set_mat4(&mut self, name: &str, value: &Mat4) {
        self.write(name, UniformKind::Mat4, bytemuck::cast_slice(&value.to_cols_array()));
    }

    /// Upload pending changes; no-op when nothing was set since the last flush
    pub fn flush(&mut self, queue: &wgpu::Queue) {
        if self.dirty {
            queue.write_buffer(&self.buffer, 0, &self.bytes);
            self.dirty = false;
        }
    }

    #[cfg(test)]
    fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}
