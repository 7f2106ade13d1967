//! Global uniform bindings for camera and light data
//!
//! Bound at group 0 in the forward pipeline. Per-object uniforms use the
//! layout from [`object_bind_group_layout`] at group 1.

use cgmath::InnerSpace;

use crate::{
    gfx::{camera::camera_utils::CameraUniform, scene::HemisphereLight},
    wgpu_utils::uniform_buffer::UniformBuffer,
};

/// Global uniform buffer content.
///
/// MUST match `Globals` in shader.wgsl exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
    /// rgb + intensity in w
    sky_color: [f32; 4],
    ground_color: [f32; 4],
    /// Unit vector toward the sky side of the hemisphere light
    light_direction: [f32; 4],
}

impl GlobalUniform {
    pub fn new(camera: &CameraUniform, light: &HemisphereLight) -> Self {
        let [sr, sg, sb] = light.sky_color;
        let [gr, gg, gb] = light.ground_color;
        let dir = light.direction().normalize();
        Self {
            view_position: camera.view_position,
            view_proj: camera.view_proj,
            sky_color: [sr, sg, sb, light.intensity],
            ground_color: [gr, gg, gb, 1.0],
            light_direction: [dir.x, dir.y, dir.z, 0.0],
        }
    }
}

/// Type alias for the global uniform buffer
pub type GlobalUBO = UniformBuffer<GlobalUniform>;

fn uniform_layout_entry(visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Layout for per-object uniforms (model matrix, color, flags)
pub fn object_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Object Bind Group Layout"),
        entries: &[uniform_layout_entry(
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        )],
    })
}

/// Owns the global uniform buffer together with its layout and bind group
pub struct GlobalBindings {
    layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    ubo: GlobalUBO,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Globals Bind Group Layout"),
            entries: &[uniform_layout_entry(
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            )],
        });
        let ubo = GlobalUBO::new(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Global Bind Group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.binding_resource(),
            }],
        });

        Self {
            layout,
            bind_group,
            ubo,
        }
    }

    /// Should be called each frame before drawing
    pub fn update(&mut self, queue: &wgpu::Queue, camera: &CameraUniform, light: &HemisphereLight) {
        self.ubo.update_content(queue, GlobalUniform::new(camera, light));
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_size_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<GlobalUniform>() % 16, 0);
        assert_eq!(std::mem::size_of::<GlobalUniform>(), 128);
    }

    #[test]
    fn light_intensity_rides_in_sky_alpha() {
        let light = HemisphereLight {
            intensity: 0.5,
            ..Default::default()
        };
        let uniform = GlobalUniform::new(&CameraUniform::default(), &light);

        assert_eq!(uniform.sky_color[3], 0.5);
        let d = uniform.light_direction;
        assert!(((d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt() - 1.0).abs() < 1e-6);
    }
}
