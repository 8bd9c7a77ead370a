use std::path::PathBuf;
use std::time::Duration;

use glam::Vec3;
use lumen_common::Transform;
use lumen_engine::{
    DEPTH_FORMAT, EngineError, FrameControl, Gpu, ImageData, InitContext, InputState, KeyCode,
    MouseButton, RenderFrame, Scene, ShaderProgram, UniformBlock,
};

use crate::camera::{Camera, CameraSettings};
use crate::lights::LightRig;
use crate::mesh::{Vertex, textured_cube, textured_plane};
use crate::model::{Material, TexturedModel, object_bind_group_layout};

pub const VERTEX_SHADER: &str = "shaders/multiple_light.vert.wgsl";
pub const FRAGMENT_SHADER: &str = "shaders/multiple_light.frag.wgsl";

/// Cube spin rate in radians per second.
pub const SPIN_RATE: f32 = 1.5;
const SHININESS: f32 = 0.4;

/// Settings the binary passes in.
#[derive(Debug, Clone)]
pub struct DemoSettings {
    /// Directory holding `shaders/` and `textures/`.
    pub assets_dir: PathBuf,
    pub camera: CameraSettings,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("assets"),
            camera: CameraSettings::default(),
        }
    }
}

struct GpuState {
    pipeline: wgpu::RenderPipeline,
    frame_uniforms: UniformBlock,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    cube: TexturedModel,
    plane: TexturedModel,
}

/// Textured cube and ground plane lit by six lights, seen through a fly
/// camera.
pub struct Demo {
    settings: DemoSettings,
    camera: Camera,
    lights: LightRig,
    cube_angle: f32,
    gpu: Option<GpuState>,
}

impl Demo {
    pub fn new(settings: DemoSettings) -> Self {
        Self {
            settings,
            camera: Camera::default(),
            lights: LightRig::default(),
            cube_angle: 0.0,
            gpu: None,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn cube_angle(&self) -> f32 {
        self.cube_angle
    }

    /// Model transform of the spinning cube.
    pub fn cube_transform(&self) -> Transform {
        Transform::from_position(Vec3::new(0.0, 3.0, 0.0))
            .with_rotation_y(self.cube_angle)
            .with_uniform_scale(3.0)
    }

    /// Read, compile and link the demo's shader pair.
    pub fn load_program(&self) -> Result<ShaderProgram, EngineError> {
        let assets = &self.settings.assets_dir;
        Ok(ShaderProgram::build(
            assets.join(VERTEX_SHADER),
            assets.join(FRAGMENT_SHADER),
            None,
        )?)
    }

    fn texture(&self, name: &str, mipmaps: bool) -> ImageData {
        let path = self.settings.assets_dir.join("textures").join(name);
        ImageData::load_or_white(path, mipmaps)
    }

    fn create_gpu_state(&self, gpu: &Gpu) -> Result<GpuState, EngineError> {
        let program = self.load_program()?;
        let device = gpu.device();
        let queue = gpu.queue();
        let modules = program.create_modules(device);

        let frame_uniforms = program.uniform_block("frame")?;
        let object_uniforms = program.uniform_block("object")?;

        let frame_buffer = frame_uniforms.create_buffer(device);
        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });
        let object_layout = object_bind_group_layout(device);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("multiple_light_pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &object_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("multiple_light_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &modules.vertex,
                entry_point: Some(modules.vertex_entry.as_str()),
                compilation_options: Default::default(),
                buffers: &[Vertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &modules.fragment,
                entry_point: Some(modules.fragment_entry.as_str()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.surface_format(),
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let cube_material = Material {
            diffuse: self.texture("pintuP.png", false),
            specular: self.texture("Spintu.png", false),
            mipmaps: false,
            shininess: SHININESS,
        };
        let plane_material = Material {
            diffuse: self.texture("lantai.png", true),
            specular: self.texture("spekular_lantai.png", false),
            mipmaps: true,
            shininess: SHININESS,
        };
        let cube = TexturedModel::new(
            device,
            queue,
            &object_layout,
            "cube",
            &textured_cube(),
            &cube_material,
            object_uniforms.clone(),
        );
        let plane = TexturedModel::new(
            device,
            queue,
            &object_layout,
            "plane",
            &textured_plane(),
            &plane_material,
            object_uniforms,
        );

        Ok(GpuState {
            pipeline,
            frame_uniforms,
            frame_buffer,
            frame_bind_group,
            cube,
            plane,
        })
    }
}

impl Scene for Demo {
    fn init(&mut self, ctx: &InitContext<'_>) -> Result<(), EngineError> {
        self.gpu = Some(self.create_gpu_state(ctx.gpu)?);
        self.camera = Camera::default();
        self.cube_angle = 0.0;
        ctx.capture_cursor();
        tracing::info!(assets = %self.settings.assets_dir.display(), "demo scene ready");
        Ok(())
    }

    fn deinit(&mut self) {
        if let Some(state) = self.gpu.take() {
            state.cube.destroy();
            state.plane.destroy();
            state.frame_buffer.destroy();
        }
    }

    fn process_input(&mut self, input: &InputState, control: &mut FrameControl) {
        if input.key_held(KeyCode::Escape) {
            control.request_close();
            return;
        }

        let dt = control.delta().as_secs_f32();
        let step = self.settings.camera.move_speed * dt;
        if input.key_held(KeyCode::KeyW) {
            self.camera.move_forward(step);
        }
        if input.key_held(KeyCode::KeyS) {
            self.camera.move_forward(-step);
        }
        if input.key_held(KeyCode::KeyA) {
            self.camera.strafe(-step);
        }
        if input.key_held(KeyCode::KeyD) {
            self.camera.strafe(step);
        }

        let zoom = self.settings.camera.zoom_rate * dt;
        if input.button_held(MouseButton::Right) {
            self.camera.zoom(zoom);
        }
        if input.button_held(MouseButton::Left) {
            self.camera.zoom(-zoom);
        }

        let motion = input.mouse_delta();
        if motion != glam::Vec2::ZERO {
            self.camera.look(motion.x, motion.y);
        }
    }

    fn update(&mut self, delta: Duration) {
        self.cube_angle += SPIN_RATE * delta.as_secs_f32();
    }

    fn render(&mut self, frame: &mut RenderFrame<'_>) -> Result<(), EngineError> {
        let cube_transform = self.cube_transform();
        let Some(state) = &mut self.gpu else {
            return Ok(());
        };
        let queue = frame.gpu.queue();

        let uniforms = &mut state.frame_uniforms;
        let projection = self.camera.projection_matrix(frame.gpu.aspect());
        uniforms.set("projection", projection)?;
        uniforms.set("view", self.camera.view_matrix())?;
        uniforms.set("view_pos", self.camera.eye)?;
        self.lights.follow_camera(self.camera.eye, self.camera.forward());
        self.lights.write(uniforms)?;
        uniforms.upload(queue, &state.frame_buffer);

        state.cube.transform = cube_transform;
        state.cube.upload(queue)?;
        state.plane.upload(queue)?;

        let mut pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("multiple_light_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: frame.target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: frame.gpu.depth_view(),
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });

        pass.set_pipeline(&state.pipeline);
        pass.set_bind_group(0, &state.frame_bind_group, &[]);
        state.cube.draw(&mut pass);
        state.plane.draw(&mut pass);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn assets_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets")
    }

    fn demo() -> Demo {
        Demo::new(DemoSettings {
            assets_dir: assets_dir(),
            ..Default::default()
        })
    }

    fn step(demo: &mut Demo, input: &InputState) -> bool {
        let mut control = FrameControl::new(Duration::from_millis(100));
        demo.process_input(input, &mut control);
        control.close_requested()
    }

    #[test]
    fn escape_requests_close() {
        let mut demo = demo();
        let mut input = InputState::new();
        assert!(!step(&mut demo, &input));
        input.handle_key(KeyCode::Escape, true);
        assert!(step(&mut demo, &input));
    }

    #[test]
    fn w_moves_towards_target() {
        let mut demo = demo();
        let mut input = InputState::new();
        input.handle_key(KeyCode::KeyW, true);
        step(&mut demo, &input);
        assert!(demo.camera().eye.z < 8.0);
        assert_eq!(demo.camera().eye.x, 0.0);
    }

    #[test]
    fn opposite_keys_cancel() {
        let mut demo = demo();
        let mut input = InputState::new();
        input.handle_key(KeyCode::KeyA, true);
        input.handle_key(KeyCode::KeyD, true);
        step(&mut demo, &input);
        assert!(demo.camera().eye.x.abs() < 1e-5);
    }

    #[test]
    fn mouse_buttons_zoom() {
        let mut demo = demo();
        let mut input = InputState::new();
        input.handle_button(MouseButton::Right, true);
        step(&mut demo, &input);
        assert!(demo.camera().fov > 45.0);

        let mut input = InputState::new();
        input.handle_button(MouseButton::Left, true);
        step(&mut demo, &input);
        step(&mut demo, &input);
        assert!(demo.camera().fov < 45.0);
    }

    #[test]
    fn update_spins_cube() {
        let mut demo = demo();
        demo.update(Duration::from_secs(2));
        assert!((demo.cube_angle() - 3.0).abs() < 1e-6);
        assert_eq!(demo.cube_transform().position, Vec3::new(0.0, 3.0, 0.0));
        assert_eq!(demo.cube_transform().scale, Vec3::splat(3.0));
    }

    #[test]
    fn shipped_shaders_link() {
        let program = demo().load_program().unwrap();
        assert_eq!(program.vertex().entry_point(), "vs_main");
        assert_eq!(program.fragment().entry_point(), "fs_main");
    }

    #[test]
    fn every_light_path_resolves() {
        let demo = demo();
        let program = demo.load_program().unwrap();

        let mut frame = program.uniform_block("frame").unwrap();
        assert_eq!((frame.group(), frame.binding()), (0, 0));
        let projection = demo.camera().projection_matrix(4.0 / 3.0);
        frame.set("projection", projection).unwrap();
        frame.set("view", demo.camera().view_matrix()).unwrap();
        frame.set("view_pos", demo.camera().eye).unwrap();
        LightRig::default().write(&mut frame).unwrap();

        let mut object = program.uniform_block("object").unwrap();
        assert_eq!((object.group(), object.binding()), (1, 0));
        object.set("model", demo.cube_transform().matrix()).unwrap();
        object.set("shininess", SHININESS).unwrap();
    }

    #[test]
    fn shipped_textures_decode() {
        let textures = assets_dir().join("textures");
        for name in ["pintuP.png", "Spintu.png", "lantai.png", "spekular_lantai.png"] {
            let data = ImageData::load(textures.join(name), false).unwrap();
            assert!(data.width() > 1 && data.height() > 1, "{name}");
        }
    }

    #[test]
    fn missing_assets_fail_to_load() {
        let demo = Demo::new(DemoSettings {
            assets_dir: PathBuf::from("/nonexistent/lumen-assets"),
            ..Default::default()
        });
        let err = demo.load_program().unwrap_err();
        assert!(matches!(err, EngineError::Shader(_)));
    }
}
