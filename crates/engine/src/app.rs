use std::sync::Arc;
use std::time::{Duration, Instant};

use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{CursorGrabMode, Fullscreen, Window, WindowId};

use crate::error::EngineError;
use crate::gpu::Gpu;
use crate::input::InputState;
use crate::timing::{FpsCounter, FrameClock};

/// Window parameters passed to [`start`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    pub fullscreen: bool,
}

/// Content driven by the harness.
///
/// `init` runs once after the window and GPU exist; then every frame the
/// harness calls `process_input`, `update` and `render` in that order until
/// the window closes, and finally `deinit`.
pub trait Scene {
    fn init(&mut self, ctx: &InitContext<'_>) -> Result<(), EngineError>;

    fn deinit(&mut self);

    fn process_input(&mut self, input: &InputState, control: &mut FrameControl);

    fn update(&mut self, delta: Duration);

    fn render(&mut self, frame: &mut RenderFrame<'_>) -> Result<(), EngineError>;
}

/// What a scene can reach while initializing.
pub struct InitContext<'a> {
    pub gpu: &'a Gpu,
    window: &'a Window,
}

impl InitContext<'_> {
    /// Hide the cursor and lock it to the window so mouse motion is
    /// reported as relative deltas.
    pub fn capture_cursor(&self) {
        let grabbed = self
            .window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined));
        if let Err(e) = grabbed {
            tracing::warn!("cursor grab unavailable: {e}");
        }
        self.window.set_cursor_visible(false);
    }
}

/// Per-frame loop control handed to [`Scene::process_input`].
#[derive(Debug)]
pub struct FrameControl {
    delta: Duration,
    close_requested: bool,
}

impl FrameControl {
    pub fn new(delta: Duration) -> Self {
        Self {
            delta,
            close_requested: false,
        }
    }

    /// Time since the previous frame.
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Leave the frame loop after this frame's input is processed.
    pub fn request_close(&mut self) {
        self.close_requested = true;
    }

    pub fn close_requested(&self) -> bool {
        self.close_requested
    }
}

/// Targets for recording one frame.
pub struct RenderFrame<'a> {
    pub gpu: &'a Gpu,
    pub target: &'a wgpu::TextureView,
    pub encoder: &'a mut wgpu::CommandEncoder,
}

/// Open the window, run `scene` until the window is closed, tear down.
///
/// The first error from window/GPU creation or from the scene stops the loop
/// and is returned; nothing is retried.
pub fn start<S: Scene>(config: EngineConfig, scene: S) -> Result<(), EngineError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    tracing::info!(
        title = %config.title,
        width = config.width,
        height = config.height,
        vsync = config.vsync,
        fullscreen = config.fullscreen,
        "starting"
    );

    let mut harness = Harness::new(config, scene);
    event_loop.run_app(&mut harness)?;
    harness.finish()
}

struct Harness<S: Scene> {
    config: EngineConfig,
    scene: S,
    window: Option<Arc<Window>>,
    gpu: Option<Gpu>,
    input: InputState,
    clock: FrameClock,
    fps: FpsCounter,
    focused: bool,
    initialized: bool,
    error: Option<EngineError>,
}

impl<S: Scene> Harness<S> {
    fn new(config: EngineConfig, scene: S) -> Self {
        let now = Instant::now();
        Self {
            config,
            scene,
            window: None,
            gpu: None,
            input: InputState::new(),
            clock: FrameClock::new(now),
            fps: FpsCounter::new(now),
            focused: true,
            initialized: false,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: EngineError) {
        self.record_error(error);
        event_loop.exit();
    }

    /// Keep the first error; later ones are consequences of it.
    fn record_error(&mut self, error: EngineError) {
        if self.error.is_none() {
            self.error = Some(error);
        } else {
            tracing::debug!("dropping follow-up error: {error}");
        }
    }

    fn setup(&mut self, event_loop: &ActiveEventLoop) -> Result<(), EngineError> {
        let mut attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height))
            .with_resizable(false);
        let monitor = event_loop.primary_monitor();
        if self.config.fullscreen {
            attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(monitor)));
        } else if let Some(monitor) = monitor {
            let size = monitor.size();
            attrs = attrs.with_position(PhysicalPosition::new(size.width / 4, size.height / 4));
        }

        let window = Arc::new(event_loop.create_window(attrs)?);
        let gpu = Gpu::new(window.clone(), self.config.vsync)?;

        self.scene.init(&InitContext {
            gpu: &gpu,
            window: window.as_ref(),
        })?;
        self.initialized = true;

        let now = Instant::now();
        self.clock = FrameClock::new(now);
        self.fps = FpsCounter::new(now);

        window.request_redraw();
        self.window = Some(window);
        self.gpu = Some(gpu);
        Ok(())
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let delta = self.clock.tick(now);

        let mut control = FrameControl::new(delta);
        self.scene.process_input(&self.input, &mut control);
        self.input.end_frame();
        if control.close_requested() {
            event_loop.exit();
            return;
        }

        self.scene.update(delta);

        let Some(gpu) = &self.gpu else {
            return;
        };
        let Some(output) = gpu.acquire() else {
            return;
        };
        let target = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });

        let rendered = self.scene.render(&mut RenderFrame {
            gpu,
            target: &target,
            encoder: &mut encoder,
        });
        if let Err(e) = rendered {
            self.fail(event_loop, e);
            return;
        }

        gpu.queue().submit(std::iter::once(encoder.finish()));
        output.present();

        if let Some(fps) = self.fps.frame(now) {
            tracing::info!(fps, "frame rate");
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn teardown(&mut self) {
        if self.initialized {
            self.scene.deinit();
            self.initialized = false;
            tracing::debug!("scene released");
        }
        self.gpu = None;
        self.window = None;
    }

    fn finish(mut self) -> Result<(), EngineError> {
        self.teardown();
        match self.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<S: Scene> ApplicationHandler for Harness<S> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.error.is_some() {
            return;
        }
        if let Err(e) = self.setup(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size.width, new_size.height);
                }
            }
            WindowEvent::Focused(focused) => {
                self.focused = focused;
                if !focused {
                    self.input.release_all();
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state,
                        ..
                    },
                ..
            } => {
                self.input.handle_key(key, state == ElementState::Pressed);
            }
            WindowEvent::MouseInput { button, state, .. } => {
                self.input
                    .handle_button(button, state == ElementState::Pressed);
            }
            WindowEvent::RedrawRequested => {
                if self.error.is_none() {
                    self.frame(event_loop);
                }
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.focused {
                self.input.handle_mouse_motion(delta.0, delta.1);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::error::UniformError;

    #[derive(Default)]
    struct CountingScene {
        deinits: Rc<Cell<u32>>,
    }

    impl Scene for CountingScene {
        fn init(&mut self, _ctx: &InitContext<'_>) -> Result<(), EngineError> {
            Ok(())
        }

        fn deinit(&mut self) {
            self.deinits.set(self.deinits.get() + 1);
        }

        fn process_input(&mut self, _input: &InputState, _control: &mut FrameControl) {}

        fn update(&mut self, _delta: Duration) {}

        fn render(&mut self, _frame: &mut RenderFrame<'_>) -> Result<(), EngineError> {
            Ok(())
        }
    }

    fn harness() -> (Harness<CountingScene>, Rc<Cell<u32>>) {
        let scene = CountingScene::default();
        let deinits = scene.deinits.clone();
        let config = EngineConfig {
            title: "test".into(),
            width: 64,
            height: 64,
            vsync: false,
            fullscreen: false,
        };
        (Harness::new(config, scene), deinits)
    }

    #[test]
    fn deinit_runs_once_after_init() {
        let (mut harness, deinits) = harness();
        harness.initialized = true;
        harness.teardown();
        harness.teardown();
        assert_eq!(deinits.get(), 1);
        assert!(harness.finish().is_ok());
        assert_eq!(deinits.get(), 1);
    }

    #[test]
    fn deinit_is_skipped_without_init() {
        let (harness, deinits) = harness();
        assert!(harness.finish().is_ok());
        assert_eq!(deinits.get(), 0);
    }

    #[test]
    fn finish_returns_the_first_error() {
        let (mut harness, deinits) = harness();
        harness.initialized = true;
        harness.record_error(EngineError::NoAdapter);
        let later = EngineError::Uniform(UniformError::UnknownBlock("frame".into()));
        harness.record_error(later);
        assert!(matches!(harness.finish(), Err(EngineError::NoAdapter)));
        assert_eq!(deinits.get(), 1);
    }
}
