//! Engine harness: window, GPU context and the fixed frame loop.
//!
//! A [`Scene`] supplies content; [`start`] owns everything else. The loop is
//! single-threaded and runs input, update, render, present once per frame
//! until the window closes.
//!
//! # Invariants
//! - `Scene::init` runs exactly once, before the first frame.
//! - `Scene::deinit` runs exactly once if and only if `init` succeeded.
//! - The first error stops the loop; there is no retry.

mod app;
mod error;
mod gpu;
mod input;
mod shader;
mod texture;
mod timing;
mod uniform;

pub use app::{EngineConfig, FrameControl, InitContext, RenderFrame, Scene, start};
pub use error::{EngineError, ShaderError, TextureError, UniformError};
pub use gpu::{DEPTH_FORMAT, Gpu};
pub use input::{InputState, KeyCode, MouseButton};
pub use shader::{CompiledStage, GpuProgram, ShaderProgram, Stage};
pub use texture::{ColorSpace, GpuTexture, ImageData, create_sampler};
pub use timing::{FpsCounter, FrameClock};
pub use uniform::{UniformBlock, UniformValue};
