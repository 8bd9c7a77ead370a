use std::path::PathBuf;

use crate::shader::Stage;

/// Errors from reading, compiling and linking shader programs.
#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("failed to read {stage} shader {path}")]
    Read {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{stage} shader compilation failed ({path}):\n{message}")]
    Compile {
        stage: Stage,
        path: PathBuf,
        message: String,
    },
    #[error("program linking failed: {0}")]
    Link(String),
    #[error("{0} shaders are not supported by the wgpu backend")]
    UnsupportedStage(Stage),
}

/// Errors from looking up and writing named uniform slots.
#[derive(Debug, thiserror::Error)]
pub enum UniformError {
    #[error("no uniform block named `{0}`")]
    UnknownBlock(String),
    #[error("uniform `{0}` is not a struct")]
    NotAStruct(String),
    #[error("malformed uniform path `{0}`")]
    MalformedPath(String),
    #[error("no uniform named `{0}`")]
    UnknownField(String),
    #[error("index {index} out of range for `{path}` (length {len})")]
    IndexOutOfRange { path: String, index: u32, len: u32 },
    #[error("uniform `{path}` has type {expected}, got {actual}")]
    TypeMismatch {
        path: String,
        expected: String,
        actual: &'static str,
    },
}

/// Errors from decoding texture images.
#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("failed to load image {path}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Any error that stops the harness.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("event loop error")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window")]
    Window(#[from] winit::error::OsError),
    #[error("failed to create surface")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    #[error("failed to create GPU device")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error(transparent)]
    Uniform(#[from] UniformError),
    #[error(transparent)]
    Texture(#[from] TextureError),
}
