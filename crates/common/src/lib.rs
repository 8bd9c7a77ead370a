//! Shared value types for the lumen renderer.
//!
//! Nothing in here touches the GPU; the engine and the scene both depend on it.

mod light;
mod types;

pub use light::{Attenuation, DirectionalLight, LightColor, PointLight, SpotLight};
pub use types::Transform;
