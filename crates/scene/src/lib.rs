//! The multiple-lighting demo scene.
//!
//! A spinning textured slab above a tiled floor, lit by one directional
//! light, four coloured point lights and a spot light held by the camera.

mod camera;
mod demo;
mod lights;
mod mesh;
mod model;

pub use camera::{Camera, CameraSettings, LOOK_SCALE, MAX_FOV, MIN_FOV, PITCH_LIMIT};
pub use demo::{Demo, DemoSettings, FRAGMENT_SHADER, SPIN_RATE, VERTEX_SHADER};
pub use lights::{LightRig, POINT_LIGHT_COUNT};
pub use mesh::{MeshData, Vertex, textured_cube, textured_plane};
pub use model::{Material, TexturedModel, object_bind_group_layout};
