//! The demo's fixed light set and how it is written into the frame uniforms.

use glam::Vec3;
use lumen_common::{Attenuation, DirectionalLight, LightColor, PointLight, SpotLight};
use lumen_engine::{UniformBlock, UniformError};

pub const POINT_LIGHT_COUNT: usize = 4;

/// One directional, four point and one camera-held spot light.
#[derive(Debug, Clone, PartialEq)]
pub struct LightRig {
    pub directional: DirectionalLight,
    pub points: [PointLight; POINT_LIGHT_COUNT],
    pub spot: SpotLight,
}

fn point(position: Vec3, color: LightColor) -> PointLight {
    PointLight {
        position,
        color,
        attenuation: Attenuation::RANGE_50,
    }
}

impl Default for LightRig {
    fn default() -> Self {
        let magenta_red = LightColor::new(
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
        );
        Self {
            directional: DirectionalLight {
                direction: Vec3::new(0.0, -1.0, -1.0),
                color: LightColor::new(Vec3::ZERO, Vec3::splat(0.1), Vec3::splat(0.1)),
            },
            points: [
                point(Vec3::new(0.0, 3.0, 0.0), magenta_red),
                point(Vec3::new(-2.0, 3.0, 0.0), LightColor::uniform(Vec3::Y)),
                point(Vec3::new(2.0, 3.0, 0.0), LightColor::uniform(Vec3::Z)),
                point(
                    Vec3::new(0.0, 3.0, 2.0),
                    LightColor::uniform(Vec3::new(0.0, 1.0, 1.0)),
                ),
            ],
            spot: SpotLight::from_angles(
                Vec3::ZERO,
                Vec3::NEG_Z,
                LightColor::uniform(Vec3::ONE),
                Attenuation::RANGE_50,
                12.5,
                15.0,
            ),
        }
    }
}

impl LightRig {
    /// Place the spot light at the camera, pointing where it looks.
    pub fn follow_camera(&mut self, eye: Vec3, forward: Vec3) {
        self.spot.position = eye;
        self.spot.direction = forward;
    }

    /// Write every light into the `frame` uniform block.
    pub fn write(&self, block: &mut UniformBlock) -> Result<(), UniformError> {
        write_color(block, "dir_light", &self.directional.color)?;
        block.set("dir_light.direction", self.directional.direction)?;

        for (i, light) in self.points.iter().enumerate() {
            let prefix = format!("point_lights[{i}]");
            block.set(&format!("{prefix}.position"), light.position)?;
            write_color(block, &prefix, &light.color)?;
            let attenuation = light.attenuation.as_vec3();
            block.set(&format!("{prefix}.attenuation"), attenuation)?;
        }

        let spot = &self.spot;
        block.set("spot_light.position", spot.position)?;
        block.set("spot_light.direction", spot.direction)?;
        write_color(block, "spot_light", &spot.color)?;
        block.set("spot_light.attenuation", spot.attenuation.as_vec3())?;
        block.set("spot_light.cut_off", spot.cut_off)?;
        block.set("spot_light.outer_cut_off", spot.outer_cut_off)?;
        Ok(())
    }
}

fn write_color(
    block: &mut UniformBlock,
    prefix: &str,
    color: &LightColor,
) -> Result<(), UniformError> {
    block.set(&format!("{prefix}.ambient"), color.ambient)?;
    block.set(&format!("{prefix}.diffuse"), color.diffuse)?;
    block.set(&format!("{prefix}.specular"), color.specular)?;
    Ok(())
}
