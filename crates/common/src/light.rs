use glam::Vec3;

/// Constant, linear and quadratic attenuation terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Attenuation {
    /// Roughly a 50 unit range.
    pub const RANGE_50: Self = Self {
        constant: 1.0,
        linear: 0.09,
        quadratic: 0.032,
    };

    pub fn as_vec3(&self) -> Vec3 {
        Vec3::new(self.constant, self.linear, self.quadratic)
    }
}

/// Ambient, diffuse and specular colour of a light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightColor {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

impl LightColor {
    pub const fn new(ambient: Vec3, diffuse: Vec3, specular: Vec3) -> Self {
        Self {
            ambient,
            diffuse,
            specular,
        }
    }

    /// Same colour for all three terms.
    pub const fn uniform(color: Vec3) -> Self {
        Self::new(color, color, color)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub color: LightColor,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: LightColor,
    pub attenuation: Attenuation,
}

/// A cone light. Cut-offs are stored as cosines of the half angles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    pub position: Vec3,
    pub direction: Vec3,
    pub color: LightColor,
    pub attenuation: Attenuation,
    pub cut_off: f32,
    pub outer_cut_off: f32,
}

impl SpotLight {
    /// Builds a spotlight from inner and outer half angles in degrees.
    pub fn from_angles(
        position: Vec3,
        direction: Vec3,
        color: LightColor,
        attenuation: Attenuation,
        inner_degrees: f32,
        outer_degrees: f32,
    ) -> Self {
        Self {
            position,
            direction,
            color,
            attenuation,
            cut_off: inner_degrees.to_radians().cos(),
            outer_cut_off: outer_degrees.to_radians().cos(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attenuation_packs_in_term_order() {
        assert_eq!(Attenuation::RANGE_50.as_vec3(), Vec3::new(1.0, 0.09, 0.032));
    }

    #[test]
    fn spot_cut_offs_are_cosines() {
        let spot = SpotLight::from_angles(
            Vec3::ZERO,
            Vec3::NEG_Z,
            LightColor::uniform(Vec3::ONE),
            Attenuation::RANGE_50,
            12.5,
            15.0,
        );
        assert!((spot.cut_off - 12.5_f32.to_radians().cos()).abs() < 1e-6);
        // wider outer cone has the smaller cosine
        assert!(spot.outer_cut_off < spot.cut_off);
    }
}
