//! View camera driven by server position-and-look updates.

use glam::{DVec3, Vec3};
use tessera_net::PositionAndLook;
use tessera_net::packets::relative;

/// Eye height above the player's feet, in blocks.
pub const EYE_HEIGHT: f64 = 1.8;

/// Player pose as the server reports it, plus derived view vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewCamera {
    /// Feet position in world space.
    pub feet: DVec3,
    /// Yaw in protocol degrees (0 faces +Z, clockwise seen from above).
    pub yaw_degrees: f32,
    /// Pitch in protocol degrees (positive looks down).
    pub pitch_degrees: f32,
}

impl ViewCamera {
    /// Applies a position-and-look, honoring its relative flags.
    pub fn apply(&mut self, update: &PositionAndLook) {
        let pick = |flag: u8, current: f64, value: f64| -> f64 {
            if update.flags & flag != 0 {
                current + value
            } else {
                value
            }
        };

        self.feet = DVec3::new(
            pick(relative::X, self.feet.x, update.x),
            pick(relative::Y, self.feet.y, update.y),
            pick(relative::Z, self.feet.z, update.z),
        );
        self.yaw_degrees = pick(relative::YAW, self.yaw_degrees.into(), update.yaw.into()) as f32;
        self.pitch_degrees =
            pick(relative::PITCH, self.pitch_degrees.into(), update.pitch.into()) as f32;
    }

    /// Eye position in world space.
    pub fn eye(&self) -> Vec3 {
        (self.feet + DVec3::new(0.0, EYE_HEIGHT, 0.0)).as_vec3()
    }

    /// Render yaw in radians, measured from +X toward +Z.
    pub fn yaw(&self) -> f32 {
        (self.yaw_degrees + 90.0).to_radians()
    }

    /// Render pitch in radians, positive looking up.
    pub fn pitch(&self) -> f32 {
        -self.pitch_degrees.to_radians()
    }

    /// Unit view direction.
    pub fn forward(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw(), self.pitch());
        Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize()
    }
}

impl Default for ViewCamera {
    fn default() -> Self {
        Self {
            feet: DVec3::ZERO,
            yaw_degrees: 0.0,
            pitch_degrees: 0.0,
        }
    }
}
