//! Runtime tunables for one game session.
//!
//! Board selection happens at compile time through Cargo features; everything
//! here is plain data with defaults matching the stock firmware.

use crate::calibration::CalibrationConfig;
use crate::collision::{Canvas, CollisionResolver, BALL_RADIUS, BOUNCE_FACTOR};
use crate::maze::MazeGrid;
use crate::mpu6050::SensorSettings;
use crate::physics::{PhysicsEngine, DAMPING, GRAVITY_GAIN};

pub const SPAWN: (f32, f32) = (12.0, 12.0);
pub const TICK_MS: u32 = 10;
// The win screen is static, so redraw it less often.
pub const WON_TICK_MS: u32 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Damping or bounce outside `[0, 1)`.
    Unstable,
    BadRadius,
    /// Spawn point is off-canvas or inside a wall.
    BlockedSpawn,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GameConfig {
    pub gain: f32,
    pub damping: f32,
    pub radius: f32,
    pub bounce: f32,
    pub canvas: Canvas,
    pub spawn: (f32, f32),
    pub tick_ms: u32,
    pub won_tick_ms: u32,
    pub calibration: CalibrationConfig,
    pub sensor: SensorSettings,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            gain: GRAVITY_GAIN,
            damping: DAMPING,
            radius: BALL_RADIUS,
            bounce: BOUNCE_FACTOR,
            canvas: Canvas::CLASSIC,
            spawn: SPAWN,
            tick_ms: TICK_MS,
            won_tick_ms: WON_TICK_MS,
            calibration: CalibrationConfig::default(),
            sensor: SensorSettings::default(),
        }
    }
}

impl GameConfig {
    pub fn physics(&self) -> PhysicsEngine {
        PhysicsEngine {
            gain: self.gain,
            damping: self.damping,
        }
    }

    pub fn collision(&self) -> CollisionResolver {
        CollisionResolver {
            canvas: self.canvas,
            radius: self.radius,
            bounce: self.bounce,
        }
    }

    /// Check that the ball settles and can be placed at spawn in `maze`.
    pub fn validate(&self, maze: &MazeGrid<'_>) -> Result<(), ConfigError> {
        let unit = 0.0..1.0;
        if !unit.contains(&self.damping) || !unit.contains(&self.bounce) {
            return Err(ConfigError::Unstable);
        }
        if self.radius.is_nan() || self.radius <= 0.0 {
            return Err(ConfigError::BadRadius);
        }
        if self
            .collision()
            .is_blocked(maze, self.spawn.0, self.spawn.1)
        {
            return Err(ConfigError::BlockedSpawn);
        }
        Ok(())
    }
}
