//! Ball dynamics: tilt in, proposed position out.
//!
//! One Euler step per tick with an implicit unit time-step, so the perceived
//! gravity scales with the tick rate.

use crate::convert::PhysicalSample;

pub const GRAVITY_GAIN: f32 = 0.15;
pub const DAMPING: f32 = 0.95;

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct BallState {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub won: bool,
}

impl BallState {
    /// Resting ball at the given position.
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            ..Default::default()
        }
    }
}

/// Candidate next position, not yet checked against the maze.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Proposal {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsEngine {
    pub gain: f32,
    /// Per-tick velocity retention, strictly below 1.
    pub damping: f32,
}

impl Default for PhysicsEngine {
    fn default() -> Self {
        Self {
            gain: GRAVITY_GAIN,
            damping: DAMPING,
        }
    }
}

impl PhysicsEngine {
    /// Update the ball's velocity from the tilt and return where it would
    /// move. Screen Y grows downwards, so the sensor's Y axis is inverted.
    pub fn step(&self, ball: &mut BallState, sample: &PhysicalSample) -> Proposal {
        ball.vx += sample.accel_x() * self.gain;
        ball.vy -= sample.accel_y() * self.gain;

        ball.vx *= self.damping;
        ball.vy *= self.damping;

        Proposal {
            x: ball.x + ball.vx,
            y: ball.y + ball.vy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tilt(ax: f32, ay: f32) -> PhysicalSample {
        PhysicalSample {
            accel: [ax, ay, 1.0],
            ..Default::default()
        }
    }

    #[test]
    fn step_applies_gain_then_damping() {
        let engine = PhysicsEngine::default();
        let mut ball = BallState::at(12.0, 12.0);
        let p = engine.step(&mut ball, &tilt(1.0, 0.0));
        assert!((ball.vx - 0.1425).abs() < 1e-6);
        assert_eq!(ball.vy, 0.0);
        assert!((p.x - 12.1425).abs() < 1e-5);
        assert_eq!(p.y, 12.0);
        // The proposal is not committed.
        assert_eq!(ball.x, 12.0);
    }

    #[test]
    fn y_axis_is_inverted_for_the_screen() {
        let engine = PhysicsEngine::default();
        let mut ball = BallState::at(12.0, 12.0);
        let p = engine.step(&mut ball, &tilt(0.0, 1.0));
        assert!(ball.vy < 0.0);
        assert!(p.y < 12.0);
    }

    #[test]
    fn level_device_bleeds_off_speed() {
        let engine = PhysicsEngine::default();
        let mut ball = BallState {
            vx: 2.0,
            vy: -2.0,
            ..BallState::at(40.0, 40.0)
        };
        let mut last = ball.vx.abs();
        for _ in 0..50 {
            engine.step(&mut ball, &tilt(0.0, 0.0));
            assert!(ball.vx.abs() < last);
            last = ball.vx.abs();
        }
        assert!(ball.vy.abs() < 0.2);
    }

    #[test]
    fn constant_tilt_reaches_terminal_speed() {
        let engine = PhysicsEngine::default();
        let mut ball = BallState::default();
        for _ in 0..500 {
            engine.step(&mut ball, &tilt(1.0, 0.0));
        }
        // v = (v + g) * d  =>  v* = g * d / (1 - d)
        let terminal = GRAVITY_GAIN * DAMPING / (1.0 - DAMPING);
        assert!((ball.vx - terminal).abs() < 1e-3);
    }
}
