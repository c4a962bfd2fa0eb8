//! Game state machine.
//!
//! `Calibrating -> Playing -> Won`. A restart event puts the ball back at
//! spawn from `Playing` or `Won`; an exit event ends the session from any
//! phase. The caller owns the loop: it feeds one latched input event per tick
//! and sleeps `tick_period_ms()` between ticks.

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::calibration::{calibrate, CalibrationReport};
use crate::collision::{is_win, Canvas, CollisionResolver};
use crate::config::GameConfig;
use crate::convert::to_physical;
use crate::input::InputEvent;
use crate::maze::MazeGrid;
use crate::mpu6050::Mpu6050;
use crate::physics::{BallState, PhysicsEngine};
use crate::transport::{RegisterTransport, TransportError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Calibrating,
    Playing,
    Won,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Running,
    /// Exit requested; the caller should call `Game::shutdown` and reset.
    Exit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct TickStats {
    /// Ticks simulated since the last restart.
    pub play_ticks: u32,
    /// Ticks whose physics was skipped because the sensor read failed.
    pub skipped_ticks: u32,
}

/// Everything the renderer needs for one frame.
#[derive(Clone, Copy, Debug)]
pub struct Scene<'a, 'm> {
    pub phase: Phase,
    pub maze: &'a MazeGrid<'m>,
    pub ball: &'a BallState,
    pub radius: f32,
    pub canvas: Canvas,
    pub stats: TickStats,
}

pub struct Game<'m, T> {
    imu: Mpu6050<T>,
    maze: MazeGrid<'m>,
    config: GameConfig,
    physics: PhysicsEngine,
    collision: CollisionResolver,
    ball: BallState,
    phase: Phase,
    stats: TickStats,
    calibration: Option<CalibrationReport>,
}

impl<'m, T: RegisterTransport> Game<'m, T> {
    /// Takes an initialised sensor. Starts in `Calibrating`.
    pub fn new(imu: Mpu6050<T>, maze: MazeGrid<'m>, config: GameConfig) -> Self {
        Self {
            imu,
            maze,
            physics: config.physics(),
            collision: config.collision(),
            ball: BallState::at(config.spawn.0, config.spawn.1),
            config,
            phase: Phase::Calibrating,
            stats: TickStats::default(),
            calibration: None,
        }
    }

    /// Run bias calibration and enter `Playing`. The device must be at rest.
    pub fn calibrate(&mut self, delay: &mut impl DelayNs) -> CalibrationReport {
        let report = calibrate(&mut self.imu, delay, &self.config.calibration);
        self.calibration = Some(report);
        self.reset_ball();
        self.phase = Phase::Playing;
        info!("calibrated, playing");
        report
    }

    /// Advance one tick, handling `event` before any physics.
    pub fn tick(&mut self, event: InputEvent) -> TickOutcome {
        match event {
            InputEvent::Primary => {
                info!("exit requested in {:?}", self.phase);
                return TickOutcome::Exit;
            }
            InputEvent::Secondary => self.restart(),
            InputEvent::None => {}
        }

        if self.phase == Phase::Playing {
            self.step();
        }
        TickOutcome::Running
    }

    /// Put the ball back at spawn and resume play. No effect before
    /// calibration has finished.
    pub fn restart(&mut self) {
        if self.phase == Phase::Calibrating {
            return;
        }
        self.reset_ball();
        self.phase = Phase::Playing;
        info!("restart");
    }

    fn reset_ball(&mut self) {
        self.ball = BallState::at(self.config.spawn.0, self.config.spawn.1);
        self.stats.play_ticks = 0;
    }

    fn step(&mut self) {
        let raw = match self.imu.acquire() {
            Ok(raw) => raw,
            Err(e) => {
                self.stats.skipped_ticks = self.stats.skipped_ticks.saturating_add(1);
                warn!("sensor read failed, holding ball: {:?}", e);
                return;
            }
        };
        let sample = to_physical(&raw, self.imu.accel_scale(), self.imu.gyro_scale());

        let proposal = self.physics.step(&mut self.ball, &sample);
        self.collision.apply(&self.maze, &mut self.ball, proposal);
        self.stats.play_ticks = self.stats.play_ticks.saturating_add(1);

        if is_win(&self.maze, self.ball.x, self.ball.y) {
            self.ball.won = true;
            self.phase = Phase::Won;
            info!(
                "goal reached after {} ticks ({} skipped)",
                self.stats.play_ticks, self.stats.skipped_ticks
            );
        }
    }

    /// Minimum sleep before the next tick in the current phase.
    pub fn tick_period_ms(&self) -> u32 {
        match self.phase {
            Phase::Won => self.config.won_tick_ms,
            _ => self.config.tick_ms,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn ball(&self) -> &BallState {
        &self.ball
    }

    pub fn maze(&self) -> &MazeGrid<'m> {
        &self.maze
    }

    pub fn stats(&self) -> TickStats {
        self.stats
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn calibration(&self) -> Option<&CalibrationReport> {
        self.calibration.as_ref()
    }

    pub fn sensor(&mut self) -> &mut Mpu6050<T> {
        &mut self.imu
    }

    pub fn scene(&self) -> Scene<'_, 'm> {
        Scene {
            phase: self.phase,
            maze: &self.maze,
            ball: &self.ball,
            radius: self.config.radius,
            canvas: self.config.canvas,
            stats: self.stats,
        }
    }

    /// Put the sensor to sleep and hand back the transport.
    pub fn shutdown(self) -> (T, Result<(), TransportError>) {
        info!("shutting down sensor");
        self.imu.shutdown()
    }
}
