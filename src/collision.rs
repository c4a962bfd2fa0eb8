//! Axis-separated collision against the maze and the canvas edges.
//!
//! X is resolved before Y, and the Y test uses the already-resolved X. The
//! order decides which diagonal corner cases are caught, so it must not be
//! swapped.

use log::debug;

use crate::maze::{MazeGrid, Tile};
use crate::physics::{BallState, Proposal};

pub const BALL_RADIUS: f32 = 3.0;
pub const BOUNCE_FACTOR: f32 = 0.6;

/// Drawable area in canvas units, origin top-left.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Canvas {
    pub width: f32,
    pub height: f32,
}

impl Canvas {
    pub const CLASSIC: Canvas = Canvas {
        width: 128.0,
        height: 64.0,
    };
}

/// Outcome of one resolution pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Resolution {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub hit_x: bool,
    pub hit_y: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionResolver {
    pub canvas: Canvas,
    pub radius: f32,
    /// Fraction of speed kept on rebound, strictly below 1.
    pub bounce: f32,
}

impl Default for CollisionResolver {
    fn default() -> Self {
        Self {
            canvas: Canvas::CLASSIC,
            radius: BALL_RADIUS,
            bounce: BOUNCE_FACTOR,
        }
    }
}

impl CollisionResolver {
    /// True if the ball centre may not occupy `(x, y)`.
    pub fn is_blocked(&self, maze: &MazeGrid<'_>, x: f32, y: f32) -> bool {
        if !x.is_finite() || !y.is_finite() {
            return true;
        }
        let r = self.radius;
        if x - r < 0.0 || x + r > self.canvas.width || y - r < 0.0 || y + r > self.canvas.height {
            return true;
        }
        // Cells outside the grid are never walls; only the canvas edge applies there.
        matches!(maze.tile_at(x, y), Some(Tile::Wall))
    }

    pub fn resolve(
        &self,
        maze: &MazeGrid<'_>,
        current: (f32, f32),
        proposal: Proposal,
        velocity: (f32, f32),
    ) -> Resolution {
        let (mut x, mut y) = current;
        let (mut vx, mut vy) = velocity;

        let hit_x = self.is_blocked(maze, proposal.x, y);
        if hit_x {
            vx = -vx * self.bounce;
        } else {
            x = proposal.x;
        }

        let hit_y = self.is_blocked(maze, x, proposal.y);
        if hit_y {
            vy = -vy * self.bounce;
        } else {
            y = proposal.y;
        }

        if hit_x || hit_y {
            debug!("bounce at ({}, {}) x={} y={}", x, y, hit_x, hit_y);
        }

        Resolution {
            x,
            y,
            vx,
            vy,
            hit_x,
            hit_y,
        }
    }

    /// Resolve a proposal against `ball` and commit the result in place.
    pub fn apply(&self, maze: &MazeGrid<'_>, ball: &mut BallState, proposal: Proposal) -> Resolution {
        let r = self.resolve(maze, (ball.x, ball.y), proposal, (ball.vx, ball.vy));
        ball.x = r.x;
        ball.y = r.y;
        ball.vx = r.vx;
        ball.vy = r.vy;
        r
    }
}

/// True iff the tile under the ball centre is the goal.
pub fn is_win(maze: &MazeGrid<'_>, x: f32, y: f32) -> bool {
    matches!(maze.tile_at(x, y), Some(Tile::Goal))
}
