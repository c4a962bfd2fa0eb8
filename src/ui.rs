//! Frame rendering.
//!
//! This module provides:
//! - `Theme`, the two colours every screen is drawn with
//! - `render`, which draws a `Scene` for the current phase
//! - the individual screens (maze, win, calibrating, sensor fault)
//!
//! Everything is drawn in canvas coordinates, (0,0) top-left. On a larger
//! panel wrap the target with `DrawTargetExt::translated(canvas_offset(..))`.

use core::fmt::Write;

use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    pixelcolor::{BinaryColor, Rgb565},
    prelude::*,
    primitives::{Circle, PrimitiveStyle, Rectangle},
    text::{Alignment, Baseline, Text, TextStyle, TextStyleBuilder},
};
use heapless::String;

use crate::collision::Canvas;
use crate::game::{Phase, Scene, TickStats};
use crate::maze::{MazeGrid, Tile};
use crate::mpu6050::ImuError;
use crate::physics::BallState;
use crate::transport::TransportError;

// Goal marker inset from the tile edge.
const GOAL_INSET: i32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Theme<C> {
    pub fg: C,
    pub bg: C,
}

impl Theme<BinaryColor> {
    pub const MONO: Self = Self {
        fg: BinaryColor::On,
        bg: BinaryColor::Off,
    };
}

impl Theme<Rgb565> {
    pub const PANEL: Self = Self {
        fg: Rgb565::WHITE,
        bg: Rgb565::BLACK,
    };
}

/// Top-left corner that centres `canvas` on a panel of `panel` pixels.
pub fn canvas_offset(panel: Size, canvas: Canvas) -> Point {
    Point::new(
        (panel.width as i32 - canvas.width as i32) / 2,
        (panel.height as i32 - canvas.height as i32) / 2,
    )
}

fn canvas_rect(canvas: Canvas) -> Rectangle {
    Rectangle::new(
        Point::zero(),
        Size::new(canvas.width as u32, canvas.height as u32),
    )
}

fn centered() -> TextStyle {
    TextStyleBuilder::new()
        .alignment(Alignment::Center)
        .baseline(Baseline::Top)
        .build()
}

pub fn render<D, C>(target: &mut D, scene: &Scene<'_, '_>, theme: &Theme<C>) -> Result<(), D::Error>
where
    D: DrawTarget<Color = C>,
    C: PixelColor,
{
    match scene.phase {
        Phase::Calibrating => draw_calibrating(target, scene.canvas, theme),
        Phase::Playing => {
            target.fill_solid(&canvas_rect(scene.canvas), theme.bg)?;
            draw_maze(target, scene.maze, theme)?;
            draw_ball(target, scene.ball, scene.radius, theme)
        }
        Phase::Won => draw_win(target, scene.canvas, &scene.stats, theme),
    }
}

/// Walls as filled tiles, the goal as a small outlined square.
pub fn draw_maze<D, C>(target: &mut D, maze: &MazeGrid<'_>, theme: &Theme<C>) -> Result<(), D::Error>
where
    D: DrawTarget<Color = C>,
    C: PixelColor,
{
    let t = maze.tile_size() as i32;
    let wall = PrimitiveStyle::with_fill(theme.fg);
    let goal = PrimitiveStyle::with_stroke(theme.fg, 1);

    for (col, row, tile) in maze.tiles() {
        let origin = Point::new(col as i32 * t, row as i32 * t);
        match tile {
            Tile::Wall => {
                Rectangle::new(origin, Size::new(t as u32, t as u32))
                    .into_styled(wall)
                    .draw(target)?;
            }
            Tile::Goal => {
                let side = (t - 2 * GOAL_INSET).max(1) as u32;
                Rectangle::new(origin + Point::new(GOAL_INSET, GOAL_INSET), Size::new(side, side))
                    .into_styled(goal)
                    .draw(target)?;
            }
            Tile::Open => {}
        }
    }
    Ok(())
}

pub fn draw_ball<D, C>(
    target: &mut D,
    ball: &BallState,
    radius: f32,
    theme: &Theme<C>,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = C>,
    C: PixelColor,
{
    let diameter = (radius * 2.0) as u32 + 1;
    Circle::with_center(Point::new(ball.x as i32, ball.y as i32), diameter)
        .into_styled(PrimitiveStyle::with_fill(theme.fg))
        .draw(target)?;
    Ok(())
}

pub fn ticks_line(stats: &TickStats) -> String<40> {
    let mut s = String::new();
    write!(s, "TICKS {}", stats.play_ticks).ok();
    if stats.skipped_ticks > 0 {
        write!(s, " ({} LOST)", stats.skipped_ticks).ok();
    }
    s
}

pub fn draw_win<D, C>(
    target: &mut D,
    canvas: Canvas,
    stats: &TickStats,
    theme: &Theme<C>,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = C>,
    C: PixelColor,
{
    target.fill_solid(&canvas_rect(canvas), theme.bg)?;
    let style = MonoTextStyle::new(&FONT_6X10, theme.fg);
    let mid = canvas.width as i32 / 2;

    Text::with_text_style("YOU WIN!", Point::new(mid, 6), style, centered()).draw(target)?;
    Text::with_text_style(ticks_line(stats).as_str(), Point::new(mid, 20), style, centered())
        .draw(target)?;
    Text::with_text_style("B: NEW GAME", Point::new(mid, 38), style, centered()).draw(target)?;
    Text::with_text_style("A: EXIT", Point::new(mid, 50), style, centered()).draw(target)?;
    Ok(())
}

pub fn draw_calibrating<D, C>(target: &mut D, canvas: Canvas, theme: &Theme<C>) -> Result<(), D::Error>
where
    D: DrawTarget<Color = C>,
    C: PixelColor,
{
    target.fill_solid(&canvas_rect(canvas), theme.bg)?;
    let style = MonoTextStyle::new(&FONT_6X10, theme.fg);
    let mid = canvas.width as i32 / 2;
    Text::with_text_style("CALIBRATING", Point::new(mid, 20), style, centered()).draw(target)?;
    Text::with_text_style("KEEP STILL", Point::new(mid, 34), style, centered()).draw(target)?;
    Ok(())
}

/// Short description of an init failure, for the fault screen.
pub fn fault_detail(err: &ImuError) -> String<24> {
    let mut s = String::new();
    match err {
        ImuError::BadWhoAmI(id) => write!(s, "WHO_AM_I 0x{:02X}", id).ok(),
        ImuError::Transport(TransportError::Timeout) => s.push_str("BUS TIMEOUT").ok(),
        ImuError::Transport(TransportError::Bus(_)) => s.push_str("BUS ERROR").ok(),
    };
    s
}

/// Persistent screen shown when the sensor never came up.
pub fn draw_fault<D, C>(
    target: &mut D,
    canvas: Canvas,
    err: &ImuError,
    theme: &Theme<C>,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = C>,
    C: PixelColor,
{
    target.fill_solid(&canvas_rect(canvas), theme.bg)?;
    let style = MonoTextStyle::new(&FONT_6X10, theme.fg);
    let mid = canvas.width as i32 / 2;
    Text::with_text_style("MPU6050 FAILED", Point::new(mid, 16), style, centered()).draw(target)?;
    Text::with_text_style(fault_detail(err).as_str(), Point::new(mid, 32), style, centered())
        .draw(target)?;
    Ok(())
}
