#![cfg_attr(not(test), no_std)]

pub mod calibration;
pub mod collision;
pub mod config;
pub mod convert;
pub mod game;
pub mod input;
pub mod maze;
pub mod mpu6050;
pub mod physics;
pub mod transport;
pub mod ui;

#[cfg(feature = "board")]
pub mod display;
#[cfg(feature = "board")]
pub mod wiring;

#[cfg(test)]
pub(crate) mod testing;
