//! Raw counts to physical units, plus a few attitude helpers.

use crate::mpu6050::{AccelScale, GyroScale, RawSample};

// Datasheet temperature transfer function.
const TEMP_LSB_PER_DEG: f32 = 340.0;
const TEMP_OFFSET_DEG: f32 = 36.53;

/// Sample in g, degrees/second and degrees Celsius.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct PhysicalSample {
    pub accel: [f32; 3],
    pub gyro: [f32; 3],
    pub temperature_c: f32,
}

impl PhysicalSample {
    pub fn accel_x(&self) -> f32 {
        self.accel[0]
    }

    pub fn accel_y(&self) -> f32 {
        self.accel[1]
    }

    pub fn accel_z(&self) -> f32 {
        self.accel[2]
    }
}

pub fn to_physical(raw: &RawSample, accel: AccelScale, gyro: GyroScale) -> PhysicalSample {
    let a = accel.lsb_per_g();
    let g = gyro.lsb_per_dps();
    PhysicalSample {
        accel: raw.accel.map(|v| v as f32 / a),
        gyro: raw.gyro.map(|v| v as f32 / g),
        temperature_c: raw_to_celsius(raw.temperature),
    }
}

#[inline]
pub fn raw_to_celsius(raw: i16) -> f32 {
    raw as f32 / TEMP_LSB_PER_DEG + TEMP_OFFSET_DEG
}

/// Forward/back tilt in degrees.
pub fn pitch_deg(ax: f32, ay: f32, az: f32) -> f32 {
    libm::atan2f(-ax, libm::sqrtf(ay * ay + az * az)).to_degrees()
}

/// Sideways tilt in degrees.
pub fn roll_deg(_ax: f32, ay: f32, az: f32) -> f32 {
    libm::atan2f(ay, az).to_degrees()
}

pub fn magnitude(x: f32, y: f32, z: f32) -> f32 {
    libm::sqrtf(x * x + y * y + z * z)
}
