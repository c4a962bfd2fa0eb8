//! MPU-6050 bring-up, sample acquisition and bias offsets.
//! Register values follow the datasheet defaults used by the maze firmware:
//! +/-2g, +/-250 dps, 44 Hz digital low-pass filter.

use embedded_hal::delay::DelayNs;
use log::info;

use crate::transport::{RegisterTransport, TransportError};

pub const DEFAULT_I2C_ADDR: u8 = 0x68; // AD0 pulled low

const REG_CONFIG: u8 = 0x1A; // DLPF_CFG in bits 0..2
const REG_GYRO_CONFIG: u8 = 0x1B; // FS_SEL in bits 3..4
const REG_ACCEL_CONFIG: u8 = 0x1C; // AFS_SEL in bits 3..4
const REG_ACCEL_XOUT_H: u8 = 0x3B; // AX_H .. GZ_L, 14 bytes
const REG_TEMP_OUT_H: u8 = 0x41;
const REG_GYRO_XOUT_H: u8 = 0x43;
const REG_PWR_MGMT_1: u8 = 0x6B;
const REG_PWR_MGMT_2: u8 = 0x6C;
const REG_WHO_AM_I: u8 = 0x75;

const PWR1_DEVICE_RESET: u8 = 0x80;
const PWR1_SLEEP: u8 = 0x40;
const RESET_SETTLE_MS: u32 = 100;
const WAKE_SETTLE_MS: u32 = 10;

// Genuine parts answer 0x68; a common clone family answers 0x70.
const WHO_AM_I_MPU6050: u8 = 0x68;
const WHO_AM_I_ALT: u8 = 0x70;

/// Size of the accel + temperature + gyro data block.
pub const SAMPLE_BLOCK_LEN: usize = 14;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AccelScale {
    #[default]
    G2 = 0,
    G4 = 1,
    G8 = 2,
    G16 = 3,
}

impl AccelScale {
    pub const ALL: [AccelScale; 4] = [AccelScale::G2, AccelScale::G4, AccelScale::G8, AccelScale::G16];

    /// Raw counts per 1g.
    pub const fn lsb_per_g(self) -> f32 {
        match self {
            AccelScale::G2 => 16384.0,
            AccelScale::G4 => 8192.0,
            AccelScale::G8 => 4096.0,
            AccelScale::G16 => 2048.0,
        }
    }

    // AFS_SEL lives in bits 3..4
    pub const fn register_bits(self) -> u8 {
        (self as u8) << 3
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum GyroScale {
    #[default]
    Dps250 = 0,
    Dps500 = 1,
    Dps1000 = 2,
    Dps2000 = 3,
}

impl GyroScale {
    pub const ALL: [GyroScale; 4] = [
        GyroScale::Dps250,
        GyroScale::Dps500,
        GyroScale::Dps1000,
        GyroScale::Dps2000,
    ];

    /// Raw counts per degree/second.
    pub const fn lsb_per_dps(self) -> f32 {
        match self {
            GyroScale::Dps250 => 131.0,
            GyroScale::Dps500 => 65.5,
            GyroScale::Dps1000 => 32.8,
            GyroScale::Dps2000 => 16.4,
        }
    }

    pub const fn register_bits(self) -> u8 {
        (self as u8) << 3
    }
}

/// Digital low-pass filter bandwidth (accelerometer side of DLPF_CFG).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DlpfBandwidth {
    Hz260 = 0,
    Hz184 = 1,
    Hz94 = 2,
    #[default]
    Hz44 = 3,
    Hz21 = 4,
    Hz10 = 5,
    Hz5 = 6,
}

/// Scale and filter selection applied at bring-up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct SensorSettings {
    pub accel_scale: AccelScale,
    pub gyro_scale: GyroScale,
    pub dlpf: DlpfBandwidth,
}

/// Per-axis bias in raw counts, subtracted from every motion reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct SensorOffsets {
    pub accel: [i16; 3],
    pub gyro: [i16; 3],
}

impl SensorOffsets {
    pub const ZERO: SensorOffsets = SensorOffsets {
        accel: [0; 3],
        gyro: [0; 3],
    };
}

/// One coherent reading, offsets already removed from accel and gyro.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct RawSample {
    pub accel: [i16; 3],
    pub temperature: i16,
    pub gyro: [i16; 3],
}

impl RawSample {
    /// Decode the 14-byte data block (big-endian on the wire).
    pub fn from_block(buf: &[u8; SAMPLE_BLOCK_LEN]) -> Self {
        let word = |i: usize| i16::from_be_bytes([buf[i], buf[i + 1]]);
        Self {
            accel: [word(0), word(2), word(4)],
            temperature: word(6),
            gyro: [word(8), word(10), word(12)],
        }
    }
}

#[inline]
fn sub_offsets(values: [i16; 3], offsets: [i16; 3]) -> [i16; 3] {
    [
        values[0].wrapping_sub(offsets[0]),
        values[1].wrapping_sub(offsets[1]),
        values[2].wrapping_sub(offsets[2]),
    ]
}

#[inline]
fn be_triplet(buf: &[u8; 6]) -> [i16; 3] {
    [
        i16::from_be_bytes([buf[0], buf[1]]),
        i16::from_be_bytes([buf[2], buf[3]]),
        i16::from_be_bytes([buf[4], buf[5]]),
    ]
}

// IMU error type, returned by bring-up
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImuError {
    Transport(TransportError),
    BadWhoAmI(u8),
}

// Allow `?` on transport calls
impl From<TransportError> for ImuError {
    fn from(e: TransportError) -> Self {
        ImuError::Transport(e)
    }
}

// MPU-6050 driver
pub struct Mpu6050<T> {
    transport: T,
    settings: SensorSettings,
    offsets: SensorOffsets,
}

impl<T> Mpu6050<T>
where
    T: RegisterTransport,
{
    /// Identify, reset and configure the sensor. Offsets start zeroed.
    pub fn new(
        transport: T,
        delay: &mut impl DelayNs,
        settings: SensorSettings,
    ) -> Result<Self, ImuError> {
        let mut this = Self {
            transport,
            settings,
            offsets: SensorOffsets::ZERO,
        };
        this.init(delay)?;
        Ok(this)
    }

    // Read WHO_AM_I register
    pub fn who_am_i(&mut self) -> Result<u8, TransportError> {
        self.transport.read_register(REG_WHO_AM_I)
    }

    /// True when the sensor answers with one of the known identities.
    pub fn test_connection(&mut self) -> Result<bool, TransportError> {
        let who = self.who_am_i()?;
        Ok(who == WHO_AM_I_MPU6050 || who == WHO_AM_I_ALT)
    }

    fn init(&mut self, delay: &mut impl DelayNs) -> Result<(), ImuError> {
        let who = self.who_am_i()?;
        if who != WHO_AM_I_MPU6050 && who != WHO_AM_I_ALT {
            return Err(ImuError::BadWhoAmI(who));
        }

        // Full device reset, then wake on the internal oscillator.
        self.transport.write_register(REG_PWR_MGMT_1, PWR1_DEVICE_RESET)?;
        delay.delay_ms(RESET_SETTLE_MS);
        self.transport.write_register(REG_PWR_MGMT_1, 0x00)?;
        delay.delay_ms(WAKE_SETTLE_MS);

        // Enable every accel and gyro axis.
        self.transport.write_register(REG_PWR_MGMT_2, 0x00)?;

        let SensorSettings {
            accel_scale,
            gyro_scale,
            dlpf,
        } = self.settings;
        self.set_accel_scale(accel_scale)?;
        self.set_gyro_scale(gyro_scale)?;
        self.set_dlpf(dlpf)?;

        self.offsets = SensorOffsets::ZERO;
        info!(
            "MPU-6050 ready (who=0x{:02X}, {:?}, {:?}, {:?})",
            who, accel_scale, gyro_scale, dlpf
        );
        Ok(())
    }

    pub fn set_accel_scale(&mut self, scale: AccelScale) -> Result<(), TransportError> {
        self.transport
            .write_register(REG_ACCEL_CONFIG, scale.register_bits())?;
        self.settings.accel_scale = scale;
        Ok(())
    }

    pub fn set_gyro_scale(&mut self, scale: GyroScale) -> Result<(), TransportError> {
        self.transport
            .write_register(REG_GYRO_CONFIG, scale.register_bits())?;
        self.settings.gyro_scale = scale;
        Ok(())
    }

    pub fn set_dlpf(&mut self, dlpf: DlpfBandwidth) -> Result<(), TransportError> {
        self.transport.write_register(REG_CONFIG, dlpf as u8)?;
        self.settings.dlpf = dlpf;
        Ok(())
    }

    pub fn settings(&self) -> SensorSettings {
        self.settings
    }

    pub fn accel_scale(&self) -> AccelScale {
        self.settings.accel_scale
    }

    pub fn gyro_scale(&self) -> GyroScale {
        self.settings.gyro_scale
    }

    pub fn offsets(&self) -> SensorOffsets {
        self.offsets
    }

    pub fn set_offsets(&mut self, offsets: SensorOffsets) {
        self.offsets = offsets;
    }

    /// Read all seven channels in one burst so they belong to the same
    /// sampling instant, then remove the stored offsets.
    pub fn acquire(&mut self) -> Result<RawSample, TransportError> {
        let mut buf = [0u8; SAMPLE_BLOCK_LEN];
        self.transport.read_registers(REG_ACCEL_XOUT_H, &mut buf)?;

        let mut sample = RawSample::from_block(&buf);
        sample.accel = sub_offsets(sample.accel, self.offsets.accel);
        sample.gyro = sub_offsets(sample.gyro, self.offsets.gyro);
        Ok(sample)
    }

    pub fn read_accel_raw(&mut self) -> Result<[i16; 3], TransportError> {
        let mut buf = [0u8; 6];
        self.transport.read_registers(REG_ACCEL_XOUT_H, &mut buf)?;
        Ok(sub_offsets(be_triplet(&buf), self.offsets.accel))
    }

    pub fn read_gyro_raw(&mut self) -> Result<[i16; 3], TransportError> {
        let mut buf = [0u8; 6];
        self.transport.read_registers(REG_GYRO_XOUT_H, &mut buf)?;
        Ok(sub_offsets(be_triplet(&buf), self.offsets.gyro))
    }

    pub fn read_temperature_raw(&mut self) -> Result<i16, TransportError> {
        let mut buf = [0u8; 2];
        self.transport.read_registers(REG_TEMP_OUT_H, &mut buf)?;
        Ok(i16::from_be_bytes(buf))
    }

    /// Put the sensor to sleep and hand the transport back.
    /// A failed sleep write is reported but the transport is returned either way.
    pub fn shutdown(mut self) -> (T, Result<(), TransportError>) {
        let res = self.transport.write_register(REG_PWR_MGMT_1, PWR1_SLEEP);
        (self.transport, res)
    }

    // Consume the driver and return the underlying transport
    pub fn into_inner(self) -> T {
        self.transport
    }
}

#[cfg(test)]
impl<T> Mpu6050<T> {
    pub(crate) fn transport_for_test(&mut self) -> &mut T {
        &mut self.transport
    }
}
