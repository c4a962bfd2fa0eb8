//! Static bias calibration.
//!
//! With the device lying still, every accel and gyro axis should read zero
//! except the axis facing up, which should read exactly +1g. Averaging a few
//! hundred samples against that expectation gives the per-axis offsets the
//! driver then subtracts from every reading.

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::mpu6050::{Mpu6050, SensorOffsets};
use crate::transport::RegisterTransport;

pub const DEFAULT_SAMPLES: u32 = 1000;
// Keeps us below the sensor's output rate with the 44 Hz filter.
pub const DEFAULT_INTERVAL_MS: u32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Axis {
    X = 0,
    Y = 1,
    #[default]
    Z = 2,
}

/// What the accumulated sums are divided by when some reads failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DivisorPolicy {
    /// Divide by the requested sample count. Failed reads pull the offsets
    /// towards zero.
    #[default]
    Requested,
    /// Divide by the number of reads that actually succeeded.
    Successful,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CalibrationConfig {
    /// Requested sample count; zero falls back to `DEFAULT_SAMPLES`.
    pub samples: u32,
    pub interval_ms: u32,
    /// Axis expected to see +1g while resting.
    pub up_axis: Axis,
    pub divisor: DivisorPolicy,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            samples: DEFAULT_SAMPLES,
            interval_ms: DEFAULT_INTERVAL_MS,
            up_axis: Axis::Z,
            divisor: DivisorPolicy::Requested,
        }
    }
}

impl CalibrationConfig {
    pub fn effective_samples(&self) -> u32 {
        if self.samples == 0 {
            DEFAULT_SAMPLES
        } else {
            self.samples
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CalibrationReport {
    pub offsets: SensorOffsets,
    pub requested: u32,
    pub successful: u32,
}

impl CalibrationReport {
    pub fn failed(&self) -> u32 {
        self.requested - self.successful
    }
}

// Sums wide enough for i16::MAX * u32::MAX samples.
#[derive(Default)]
struct Accumulator {
    accel: [i64; 3],
    gyro: [i64; 3],
}

impl Accumulator {
    fn mean(&self, divisor: i64) -> SensorOffsets {
        let avg = |sum: i64| -> i16 {
            if divisor == 0 {
                return 0;
            }
            // Integer division truncates toward zero.
            (sum / divisor).clamp(i16::MIN as i64, i16::MAX as i64) as i16
        };
        SensorOffsets {
            accel: self.accel.map(avg),
            gyro: self.gyro.map(avg),
        }
    }
}

/// Estimate and install bias offsets. Transport failures only cost
/// precision: the sample is skipped and the loop carries on.
pub fn calibrate<T: RegisterTransport>(
    imu: &mut Mpu6050<T>,
    delay: &mut impl DelayNs,
    config: &CalibrationConfig,
) -> CalibrationReport {
    let requested = config.effective_samples();
    let one_g = imu.accel_scale().lsb_per_g() as i64;
    let up = config.up_axis as usize;

    // Measure against the bare sensor, not the previous calibration.
    imu.set_offsets(SensorOffsets::ZERO);

    let mut acc = Accumulator::default();
    let mut successful = 0u32;
    for _ in 0..requested {
        match imu.acquire() {
            Ok(raw) => {
                for i in 0..3 {
                    let mut a = raw.accel[i] as i64;
                    if i == up {
                        a -= one_g;
                    }
                    acc.accel[i] += a;
                    acc.gyro[i] += raw.gyro[i] as i64;
                }
                successful += 1;
            }
            Err(e) => debug!("calibration sample dropped: {:?}", e),
        }
        delay.delay_ms(config.interval_ms);
    }

    let divisor = match config.divisor {
        DivisorPolicy::Requested => requested,
        DivisorPolicy::Successful => successful,
    };
    let offsets = acc.mean(divisor as i64);
    imu.set_offsets(offsets);

    if successful < requested {
        warn!(
            "calibration used {}/{} samples ({:?} divisor)",
            successful, requested, config.divisor
        );
    }
    info!(
        "calibrated: accel {:?} gyro {:?}",
        offsets.accel, offsets.gyro
    );

    CalibrationReport {
        offsets,
        requested,
        successful,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mpu6050::{AccelScale, GyroScale, RawSample, SensorSettings};
    use crate::testing::{FakeImu, NoopDelay};
    use crate::transport::TransportError;

    const BIAS_ACCEL: [i16; 3] = [120, -340, 75];
    const BIAS_GYRO: [i16; 3] = [-18, 42, 7];

    // Deterministic noise in [-amp, amp].
    struct Lcg(u32);

    impl Lcg {
        fn noise(&mut self, amp: i16) -> i16 {
            self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let span = (2 * amp + 1) as u32;
            ((self.0 >> 8) % span) as i16 - amp
        }
    }

    fn resting_imu(settings: SensorSettings, samples: usize) -> Mpu6050<FakeImu> {
        let one_g = settings.accel_scale.lsb_per_g() as i16;
        let mut fake = FakeImu::new();
        let mut rng = Lcg(7);
        for _ in 0..samples {
            fake.push_sample(RawSample {
                accel: [
                    BIAS_ACCEL[0] + rng.noise(40),
                    BIAS_ACCEL[1] + rng.noise(40),
                    one_g + BIAS_ACCEL[2] + rng.noise(40),
                ],
                temperature: 0,
                gyro: [
                    BIAS_GYRO[0] + rng.noise(5),
                    BIAS_GYRO[1] + rng.noise(5),
                    BIAS_GYRO[2] + rng.noise(5),
                ],
            });
        }
        Mpu6050::new(fake, &mut NoopDelay, settings).unwrap()
    }

    fn within(actual: [i16; 3], expected: [i16; 3], tol: i16) -> bool {
        actual
            .iter()
            .zip(expected.iter())
            .all(|(a, e)| (a - e).abs() <= tol)
    }

    #[test]
    fn converges_on_true_bias() {
        let mut imu = resting_imu(SensorSettings::default(), 600);
        let cfg = CalibrationConfig {
            samples: 600,
            ..Default::default()
        };
        let report = calibrate(&mut imu, &mut NoopDelay, &cfg);

        assert_eq!(report.successful, 600);
        assert!(within(report.offsets.accel, BIAS_ACCEL, 6), "{:?}", report);
        assert!(within(report.offsets.gyro, BIAS_GYRO, 2), "{:?}", report);
        assert_eq!(imu.offsets(), report.offsets);
    }

    #[test]
    fn one_g_reference_follows_accel_range() {
        let settings = SensorSettings {
            accel_scale: AccelScale::G8,
            gyro_scale: GyroScale::Dps500,
            ..Default::default()
        };
        let mut imu = resting_imu(settings, 500);
        let cfg = CalibrationConfig {
            samples: 500,
            ..Default::default()
        };
        let report = calibrate(&mut imu, &mut NoopDelay, &cfg);
        assert!(within(report.offsets.accel, BIAS_ACCEL, 6), "{:?}", report);
    }

    #[test]
    fn calibrated_reading_shows_one_g_up() {
        let mut imu = resting_imu(SensorSettings::default(), 500);
        let cfg = CalibrationConfig {
            samples: 500,
            ..Default::default()
        };
        calibrate(&mut imu, &mut NoopDelay, &cfg);

        imu.transport_for_test().set_sample(RawSample {
            accel: [BIAS_ACCEL[0], BIAS_ACCEL[1], 16_384 + BIAS_ACCEL[2]],
            temperature: 0,
            gyro: BIAS_GYRO,
        });
        let s = imu.acquire().unwrap();
        assert!(within(s.accel, [0, 0, 16_384], 6), "{:?}", s);
        assert!(within(s.gyro, [0, 0, 0], 2), "{:?}", s);
    }

    #[test]
    fn previous_offsets_do_not_leak_into_new_estimate() {
        let mut imu = resting_imu(SensorSettings::default(), 500);
        imu.set_offsets(SensorOffsets {
            accel: [1000, 1000, 1000],
            gyro: [1000, 1000, 1000],
        });
        let cfg = CalibrationConfig {
            samples: 500,
            ..Default::default()
        };
        let report = calibrate(&mut imu, &mut NoopDelay, &cfg);
        assert!(within(report.offsets.accel, BIAS_ACCEL, 6), "{:?}", report);
    }

    #[test]
    fn zero_request_uses_default_count() {
        let mut imu = resting_imu(SensorSettings::default(), 0);
        let cfg = CalibrationConfig {
            samples: 0,
            interval_ms: 0,
            ..Default::default()
        };
        let report = calibrate(&mut imu, &mut NoopDelay, &cfg);
        assert_eq!(report.requested, DEFAULT_SAMPLES);
        assert_eq!(imu.transport_for_test().block_reads(), DEFAULT_SAMPLES);
    }

    #[test]
    fn up_axis_is_selectable() {
        let mut fake = FakeImu::new();
        fake.set_sample(RawSample {
            accel: [16_384 + 50, 0, 0],
            ..Default::default()
        });
        let mut imu = Mpu6050::new(fake, &mut NoopDelay, SensorSettings::default()).unwrap();
        let cfg = CalibrationConfig {
            samples: 10,
            up_axis: Axis::X,
            ..Default::default()
        };
        let report = calibrate(&mut imu, &mut NoopDelay, &cfg);
        assert_eq!(report.offsets.accel, [50, 0, 0]);
    }

    fn every_fourth(i: u32) -> bool {
        i % 4 == 3
    }

    fn biased_imu_with_dropouts() -> Mpu6050<FakeImu> {
        let mut fake = FakeImu::new();
        fake.set_sample(RawSample {
            accel: [400, -400, 16_384],
            temperature: 0,
            gyro: [80, 0, -80],
        });
        fake.fail_reads_when(every_fourth);
        Mpu6050::new(fake, &mut NoopDelay, SensorSettings::default()).unwrap()
    }

    #[test]
    fn requested_divisor_dilutes_offsets_on_dropouts() {
        let mut imu = biased_imu_with_dropouts();
        let cfg = CalibrationConfig {
            samples: 100,
            divisor: DivisorPolicy::Requested,
            ..Default::default()
        };
        let report = calibrate(&mut imu, &mut NoopDelay, &cfg);
        assert_eq!(report.successful, 75);
        assert_eq!(report.failed(), 25);
        assert_eq!(report.offsets.accel, [300, -300, 0]);
        assert_eq!(report.offsets.gyro, [60, 0, -60]);
    }

    #[test]
    fn successful_divisor_ignores_dropouts() {
        let mut imu = biased_imu_with_dropouts();
        let cfg = CalibrationConfig {
            samples: 100,
            divisor: DivisorPolicy::Successful,
            ..Default::default()
        };
        let report = calibrate(&mut imu, &mut NoopDelay, &cfg);
        assert_eq!(report.offsets.accel, [400, -400, 0]);
        assert_eq!(report.offsets.gyro, [80, 0, -80]);
    }

    #[test]
    fn total_dropout_leaves_zero_offsets() {
        let mut imu = Mpu6050::new(FakeImu::new(), &mut NoopDelay, SensorSettings::default()).unwrap();
        imu.transport_for_test()
            .fail_next_reads(u32::MAX, TransportError::Timeout);
        for divisor in [DivisorPolicy::Requested, DivisorPolicy::Successful] {
            let cfg = CalibrationConfig {
                samples: 20,
                divisor,
                ..Default::default()
            };
            let report = calibrate(&mut imu, &mut NoopDelay, &cfg);
            assert_eq!(report.successful, 0);
            assert_eq!(report.offsets, SensorOffsets::ZERO);
        }
    }

    #[test]
    fn mean_truncates_toward_zero() {
        let acc = Accumulator {
            accel: [7, -7, 0],
            gyro: [5, -5, 1],
        };
        let m = acc.mean(2);
        assert_eq!(m.accel, [3, -3, 0]);
        assert_eq!(m.gyro, [2, -2, 0]);
    }
}
