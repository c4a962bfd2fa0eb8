// Scripted MPU-6050 stand-in shared by the unit tests.

use std::collections::VecDeque;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;

use crate::mpu6050::{RawSample, SAMPLE_BLOCK_LEN};
use crate::transport::{RegisterTransport, TransportError};

const REG_ACCEL_XOUT_H: u8 = 0x3B;
const REG_WHO_AM_I: u8 = 0x75;

pub struct NoopDelay;

impl DelayNs for NoopDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

pub struct FakeImu {
    who_am_i: u8,
    sample: RawSample,
    queued: VecDeque<RawSample>,
    writes: Vec<(u8, u8)>,
    block_reads: u32,
    fail_all: Option<TransportError>,
    fail_next: u32,
    fail_err: TransportError,
    fail_when: Option<fn(u32) -> bool>,
}

impl FakeImu {
    pub fn new() -> Self {
        Self {
            who_am_i: 0x68,
            sample: RawSample::default(),
            queued: VecDeque::new(),
            writes: Vec::new(),
            block_reads: 0,
            fail_all: None,
            fail_next: 0,
            fail_err: TransportError::Timeout,
            fail_when: None,
        }
    }

    pub fn set_who_am_i(&mut self, who: u8) {
        self.who_am_i = who;
    }

    /// Sample returned whenever the queue is empty.
    pub fn set_sample(&mut self, sample: RawSample) {
        self.sample = sample;
    }

    pub fn push_sample(&mut self, sample: RawSample) {
        self.queued.push_back(sample);
    }

    pub fn fail_all(&mut self, err: TransportError) {
        self.fail_all = Some(err);
    }

    pub fn fail_next_reads(&mut self, n: u32, err: TransportError) {
        self.fail_next = n;
        self.fail_err = err;
    }

    /// Fail data reads whose zero-based index satisfies `pred`.
    pub fn fail_reads_when(&mut self, pred: fn(u32) -> bool) {
        self.fail_when = Some(pred);
    }

    pub fn writes(&self) -> &[(u8, u8)] {
        &self.writes
    }

    pub fn block_reads(&self) -> u32 {
        self.block_reads
    }

    fn block(&mut self) -> [u8; SAMPLE_BLOCK_LEN] {
        let s = self.queued.pop_front().unwrap_or(self.sample);
        let mut out = [0u8; SAMPLE_BLOCK_LEN];
        let words = [
            s.accel[0],
            s.accel[1],
            s.accel[2],
            s.temperature,
            s.gyro[0],
            s.gyro[1],
            s.gyro[2],
        ];
        for (i, w) in words.iter().enumerate() {
            out[i * 2..i * 2 + 2].copy_from_slice(&w.to_be_bytes());
        }
        out
    }
}

impl RegisterTransport for FakeImu {
    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), TransportError> {
        if let Some(e) = self.fail_all {
            return Err(e);
        }
        self.writes.push((reg, value));
        Ok(())
    }

    fn read_registers(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), TransportError> {
        if let Some(e) = self.fail_all {
            return Err(e);
        }
        if reg == REG_WHO_AM_I {
            buf[0] = self.who_am_i;
            return Ok(());
        }

        let index = self.block_reads;
        self.block_reads += 1;
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(self.fail_err);
        }
        if self.fail_when.is_some_and(|pred| pred(index)) {
            return Err(self.fail_err);
        }

        let block = self.block();
        let start = (reg - REG_ACCEL_XOUT_H) as usize;
        buf.copy_from_slice(&block[start..start + buf.len()]);
        Ok(())
    }
}
