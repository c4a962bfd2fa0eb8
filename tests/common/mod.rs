// Shared fake MPU-6050 for the integration tests. The handle is cloneable so a
// test can keep steering the sensor after handing it to the game.
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use tilt_maze::mpu6050::RawSample;
use tilt_maze::transport::{RegisterTransport, TransportError};

pub const ONE_G: i16 = 16384;

const REG_ACCEL_XOUT_H: u8 = 0x3B;
const REG_WHO_AM_I: u8 = 0x75;

pub struct NoopDelay;

impl DelayNs for NoopDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

struct State {
    who_am_i: u8,
    sample: RawSample,
    writes: Vec<(u8, u8)>,
    reads: u32,
    fail_reads: u32,
}

#[derive(Clone)]
pub struct SharedImu(Rc<RefCell<State>>);

impl SharedImu {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(State {
            who_am_i: 0x68,
            sample: RawSample::default(),
            writes: Vec::new(),
            reads: 0,
            fail_reads: 0,
        })))
    }

    pub fn set_who_am_i(&self, who: u8) {
        self.0.borrow_mut().who_am_i = who;
    }

    pub fn set_sample(&self, sample: RawSample) {
        self.0.borrow_mut().sample = sample;
    }

    /// Sensor lying flat with an optional tilt, in raw counts on the 2g range.
    pub fn tilt(&self, ax: i16, ay: i16) {
        self.set_sample(RawSample {
            accel: [ax, ay, ONE_G],
            ..Default::default()
        });
    }

    pub fn fail_next_reads(&self, n: u32) {
        self.0.borrow_mut().fail_reads = n;
    }

    pub fn writes(&self) -> Vec<(u8, u8)> {
        self.0.borrow().writes.clone()
    }

    pub fn reads(&self) -> u32 {
        self.0.borrow().reads
    }
}

impl RegisterTransport for SharedImu {
    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), TransportError> {
        self.0.borrow_mut().writes.push((reg, value));
        Ok(())
    }

    fn read_registers(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), TransportError> {
        let mut st = self.0.borrow_mut();
        if reg == REG_WHO_AM_I {
            buf[0] = st.who_am_i;
            return Ok(());
        }
        st.reads += 1;
        if st.fail_reads > 0 {
            st.fail_reads -= 1;
            return Err(TransportError::Timeout);
        }

        let s = st.sample;
        let words = [
            s.accel[0],
            s.accel[1],
            s.accel[2],
            s.temperature,
            s.gyro[0],
            s.gyro[1],
            s.gyro[2],
        ];
        let mut block = [0u8; 14];
        for (i, w) in words.iter().enumerate() {
            block[i * 2..i * 2 + 2].copy_from_slice(&w.to_be_bytes());
        }
        let start = (reg - REG_ACCEL_XOUT_H) as usize;
        buf.copy_from_slice(&block[start..start + buf.len()]);
        Ok(())
    }
}
