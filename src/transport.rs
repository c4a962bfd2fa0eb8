//! Register-level transport for the inertial sensor.
//!
//! The sensor driver only ever needs "write one register" and "read N
//! consecutive registers". `RegisterTransport` captures exactly that, so the
//! driver can sit on an I2C bus, a test double, or anything else that moves
//! bytes. Every call is fallible and bounded: an implementation that cannot
//! finish a transfer in time must return `TransportError::Timeout` instead of
//! blocking the control loop.

use embedded_hal::i2c::{self, ErrorKind};

/// Why a register transfer did not complete.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportError {
    /// The bus reported a failure (NACK, arbitration loss, short transfer...).
    Bus(ErrorKind),
    /// The transfer did not complete within the bus timeout.
    Timeout,
}

pub trait RegisterTransport {
    /// Write a single register.
    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), TransportError>;

    /// Read `buf.len()` consecutive registers starting at `reg`, in a single
    /// transaction.
    fn read_registers(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), TransportError>;

    /// Read a single register.
    fn read_register(&mut self, reg: u8) -> Result<u8, TransportError> {
        let mut out = [0u8];
        self.read_registers(reg, &mut out)?;
        Ok(out[0])
    }
}

impl<T: RegisterTransport + ?Sized> RegisterTransport for &mut T {
    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), TransportError> {
        (**self).write_register(reg, value)
    }

    fn read_registers(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), TransportError> {
        (**self).read_registers(reg, buf)
    }
}

// Default error classification: everything the bus reports is a bus error.
fn classify_by_kind<E: i2c::Error>(e: &E) -> TransportError {
    TransportError::Bus(e.kind())
}

/// `RegisterTransport` over any embedded-hal 1.0 I2C bus.
///
/// HAL error types that carry a timeout variant can be mapped onto
/// `TransportError::Timeout` with [`I2cTransport::with_classifier`].
pub struct I2cTransport<I2C: i2c::ErrorType> {
    i2c: I2C,
    address: u8,
    classify: fn(&I2C::Error) -> TransportError,
}

impl<I2C> I2cTransport<I2C>
where
    I2C: i2c::I2c,
{
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            classify: classify_by_kind::<I2C::Error>,
        }
    }

    pub fn with_classifier(mut self, classify: fn(&I2C::Error) -> TransportError) -> Self {
        self.classify = classify;
        self
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    // Consume the transport and return the underlying I2C bus
    pub fn into_inner(self) -> I2C {
        self.i2c
    }
}

impl<I2C> RegisterTransport for I2cTransport<I2C>
where
    I2C: i2c::I2c,
{
    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), TransportError> {
        let classify = self.classify;
        self.i2c
            .write(self.address, &[reg, value])
            .map_err(|e| classify(&e))
    }

    fn read_registers(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), TransportError> {
        let classify = self.classify;
        self.i2c
            .write_read(self.address, &[reg], buf)
            .map_err(|e| classify(&e))
    }
}
