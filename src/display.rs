//! GC9A01 (240x240) panel bring-up through mipidsi.
//
// The game canvas is much smaller than the panel; callers draw through
// `DrawTargetExt::translated` with `ui::canvas_offset`.

use embedded_graphics::prelude::Size;
use embedded_hal::delay::DelayNs;
use embedded_hal_bus::spi::{ExclusiveDevice, NoDelay};
use esp_hal::{
    delay::Delay,
    gpio::Output,
    spi::master::{Config as SpiConfig, ConfigError, Spi},
    spi::Mode,
    time::Rate,
    Blocking,
};
use log::info;
use mipidsi::interface::SpiInterface;
use mipidsi::{
    models::GC9A01,
    options::{ColorInversion, ColorOrder, Orientation, Rotation},
    Builder as DisplayBuilder,
};

use crate::wiring::DisplayPins;

pub const PANEL_SIZE: Size = Size::new(240, 240);

pub type DisplayType<'a> = mipidsi::Display<
    SpiInterface<'a, ExclusiveDevice<Spi<'a, Blocking>, Output<'a>, NoDelay>, Output<'a>>,
    GC9A01,
    Output<'a>,
>;

#[derive(Debug)]
pub enum DisplayError {
    Spi(ConfigError),
    ChipSelect,
    Init,
}

impl From<ConfigError> for DisplayError {
    fn from(e: ConfigError) -> Self {
        DisplayError::Spi(e)
    }
}

/// Bring up the panel. Returns the display and its backlight pin, which is
/// switched on once init succeeds.
pub fn setup_display<'a>(
    pins: DisplayPins<'a>,
    buf: &'a mut [u8],
) -> Result<(DisplayType<'a>, Output<'a>), DisplayError> {
    let DisplayPins {
        spi2,
        spi_sck,
        spi_mosi,
        lcd_cs,
        lcd_dc,
        mut lcd_rst,
        mut lcd_bl,
    } = pins;

    let mut delay = Delay::new();

    // Hardware reset pulse before any SPI traffic.
    lcd_rst.set_low();
    delay.delay_ms(1);
    lcd_rst.set_high();

    // SPI @ 40 MHz, Mode 0
    let spi_cfg = SpiConfig::default()
        .with_frequency(Rate::from_hz(40_000_000))
        .with_mode(Mode::_0);
    let spi = Spi::new(spi2, spi_cfg)?.with_sck(spi_sck).with_mosi(spi_mosi);

    let spi_dev = ExclusiveDevice::new(spi, lcd_cs, NoDelay).map_err(|_| DisplayError::ChipSelect)?;
    let di = SpiInterface::new(spi_dev, lcd_dc, buf);

    let display = DisplayBuilder::new(GC9A01, di)
        .display_size(PANEL_SIZE.width as u16, PANEL_SIZE.height as u16)
        .display_offset(0, 0)
        .orientation(Orientation::new().rotate(Rotation::Deg180))
        .invert_colors(ColorInversion::Inverted)
        .color_order(ColorOrder::Bgr)
        .reset_pin(lcd_rst)
        .init(&mut delay)
        .map_err(|_| DisplayError::Init)?;

    lcd_bl.set_high();
    info!("display up: {}x{}", PANEL_SIZE.width, PANEL_SIZE.height);
    Ok((display, lcd_bl))
}
