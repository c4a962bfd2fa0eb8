// Board-specific pin mappings, selected with Cargo features.
// Both profiles drive a GC9A01 240x240 panel on SPI2 and an MPU-6050 on I2C0;
// they differ only in where the two buttons sit.
//! The following wiring is assumed (esp32s3 profile):
//! - BUTTON A (exit)    => GPIO15
//! - BUTTON B (restart) => GPIO21
//! - MPU-6050 SDA => GPIO5
//! - MPU-6050 SCL => GPIO6
//! - MPU-6050 AD0 => GND (address 0x68)
//! - LCD SCK => GPIO10, MOSI => GPIO11
//! - LCD CS => GPIO9, DC => GPIO8, RST => GPIO14, BL => GPIO2
//! Buttons short to GND when pressed (internal pull-ups are enabled).

use esp_hal::gpio::{Event, Input, InputConfig, Io, Level, Output, OutputConfig, Pull};
use esp_hal::peripherals::{Peripherals, GPIO10, GPIO11, GPIO5, GPIO6, I2C0, SPI2};

pub struct DisplayPins<'a> {
    pub spi2: SPI2<'a>,
    pub spi_sck: GPIO10<'a>,
    pub spi_mosi: GPIO11<'a>,
    pub lcd_cs: Output<'a>,
    pub lcd_dc: Output<'a>,
    pub lcd_rst: Output<'a>,
    pub lcd_bl: Output<'a>,
}

pub struct ImuPins<'a> {
    pub i2c0: I2C0<'a>,
    pub sda: GPIO5<'a>,
    pub scl: GPIO6<'a>,
}

pub struct BoardPins<'a> {
    pub btn_a: Input<'a>,
    pub btn_b: Input<'a>,
    pub imu: ImuPins<'a>,
    pub display: DisplayPins<'a>,
}

fn button<'a>(pin: impl esp_hal::gpio::InputPin + 'a) -> Input<'a> {
    let mut btn = Input::new(pin, InputConfig::default().with_pull(Pull::Up));
    btn.listen(Event::AnyEdge);
    btn
}

fn display_pins<'a>(
    spi2: SPI2<'a>,
    spi_sck: GPIO10<'a>,
    spi_mosi: GPIO11<'a>,
    cs: impl esp_hal::gpio::OutputPin + 'a,
    dc: impl esp_hal::gpio::OutputPin + 'a,
    rst: impl esp_hal::gpio::OutputPin + 'a,
    bl: impl esp_hal::gpio::OutputPin + 'a,
) -> DisplayPins<'a> {
    // Do NOT configure SCK/MOSI here, SPI takes them as-is.
    DisplayPins {
        spi2,
        spi_sck,
        spi_mosi,
        lcd_cs: Output::new(cs, Level::High, OutputConfig::default()),
        lcd_dc: Output::new(dc, Level::Low, OutputConfig::default()),
        lcd_rst: Output::new(rst, Level::High, OutputConfig::default()),
        // Backlight stays off until the panel is initialised.
        lcd_bl: Output::new(bl, Level::Low, OutputConfig::default()),
    }
}

// Default profile
#[cfg(not(feature = "devkit-esp32s3-disp128"))]
pub fn init_board_pins<'a>(p: Peripherals) -> (Io<'a>, BoardPins<'a>) {
    let io = Io::new(p.IO_MUX);

    let btn_a = button(p.GPIO15);
    let btn_b = button(p.GPIO21);

    let imu = ImuPins {
        i2c0: p.I2C0,
        sda: p.GPIO5,
        scl: p.GPIO6,
    };

    let display = display_pins(p.SPI2, p.GPIO10, p.GPIO11, p.GPIO9, p.GPIO8, p.GPIO14, p.GPIO2);

    (io, BoardPins { btn_a, btn_b, imu, display })
}

// Dev board with the 1.28" round panel (enable with --features devkit-esp32s3-disp128).
// Buttons move to the BOOT key and GPIO1; everything else is shared.
#[cfg(feature = "devkit-esp32s3-disp128")]
pub fn init_board_pins<'a>(p: Peripherals) -> (Io<'a>, BoardPins<'a>) {
    let io = Io::new(p.IO_MUX);

    let btn_a = button(p.GPIO0);
    let btn_b = button(p.GPIO1);

    let imu = ImuPins {
        i2c0: p.I2C0,
        sda: p.GPIO5,
        scl: p.GPIO6,
    };

    let display = display_pins(p.SPI2, p.GPIO10, p.GPIO11, p.GPIO9, p.GPIO8, p.GPIO14, p.GPIO2);

    (io, BoardPins { btn_a, btn_b, imu, display })
}
