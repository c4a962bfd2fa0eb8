//! Tilt Maze
//! ========================================
//! needs to be run in WSL2 terminal
//! source ~/export-esp.sh
//! cargo run --release --features esp32s3
//! ========================================
//!
//! Tilt the board to roll the ball to the goal.
//! Button B restarts, button A blanks the screen, puts the sensor to sleep
//! and resets the chip.

//% CHIPS: esp32s3
//% FEATURES: esp-hal/unstable

#![no_std]
#![no_main]

// Define the application description, which is placed in a special section of the binary.
// This is used by the bootloader to verify the application.
// The macro automatically fills in the fields.
esp_bootloader_esp_idf::esp_app_desc!();

use tilt_maze::{
    config::GameConfig,
    display::{setup_display, PANEL_SIZE},
    game::{Game, TickOutcome},
    input::{handle_button, ButtonState, EventLatch, InputEvent},
    maze::MazeGrid,
    mpu6050::{ImuError, Mpu6050, DEFAULT_I2C_ADDR},
    transport::{I2cTransport, TransportError},
    ui::{canvas_offset, draw_fault, render, Theme},
    wiring::{init_board_pins, BoardPins, ImuPins},
};

use esp_backtrace as _;

use embedded_graphics::{pixelcolor::Rgb565, prelude::*};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Error as _, ErrorKind};
use esp_hal::{
    delay::Delay,
    handler,
    i2c::master::{BusTimeout, Config as I2cConfig, Error as I2cError, I2c},
    main, ram,
    system::software_reset,
    time::Rate,
    timer::systimer::{SystemTimer, Unit},
    Blocking, Config,
};
use esp_println::println;
use log::{error, info, warn};

// Current debounce time (milliseconds)
const DEBOUNCE_MS: u64 = 240;

static EVENTS: EventLatch = EventLatch::new();

// Shared resources for the buttons
static BUTTON_A: ButtonState<'static> = ButtonState::new(InputEvent::Primary, DEBOUNCE_MS);
static BUTTON_B: ButtonState<'static> = ButtonState::new(InputEvent::Secondary, DEBOUNCE_MS);

// Interrupt handler
#[handler]
#[ram]
fn handler() {
    let now_ms = {
        let t = SystemTimer::unit_value(Unit::Unit0);
        t.saturating_mul(1000) / SystemTimer::ticks_per_second()
    };

    // Only latch here, the main loop does the work.
    handle_button(&BUTTON_A, now_ms, &EVENTS);
    handle_button(&BUTTON_B, now_ms, &EVENTS);
}

fn classify_i2c(e: &I2cError) -> TransportError {
    match e {
        I2cError::Timeout => TransportError::Timeout,
        other => TransportError::Bus(other.kind()),
    }
}

fn init_bus<'a>(pins: ImuPins<'a>) -> Result<I2cTransport<I2c<'a, Blocking>>, ImuError> {
    let cfg = I2cConfig::default()
        .with_frequency(Rate::from_khz(400))
        .with_timeout(BusTimeout::Maximum);
    let i2c = I2c::new(pins.i2c0, cfg)
        .map_err(|_| ImuError::Transport(TransportError::Bus(ErrorKind::Other)))?
        .with_sda(pins.sda)
        .with_scl(pins.scl);
    Ok(I2cTransport::new(i2c, DEFAULT_I2C_ADDR).with_classifier(classify_i2c))
}

// Fail-stop: nothing left to do but wait for an external reset.
fn halt() -> ! {
    loop {
        core::hint::spin_loop();
    }
}

#[main]
fn main() -> ! {
    esp_println::logger::init_logger(log::LevelFilter::Info);
    println!("tilt maze booting");

    let peripherals = esp_hal::init(Config::default());

    // one call gives you IO handler + all the role pins from wiring.rs
    let (mut io, pins) = init_board_pins(peripherals);
    let BoardPins {
        btn_a,
        btn_b,
        imu: imu_pins,
        display: display_pins,
    } = pins;

    // Stash pins in global state
    critical_section::with(|cs| {
        BUTTON_A.input.borrow_ref_mut(cs).replace(btn_a);
        BUTTON_B.input.borrow_ref_mut(cs).replace(btn_b);
    });
    io.set_interrupt_handler(handler);

    let mut delay = Delay::new();

    let mut display_buf = [0u8; 1024];
    let (mut display, mut backlight) = match setup_display(display_pins, &mut display_buf) {
        Ok(d) => d,
        Err(e) => {
            error!("display init failed: {:?}", e);
            halt();
        }
    };
    display.clear(Rgb565::BLACK).ok();

    let config = GameConfig::default();
    let maze = MazeGrid::classic();
    if let Err(e) = config.validate(&maze) {
        error!("bad game config: {:?}", e);
        halt();
    }
    let offset = canvas_offset(PANEL_SIZE, config.canvas);

    let imu = match init_bus(imu_pins).and_then(|t| Mpu6050::new(t, &mut delay, config.sensor)) {
        Ok(imu) => imu,
        Err(e) => {
            error!("MPU6050 init failed: {:?}", e);
            draw_fault(&mut display.translated(offset), config.canvas, &e, &Theme::PANEL).ok();
            halt();
        }
    };

    let mut game = Game::new(imu, maze, config);

    // Calibration screen, then block until the offsets are in.
    render(&mut display.translated(offset), &game.scene(), &Theme::PANEL).ok();
    let report = game.calibrate(&mut delay);
    info!(
        "offsets accel {:?} gyro {:?} ({}/{} samples)",
        report.offsets.accel, report.offsets.gyro, report.successful, report.requested
    );

    loop {
        if game.tick(EVENTS.take()) == TickOutcome::Exit {
            break;
        }
        render(&mut display.translated(offset), &game.scene(), &Theme::PANEL).ok();
        delay.delay_ms(game.tick_period_ms());
    }

    // Exit: blank the panel, park the sensor, reset.
    display.clear(Rgb565::BLACK).ok();
    backlight.set_low();
    let (_bus, res) = game.shutdown();
    if let Err(e) = res {
        warn!("sensor sleep failed: {:?}", e);
    }
    println!("bye");
    delay.delay_ms(10);
    software_reset()
}
