//! Button input: debounced edges in, one latched event out.
//!
//! This module provides:
//! - `InputEvent`, the discrete event the game loop consumes
//! - `EventLatch`, a critical-section protected single-slot mailbox that the
//!   button ISR posts to and the loop acknowledges
//! - `Debouncer`, falling-edge detection with a minimum press interval
//! - `ButtonState` and `handle_button` (board builds only), the ISR glue
//!
//! A posted event stays pending until the loop acknowledges it, so each press
//! is delivered at most once.

use core::cell::Cell;
use critical_section::Mutex;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum InputEvent {
    #[default]
    None,
    /// Shut down and leave the game.
    Primary,
    /// Restart from the spawn point.
    Secondary,
}

pub struct EventLatch {
    pending: Mutex<Cell<InputEvent>>,
}

impl Default for EventLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLatch {
    pub const fn new() -> Self {
        Self {
            pending: Mutex::new(Cell::new(InputEvent::None)),
        }
    }

    /// Latch `event`. A pending `Primary` is never replaced by a restart.
    pub fn post(&self, event: InputEvent) {
        if event == InputEvent::None {
            return;
        }
        critical_section::with(|cs| {
            let slot = self.pending.borrow(cs);
            if slot.get() != InputEvent::Primary {
                slot.set(event);
            }
        });
    }

    pub fn peek(&self) -> InputEvent {
        critical_section::with(|cs| self.pending.borrow(cs).get())
    }

    pub fn acknowledge(&self) {
        critical_section::with(|cs| self.pending.borrow(cs).set(InputEvent::None));
    }

    /// Peek and acknowledge in one critical section.
    pub fn take(&self) -> InputEvent {
        critical_section::with(|cs| self.pending.borrow(cs).replace(InputEvent::None))
    }
}

/// Falling-edge detector for an active-low button with a pull-up.
#[derive(Clone, Copy, Debug)]
pub struct Debouncer {
    last_high: bool,
    last_press_ms: Option<u64>,
    window_ms: u64,
}

impl Debouncer {
    pub const fn new(window_ms: u64) -> Self {
        Self {
            last_high: true,
            last_press_ms: None,
            window_ms,
        }
    }

    /// Feed the current pin level; returns true on an accepted press.
    pub fn on_edge(&mut self, level_is_low: bool, now_ms: u64) -> bool {
        let was_high = self.last_high;
        self.last_high = !level_is_low;
        if !(was_high && level_is_low) {
            return false;
        }
        let settled = match self.last_press_ms {
            Some(last) => now_ms.saturating_sub(last) > self.window_ms,
            None => true,
        };
        if settled {
            self.last_press_ms = Some(now_ms);
        }
        settled
    }
}

#[cfg(feature = "board")]
pub use board::{handle_button, ButtonState};

#[cfg(feature = "board")]
mod board {
    use core::cell::{Cell, RefCell};
    use critical_section::Mutex;
    use esp_hal::gpio::Input;

    use super::{Debouncer, EventLatch, InputEvent};

    pub struct ButtonState<'a> {
        pub input: Mutex<RefCell<Option<Input<'a>>>>,
        pub debounce: Mutex<Cell<Debouncer>>,
        pub event: InputEvent,
    }

    impl<'a> ButtonState<'a> {
        pub const fn new(event: InputEvent, debounce_ms: u64) -> Self {
            Self {
                input: Mutex::new(RefCell::new(None)),
                debounce: Mutex::new(Cell::new(Debouncer::new(debounce_ms))),
                event,
            }
        }
    }

    /// Called from the GPIO interrupt for every button sharing it.
    pub fn handle_button(btn: &ButtonState, now_ms: u64, latch: &EventLatch) {
        let pressed = critical_section::with(|cs| {
            let mut binding = btn.input.borrow_ref_mut(cs);
            let Some(input) = binding.as_mut() else {
                return false;
            };
            if !input.is_interrupt_set() {
                return false;
            }
            input.clear_interrupt();

            let cell = btn.debounce.borrow(cs);
            let mut d = cell.get();
            let pressed = d.on_edge(input.is_low(), now_ms);
            cell.set(d);
            pressed
        });
        if pressed {
            latch.post(btn.event);
        }
    }
}
