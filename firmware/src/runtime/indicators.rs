use embassy_stm32::gpio::Output;

use awning_core::state::{Indicator, IndicatorDriver};

/// The three panel LEDs, driven directly from GPIO.
pub struct LedPanel {
    closed: Output<'static>,
    open: Output<'static>,
    blink: Output<'static>,
}

impl LedPanel {
    pub fn new(closed: Output<'static>, open: Output<'static>, blink: Output<'static>) -> Self {
        Self { closed, open, blink }
    }

    fn pin(&mut self, indicator: Indicator) -> &mut Output<'static> {
        match indicator {
            Indicator::Closed => &mut self.closed,
            Indicator::Open => &mut self.open,
            Indicator::Blink => &mut self.blink,
        }
    }
}

impl IndicatorDriver for LedPanel {
    fn set(&mut self, indicator: Indicator, on: bool) {
        let pin = self.pin(indicator);
        if on {
            pin.set_high();
        } else {
            pin.set_low();
        }
    }

    fn toggle(&mut self, indicator: Indicator) {
        self.pin(indicator).toggle();
    }
}
