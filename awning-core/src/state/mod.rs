//! Device state machine and indicator outputs.
//!
//! One evaluation step runs per scheduler tick: the hysteresis checks decide
//! whether a transition starts, the indicator panel is driven for whatever
//! state results, and while transitioning the ultrasonic reading decides when
//! travel has completed.

use crate::config::Thresholds;

/// Discrete operating states.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DeviceState {
    /// At least one threshold is still the zero sentinel.
    Uninitialized,
    RolledUp,
    RolledDown,
    Transitioning,
}

impl DeviceState {
    /// Float encoding of the state for the status register.
    #[must_use]
    pub const fn status_code(self) -> f32 {
        match self {
            DeviceState::Uninitialized => 0.0,
            DeviceState::RolledUp => 1.0,
            DeviceState::RolledDown => 2.0,
            DeviceState::Transitioning => 3.0,
        }
    }
}

/// Travel direction while transitioning.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Direction {
    Closing,
    Opening,
}

/// The three indicator outputs on the panel.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Indicator {
    /// Lit when rolled up, or while closing.
    Closed,
    /// Lit when rolled down, or while opening.
    Open,
    /// Blinks during a transition.
    Blink,
}

/// Output driver for the indicator panel.
pub trait IndicatorDriver {
    fn set(&mut self, indicator: Indicator, on: bool);
    fn toggle(&mut self, indicator: Indicator);
}

/// State-task invocations between blink toggles; at the 10 ms task period
/// this yields the ~500 ms blink.
pub const BLINK_TOGGLE_TICKS: u32 = 50;

/// Hysteresis state machine driving the indicator panel.
#[derive(Debug)]
pub struct StateMachine {
    state: DeviceState,
    direction: Option<Direction>,
    blink_counter: u32,
}

impl StateMachine {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: DeviceState::Uninitialized,
            direction: None,
            blink_counter: 0,
        }
    }

    #[must_use]
    pub const fn state(&self) -> DeviceState {
        self.state
    }

    #[must_use]
    pub const fn direction(&self) -> Option<Direction> {
        self.direction
    }

    /// Runs one evaluation step against the latest readings and drives the
    /// indicators for the resulting state.
    pub fn evaluate<I: IndicatorDriver>(
        &mut self,
        thresholds: &Thresholds,
        trigger: f32,
        distance: f32,
        indicators: &mut I,
    ) {
        if thresholds.is_calibrated() {
            // Hysteresis checks against the snapshot taken on entry. Should a
            // degenerate configuration satisfy both, the opening check wins
            // by evaluation order.
            if trigger >= thresholds.trigger_max && self.state != DeviceState::RolledDown {
                self.state = DeviceState::Transitioning;
                self.direction = Some(Direction::Opening);
            } else if trigger <= thresholds.trigger_min && self.state != DeviceState::RolledUp {
                self.state = DeviceState::Transitioning;
                self.direction = Some(Direction::Closing);
            }
        } else {
            self.state = DeviceState::Uninitialized;
        }

        match self.state {
            DeviceState::RolledUp => {
                indicators.set(Indicator::Closed, true);
                indicators.set(Indicator::Open, false);
                indicators.set(Indicator::Blink, false);
            }
            DeviceState::RolledDown => {
                indicators.set(Indicator::Closed, false);
                indicators.set(Indicator::Open, true);
                indicators.set(Indicator::Blink, false);
            }
            DeviceState::Transitioning => {
                indicators.set(Indicator::Closed, self.direction == Some(Direction::Closing));
                indicators.set(Indicator::Open, self.direction == Some(Direction::Opening));

                if self.blink_counter == BLINK_TOGGLE_TICKS {
                    indicators.toggle(Indicator::Blink);
                    self.blink_counter = 0;
                }
                self.blink_counter += 1;

                // End of travel: the ultrasonic reading decides when the
                // transition has completed.
                if distance > thresholds.distance_max
                    && self.direction == Some(Direction::Opening)
                {
                    self.state = DeviceState::RolledDown;
                } else if distance < thresholds.distance_min
                    && self.direction == Some(Direction::Closing)
                {
                    self.state = DeviceState::RolledUp;
                }
            }
            DeviceState::Uninitialized => {
                indicators.set(Indicator::Closed, true);
                indicators.set(Indicator::Open, true);
                indicators.set(Indicator::Blink, true);
            }
        }
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_wire_contract() {
        assert_eq!(DeviceState::Uninitialized.status_code(), 0.0);
        assert_eq!(DeviceState::RolledUp.status_code(), 1.0);
        assert_eq!(DeviceState::RolledDown.status_code(), 2.0);
        assert_eq!(DeviceState::Transitioning.status_code(), 3.0);
    }
}
