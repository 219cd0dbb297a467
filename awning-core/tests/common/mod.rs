//! Simulated collaborators shared by the integration suites.

#![allow(dead_code)]

use std::collections::VecDeque;

use awning_core::protocol::HostLink;
use awning_core::sensor::{RangeFinder, SensorKind, TriggerSensor};
use awning_core::state::{Indicator, IndicatorDriver};

/// Trigger sensor returning a scripted value.
pub struct FixedTrigger {
    pub kind: SensorKind,
    pub value: f32,
}

impl FixedTrigger {
    pub fn light(value: f32) -> Self {
        Self {
            kind: SensorKind::Light,
            value,
        }
    }
}

impl TriggerSensor for FixedTrigger {
    fn kind(&self) -> SensorKind {
        self.kind
    }

    fn read(&mut self) -> f32 {
        self.value
    }
}

/// Range finder returning a scripted distance and counting trigger pulses.
#[derive(Default)]
pub struct FixedRange {
    pub distance: f32,
    pub pulses: u32,
}

impl RangeFinder for FixedRange {
    fn trigger(&mut self) {
        self.pulses += 1;
    }

    fn read_distance(&mut self) -> f32 {
        self.distance
    }
}

/// Indicator panel that records levels and toggle counts.
#[derive(Default)]
pub struct PanelState {
    pub closed: bool,
    pub open: bool,
    pub blink: bool,
    pub blink_toggles: u32,
}

impl PanelState {
    fn level(&mut self, indicator: Indicator) -> &mut bool {
        match indicator {
            Indicator::Closed => &mut self.closed,
            Indicator::Open => &mut self.open,
            Indicator::Blink => &mut self.blink,
        }
    }
}

impl IndicatorDriver for PanelState {
    fn set(&mut self, indicator: Indicator, on: bool) {
        *self.level(indicator) = on;
    }

    fn toggle(&mut self, indicator: Indicator) {
        if indicator == Indicator::Blink {
            self.blink_toggles += 1;
        }
        let level = self.level(indicator);
        *level = !*level;
    }
}

/// In-memory serial pair: tests push request bytes and collect replies.
#[derive(Default)]
pub struct ScriptedLink {
    pub rx: VecDeque<u8>,
    pub sent: Vec<u8>,
}

impl ScriptedLink {
    pub fn with_bytes(bytes: &[u8]) -> Self {
        let mut link = Self::default();
        link.push(bytes);
        link
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    pub fn take_sent(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.sent)
    }
}

impl HostLink for ScriptedLink {
    fn poll_byte(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    fn send(&mut self, bytes: &[u8]) {
        self.sent.extend_from_slice(bytes);
    }
}
