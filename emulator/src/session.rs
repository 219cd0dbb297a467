//! Interactive emulator session: the full core device wired to simulated
//! collaborators, driven from stdin.
//!
//! The session owns the same `Device` + `Scheduler` pair the firmware runs;
//! only the hardware edges are simulated, so protocol exchanges and state
//! transitions behave exactly as they do on the bench.

use std::collections::VecDeque;

use crossterm::style::{Color, Stylize};

use awning_core::config::MemoryStore;
use awning_core::device::{self, ControlScheduler, Device};
use awning_core::protocol::{
    self, ACK_LEN, FRAME_LEN, Function, HostLink, RegisterId, STOP_BYTE, ValueMode,
};
use awning_core::sensor::{RangeFinder, SensorKind, TriggerSensor};
use awning_core::state::{Direction, Indicator, IndicatorDriver};

/// Trigger sensor whose reading the session scripts.
pub struct SimTriggerSensor {
    kind: SensorKind,
    pub value: f32,
}

impl TriggerSensor for SimTriggerSensor {
    fn kind(&self) -> SensorKind {
        self.kind
    }

    fn read(&mut self) -> f32 {
        self.value
    }
}

/// Ultrasonic ranger whose distance the session scripts.
#[derive(Default)]
pub struct SimRangeFinder {
    pub distance: f32,
    pub pulses: u32,
}

impl RangeFinder for SimRangeFinder {
    fn trigger(&mut self) {
        self.pulses += 1;
    }

    fn read_distance(&mut self) -> f32 {
        self.distance
    }
}

/// Indicator panel that records levels instead of driving GPIOs.
#[derive(Default)]
pub struct SimPanel {
    closed: bool,
    open: bool,
    blink: bool,
}

impl SimPanel {
    fn level(&mut self, indicator: Indicator) -> &mut bool {
        match indicator {
            Indicator::Closed => &mut self.closed,
            Indicator::Open => &mut self.open,
            Indicator::Blink => &mut self.blink,
        }
    }

    fn render(&self) -> String {
        format!(
            "closed {}  open {}  blink {}",
            lamp(self.closed, Color::Red),
            lamp(self.open, Color::Green),
            lamp(self.blink, Color::Yellow),
        )
    }
}

fn lamp(on: bool, color: Color) -> String {
    if on {
        "●".with(color).to_string()
    } else {
        "○".to_string()
    }
}

impl IndicatorDriver for SimPanel {
    fn set(&mut self, indicator: Indicator, on: bool) {
        *self.level(indicator) = on;
    }

    fn toggle(&mut self, indicator: Indicator) {
        let level = self.level(indicator);
        *level = !*level;
    }
}

/// In-memory serial pair: the host side pushes received bytes and collects
/// whatever the device transmits.
#[derive(Default)]
pub struct LoopbackLink {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
}

impl LoopbackLink {
    fn push_received(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    fn take_transmitted(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.tx)
    }
}

impl HostLink for LoopbackLink {
    fn poll_byte(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    fn send(&mut self, bytes: &[u8]) {
        self.tx.extend_from_slice(bytes);
    }
}

type EmuDevice = Device<SimTriggerSensor, SimRangeFinder, MemoryStore, SimPanel, LoopbackLink>;
type EmuScheduler =
    ControlScheduler<SimTriggerSensor, SimRangeFinder, MemoryStore, SimPanel, LoopbackLink>;

const HELP: &[&str] = &[
    "trigger <value>                     set the simulated sensor reading",
    "distance <value>                    set the simulated distance (cm)",
    "step [n]                            advance n scheduler ticks (default 1)",
    "send <hex bytes>                    feed raw frame bytes to the device",
    "read <current|min|max> <register>   issue a read request",
    "write <min|max> <register> <value>  issue a configuration write",
    "status                              show device state and indicators",
    "help                                this text",
    "exit                                quit",
];

pub struct Session {
    device: EmuDevice,
    scheduler: EmuScheduler,
}

impl Session {
    pub fn new(kind: SensorKind) -> Self {
        let mut device = Device::new(
            SimTriggerSensor { kind, value: 0.0 },
            SimRangeFinder::default(),
            MemoryStore::new(),
            SimPanel::default(),
            LoopbackLink::default(),
        );
        device.load_thresholds();

        let mut scheduler = EmuScheduler::new();
        device::register_control_tasks(&mut scheduler).expect("control task registration");
        scheduler.start();

        Self { device, scheduler }
    }

    pub fn handle_command(&mut self, line: &str) -> Vec<String> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            ["help"] => HELP.iter().map(|entry| (*entry).to_string()).collect(),
            ["status"] => self.status(),
            ["trigger", value] => match value.parse::<f32>() {
                Ok(value) => {
                    self.device.trigger_sensor_mut().value = value;
                    vec![format!("trigger source = {value}")]
                }
                Err(_) => vec![format!("not a number: `{value}`")],
            },
            ["distance", value] => match value.parse::<f32>() {
                Ok(value) => {
                    self.device.range_finder_mut().distance = value;
                    vec![format!("distance source = {value} cm")]
                }
                Err(_) => vec![format!("not a number: `{value}`")],
            },
            ["step"] => self.step(1),
            ["step", count] => match count.parse::<u32>() {
                Ok(count) => self.step(count),
                Err(_) => vec![format!("not a tick count: `{count}`")],
            },
            ["send", rest @ ..] => self.send_hex(rest),
            ["read", mode, register] => self.read(mode, register),
            ["write", mode, register, value] => self.write(mode, register, value),
            _ => vec!["unrecognized command; try `help`".to_string()],
        }
    }

    fn step(&mut self, ticks: u32) -> Vec<String> {
        for _ in 0..ticks {
            self.scheduler.tick();
            self.scheduler.dispatch(&mut self.device);
        }
        let transmitted = self.device.link_mut().take_transmitted();
        let mut lines = vec![format!("advanced {ticks} tick(s)")];
        if !transmitted.is_empty() {
            lines.push(format!("tx: {}", hex(&transmitted)));
        }
        lines
    }

    fn send_hex(&mut self, parts: &[&str]) -> Vec<String> {
        let mut bytes = Vec::new();
        for part in parts {
            match u8::from_str_radix(part, 16) {
                Ok(byte) => bytes.push(byte),
                Err(_) => return vec![format!("not a hex byte: `{part}`")],
            }
        }
        if bytes.is_empty() {
            return vec!["usage: send <hex bytes>".to_string()];
        }
        self.exchange(&bytes)
    }

    fn read(&mut self, mode: &str, register: &str) -> Vec<String> {
        let Some(mode) = parse_mode(mode) else {
            return vec![format!("unknown value mode `{mode}`")];
        };
        let Some(register) = parse_register(register) else {
            return vec![format!("unknown register `{register}`")];
        };
        let opcode = protocol::opcode(Function::Read, mode, register);
        // Short-form read request: opcode plus the stop marker.
        self.exchange(&[opcode, STOP_BYTE])
    }

    fn write(&mut self, mode: &str, register: &str, value: &str) -> Vec<String> {
        let mode = match mode {
            "min" => ValueMode::Min,
            "max" => ValueMode::Max,
            other => return vec![format!("writes take `min` or `max`, not `{other}`")],
        };
        let Some(register) = parse_register(register) else {
            return vec![format!("unknown register `{register}`")];
        };
        let Ok(value) = value.parse::<f32>() else {
            return vec![format!("not a number: `{value}`")];
        };
        let opcode = protocol::opcode(Function::Write, mode, register);
        let payload = protocol::float_to_bytes(value);
        let mut frame = [0u8; FRAME_LEN];
        frame[0] = opcode;
        frame[1..=4].copy_from_slice(&payload);
        frame[5] = STOP_BYTE;
        self.exchange(&frame)
    }

    /// Feeds one request to the device, advances a tick so the protocol task
    /// picks it up, and reports whatever came back.
    fn exchange(&mut self, request: &[u8]) -> Vec<String> {
        self.device.link_mut().push_received(request);
        self.scheduler.tick();
        self.scheduler.dispatch(&mut self.device);
        let reply = self.device.link_mut().take_transmitted();
        if reply.is_empty() {
            vec!["no reply (frame dropped or errored)".to_string()]
        } else {
            describe_reply(&reply)
        }
    }

    fn status(&mut self) -> Vec<String> {
        let readings = self.device.readings();
        let pulses = self.device.range_finder_mut().pulses;
        let thresholds = self.device.thresholds();
        vec![
            format!(
                "state: {:?}{}",
                self.device.state(),
                direction_suffix(self.device.direction())
            ),
            format!(
                "readings: trigger {} | distance {} cm ({pulses} pings)",
                readings.trigger, readings.distance
            ),
            format!(
                "thresholds: trigger {}..{} | distance {}..{} cm",
                thresholds.trigger_min,
                thresholds.trigger_max,
                thresholds.distance_min,
                thresholds.distance_max
            ),
            format!("indicators: {}", self.device.indicators().render()),
        ]
    }
}

fn direction_suffix(direction: Option<Direction>) -> &'static str {
    match direction {
        Some(Direction::Opening) => " (opening)",
        Some(Direction::Closing) => " (closing)",
        None => "",
    }
}

fn parse_mode(mode: &str) -> Option<ValueMode> {
    match mode {
        "current" => Some(ValueMode::Current),
        "min" => Some(ValueMode::Min),
        "max" => Some(ValueMode::Max),
        _ => None,
    }
}

fn parse_register(register: &str) -> Option<RegisterId> {
    match register {
        "status" => Some(RegisterId::Status),
        "distance" => Some(RegisterId::Distance),
        "trigger" => Some(RegisterId::TriggerSensor),
        "uuid" => Some(RegisterId::Uuid),
        _ => None,
    }
}

fn describe_reply(reply: &[u8]) -> Vec<String> {
    let mut lines = vec![format!("tx: {}", hex(reply))];
    match reply.len() {
        ACK_LEN => lines.push("write acknowledged".to_string()),
        FRAME_LEN => {
            let payload = [reply[1], reply[2], reply[3], reply[4]];
            lines.push(format!(
                "payload = {} (raw {})",
                protocol::bytes_to_float(payload),
                hex(&payload)
            ));
        }
        _ => {}
    }
    lines
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|byte| format!("{byte:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}
