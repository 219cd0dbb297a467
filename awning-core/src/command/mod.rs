//! Command executor: the decision table between decoded frames and the
//! device's registers.
//!
//! Three bit-fields of the opcode select the operation; everything outside
//! the table below flags `Invalid`. The reply rule is part of the wire
//! contract: bytes go out if and only if the frame's error field still reads
//! `Valid` after processing, so an errored write loses its acknowledgement
//! and an errored read loses its payload frame.

use heapless::Vec;

use crate::config::{ConfigSlot, ConfigStore, Thresholds};
use crate::device::Readings;
use crate::protocol::{
    CommandFrame, ErrorFlag, FRAME_LEN, Function, RegisterId, STOP_BYTE, ValueMode,
};
use crate::sensor::DeviceIdentity;
use crate::state::DeviceState;

/// Mutable view over everything a command may touch.
pub struct RegisterFile<'a, P: ConfigStore> {
    pub readings: &'a Readings,
    pub state: DeviceState,
    pub identity: DeviceIdentity,
    pub thresholds: &'a mut Thresholds,
    pub store: &'a mut P,
}

/// Bytes produced in response to one executed frame: empty when suppressed
/// by an error, the 2-byte write acknowledgement, or a full 6-byte read
/// reply.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Reply {
    bytes: Vec<u8, FRAME_LEN>,
}

impl Reply {
    fn suppressed() -> Self {
        Self::default()
    }

    fn ack(opcode: u8) -> Self {
        Self {
            bytes: Vec::from_slice(&[opcode, STOP_BYTE]).unwrap_or_default(),
        }
    }

    fn frame(frame: &CommandFrame) -> Self {
        Self {
            bytes: Vec::from_slice(frame.as_bytes()).unwrap_or_default(),
        }
    }

    /// `true` when the error rule suppressed any transmission.
    #[must_use]
    pub fn is_suppressed(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Bytes to put on the wire.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Executes one decoded frame against the register file.
pub fn execute<P: ConfigStore>(
    mut frame: CommandFrame,
    registers: &mut RegisterFile<'_, P>,
) -> Reply {
    match frame.function() {
        Function::Write => {
            execute_write(&mut frame, registers);
            if frame.is_valid() {
                Reply::ack(frame.opcode())
            } else {
                Reply::suppressed()
            }
        }
        Function::Read => {
            execute_read(&mut frame, registers);
            if frame.is_valid() {
                Reply::frame(&frame)
            } else {
                Reply::suppressed()
            }
        }
    }
}

fn execute_write<P: ConfigStore>(frame: &mut CommandFrame, registers: &mut RegisterFile<'_, P>) {
    let slot = match (frame.value_mode(), frame.register_id()) {
        (Some(ValueMode::Min), RegisterId::Distance) => ConfigSlot::DistanceMin,
        (Some(ValueMode::Min), RegisterId::TriggerSensor) => ConfigSlot::TriggerMin,
        (Some(ValueMode::Max), RegisterId::Distance) => ConfigSlot::DistanceMax,
        (Some(ValueMode::Max), RegisterId::TriggerSensor) => ConfigSlot::TriggerMax,
        _ => {
            frame.set_error(ErrorFlag::Invalid);
            return;
        }
    };

    let value = frame.payload_value();
    // Validate persistence before touching the mirror: a configuration write
    // lands in both places or in neither.
    match registers.store.store(slot, value) {
        Ok(()) => registers.thresholds.set(slot, value),
        Err(_) => frame.set_error(ErrorFlag::DataLoss),
    }
}

fn execute_read<P: ConfigStore>(frame: &mut CommandFrame, registers: &mut RegisterFile<'_, P>) {
    match (frame.value_mode(), frame.register_id()) {
        (Some(ValueMode::Current), RegisterId::Status) => {
            frame.pack_reply_value(registers.state.status_code());
        }
        (Some(ValueMode::Current), RegisterId::Distance) => {
            frame.pack_reply_value(registers.readings.distance);
        }
        (Some(ValueMode::Current), RegisterId::TriggerSensor) => {
            frame.pack_reply_value(registers.readings.trigger);
        }
        (Some(ValueMode::Current), RegisterId::Uuid) => {
            frame.pack_reply_bytes(registers.identity.bytes());
        }
        (Some(ValueMode::Min), RegisterId::Distance) => {
            frame.pack_reply_value(registers.thresholds.distance_min);
        }
        (Some(ValueMode::Min), RegisterId::TriggerSensor) => {
            frame.pack_reply_value(registers.thresholds.trigger_min);
        }
        (Some(ValueMode::Max), RegisterId::Distance) => {
            frame.pack_reply_value(registers.thresholds.distance_max);
        }
        (Some(ValueMode::Max), RegisterId::TriggerSensor) => {
            frame.pack_reply_value(registers.thresholds.trigger_max);
        }
        _ => frame.set_error(ErrorFlag::Invalid),
    }
}
