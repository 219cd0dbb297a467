//! Wire codec for the 6-byte dashboard command frames.
//!
//! Layout of byte 0, the opcode: bit 7 selects the function (read/write),
//! bits 6-5 the value mode, bits 4-3 the register id, and the low three bits
//! accumulate the error code. Bytes 1-4 carry an IEEE-754 float payload or
//! filler; byte 5 is the stop marker. Write acknowledgements are a 2-byte
//! short form: the echoed opcode followed by the stop marker.

use core::fmt;

/// Total length of a command frame on the wire.
pub const FRAME_LEN: usize = 6;
/// Length of a write acknowledgement reply.
pub const ACK_LEN: usize = 2;
/// Length of the float payload carried in bytes 1-4.
pub const PAYLOAD_LEN: usize = 4;
/// Stop marker terminating every frame.
pub const STOP_BYTE: u8 = 0xFF;

/// Bounded number of empty polls tolerated while a frame is in flight.
///
/// The budget is shared across the remainder of the frame: once the opcode
/// has arrived the host is mid-transmission, so a dry spell this long means
/// the frame is never going to complete.
pub const RECV_RETRY_LIMIT: u32 = 10_000;

const FUNCTION_MASK: u8 = 0x80;
const VALUE_MODE_MASK: u8 = 0x60;
const REGISTER_ID_MASK: u8 = 0x18;
const ERROR_MASK: u8 = 0x07;

/// Byte-level serial capability the codec polls and replies over.
pub trait HostLink {
    /// Fetches the next received byte, or `None` when the line is idle.
    fn poll_byte(&mut self) -> Option<u8>;

    /// Queues `bytes` for transmission to the host.
    fn send(&mut self, bytes: &[u8]);
}

/// Error codes carried in the opcode's low three bits.
///
/// The remaining encodings (2, 4, 6) are reserved. `InvalidCommand` is part
/// of the wire contract but not raised by current logic.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorFlag {
    Valid = 0,
    Invalid = 1,
    DataLoss = 3,
    UnexpectedByteCount = 5,
    InvalidCommand = 7,
}

impl ErrorFlag {
    /// Decodes the error field of an opcode byte; reserved encodings map to
    /// `None`.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits & ERROR_MASK {
            0 => Some(ErrorFlag::Valid),
            1 => Some(ErrorFlag::Invalid),
            3 => Some(ErrorFlag::DataLoss),
            5 => Some(ErrorFlag::UnexpectedByteCount),
            7 => Some(ErrorFlag::InvalidCommand),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorFlag::Valid => f.write_str("valid"),
            ErrorFlag::Invalid => f.write_str("invalid"),
            ErrorFlag::DataLoss => f.write_str("data loss"),
            ErrorFlag::UnexpectedByteCount => f.write_str("unexpected byte count"),
            ErrorFlag::InvalidCommand => f.write_str("invalid command"),
        }
    }
}

/// Frame function selector (opcode bit 7).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Function {
    Read,
    Write,
}

impl Function {
    #[must_use]
    pub const fn from_opcode(opcode: u8) -> Self {
        if opcode & FUNCTION_MASK == 0 {
            Function::Read
        } else {
            Function::Write
        }
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            Function::Read => 0x00,
            Function::Write => 0x80,
        }
    }
}

/// Value mode selector (opcode bits 6-5). The fourth encoding (0b11) is
/// unassigned and rejected by the executor.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ValueMode {
    Current,
    Min,
    Max,
}

impl ValueMode {
    #[must_use]
    pub const fn from_opcode(opcode: u8) -> Option<Self> {
        match opcode & VALUE_MODE_MASK {
            0x00 => Some(ValueMode::Current),
            0x20 => Some(ValueMode::Min),
            0x40 => Some(ValueMode::Max),
            _ => None,
        }
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            ValueMode::Current => 0x00,
            ValueMode::Min => 0x20,
            ValueMode::Max => 0x40,
        }
    }
}

/// Register id selector (opcode bits 4-3).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RegisterId {
    Status,
    Distance,
    TriggerSensor,
    Uuid,
}

impl RegisterId {
    #[must_use]
    pub const fn from_opcode(opcode: u8) -> Self {
        match opcode & REGISTER_ID_MASK {
            0x00 => RegisterId::Status,
            0x08 => RegisterId::Distance,
            0x10 => RegisterId::TriggerSensor,
            _ => RegisterId::Uuid,
        }
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            RegisterId::Status => 0x00,
            RegisterId::Distance => 0x08,
            RegisterId::TriggerSensor => 0x10,
            RegisterId::Uuid => 0x18,
        }
    }
}

/// Builds a request opcode from its three fields, error bits zeroed.
#[must_use]
pub const fn opcode(function: Function, mode: ValueMode, id: RegisterId) -> u8 {
    function.bits() | mode.bits() | id.bits()
}

/// One 6-byte command frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CommandFrame {
    bytes: [u8; FRAME_LEN],
}

impl CommandFrame {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            bytes: [0; FRAME_LEN],
        }
    }

    #[must_use]
    pub const fn from_bytes(bytes: [u8; FRAME_LEN]) -> Self {
        Self { bytes }
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.bytes
    }

    #[must_use]
    pub const fn opcode(&self) -> u8 {
        self.bytes[0]
    }

    #[must_use]
    pub const fn error_bits(&self) -> u8 {
        self.bytes[0] & ERROR_MASK
    }

    /// `true` while the error field still reads `Valid`; the reply rule and
    /// the execute gate both key off this.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.error_bits() == ErrorFlag::Valid as u8
    }

    #[must_use]
    pub fn error_flag(&self) -> Option<ErrorFlag> {
        ErrorFlag::from_bits(self.error_bits())
    }

    #[must_use]
    pub fn function(&self) -> Function {
        Function::from_opcode(self.bytes[0])
    }

    #[must_use]
    pub fn value_mode(&self) -> Option<ValueMode> {
        ValueMode::from_opcode(self.bytes[0])
    }

    #[must_use]
    pub fn register_id(&self) -> RegisterId {
        RegisterId::from_opcode(self.bytes[0])
    }

    /// ORs `flag` into the opcode's error field, leaving the rest of the
    /// frame as received. Used by the decode path.
    pub fn flag_error(&mut self, flag: ErrorFlag) {
        self.bytes[0] |= flag as u8;
    }

    /// Resets the frame to a local error reply: error bits overwritten,
    /// byte 1 forced to the stop marker, bytes 2-5 zeroed. Destroys any
    /// payload already present.
    pub fn set_error(&mut self, flag: ErrorFlag) {
        self.bytes[0] = (self.bytes[0] & !ERROR_MASK) | flag as u8;
        self.bytes[1] = STOP_BYTE;
        self.bytes[2..].fill(0);
    }

    /// Bytes 1-4, the payload field.
    #[must_use]
    pub fn payload(&self) -> [u8; PAYLOAD_LEN] {
        [self.bytes[1], self.bytes[2], self.bytes[3], self.bytes[4]]
    }

    /// Decodes the payload field as a float.
    #[must_use]
    pub fn payload_value(&self) -> f32 {
        bytes_to_float(self.payload())
    }

    /// Packs a float payload and forces the stop marker (a read reply).
    pub fn pack_reply_value(&mut self, value: f32) {
        self.pack_reply_bytes(float_to_bytes(value));
    }

    /// Packs raw payload bytes and forces the stop marker (the identity
    /// register replies with bytes that are not a float).
    pub fn pack_reply_bytes(&mut self, payload: [u8; PAYLOAD_LEN]) {
        self.bytes[1..=PAYLOAD_LEN].copy_from_slice(&payload);
        self.bytes[FRAME_LEN - 1] = STOP_BYTE;
    }
}

/// Bit-exact reinterpretation of a float as its four payload bytes.
///
/// Native byte order on both ends: the wire contract inherits the MCU's
/// layout, so a port to a different byte order must keep the dashboard in
/// agreement rather than silently normalize.
#[must_use]
pub fn float_to_bytes(value: f32) -> [u8; PAYLOAD_LEN] {
    value.to_ne_bytes()
}

/// Inverse of [`float_to_bytes`].
#[must_use]
pub fn bytes_to_float(bytes: [u8; PAYLOAD_LEN]) -> f32 {
    f32::from_ne_bytes(bytes)
}

/// Polls `link` for one command frame.
///
/// Returns `None` when the line is idle. Once an opcode byte has arrived the
/// remainder of the frame is collected under [`RECV_RETRY_LIMIT`]; a frame
/// that terminates early or late comes back flagged with
/// [`ErrorFlag::UnexpectedByteCount`], and the bytes it failed to deliver are
/// left on the link.
pub fn receive<L: HostLink>(link: &mut L) -> Option<CommandFrame> {
    let opcode = link.poll_byte()?;

    let mut frame = CommandFrame::empty();
    frame.bytes[0] = opcode;

    // Write requests carry four payload bytes unconditionally; everything
    // else goes straight to the terminator check.
    let expected_payload = match Function::from_opcode(opcode) {
        Function::Write => PAYLOAD_LEN,
        Function::Read => 0,
    };

    let mut cursor = 1;
    let mut idle_polls: u32 = 0;
    loop {
        let Some(byte) = link.poll_byte() else {
            idle_polls += 1;
            if idle_polls == RECV_RETRY_LIMIT {
                frame.flag_error(ErrorFlag::UnexpectedByteCount);
                break;
            }
            continue;
        };
        if cursor > expected_payload {
            if byte == STOP_BYTE {
                frame.bytes[cursor] = byte;
            } else {
                frame.flag_error(ErrorFlag::UnexpectedByteCount);
            }
            break;
        }
        frame.bytes[cursor] = byte;
        cursor += 1;
    }

    Some(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_fields_roundtrip() {
        let raw = opcode(Function::Write, ValueMode::Min, RegisterId::Distance);
        assert_eq!(raw, 0xA8);
        assert_eq!(Function::from_opcode(raw), Function::Write);
        assert_eq!(ValueMode::from_opcode(raw), Some(ValueMode::Min));
        assert_eq!(RegisterId::from_opcode(raw), RegisterId::Distance);
        assert_eq!(ErrorFlag::from_bits(raw), Some(ErrorFlag::Valid));
    }

    #[test]
    fn unassigned_value_mode_is_rejected() {
        assert_eq!(ValueMode::from_opcode(0x60), None);
    }

    #[test]
    fn set_error_is_destructive() {
        let mut frame = CommandFrame::from_bytes([0xA8, 0x12, 0x34, 0x56, 0x78, STOP_BYTE]);
        frame.set_error(ErrorFlag::Invalid);
        assert_eq!(
            frame.as_bytes(),
            &[0xA9, STOP_BYTE, 0x00, 0x00, 0x00, 0x00]
        );
        assert!(!frame.is_valid());
    }

    #[test]
    fn flag_error_preserves_payload() {
        let mut frame = CommandFrame::from_bytes([0x08, 0x12, 0x34, 0x56, 0x78, STOP_BYTE]);
        frame.flag_error(ErrorFlag::UnexpectedByteCount);
        assert_eq!(frame.error_flag(), Some(ErrorFlag::UnexpectedByteCount));
        assert_eq!(frame.payload(), [0x12, 0x34, 0x56, 0x78]);
    }

    #[test]
    fn reply_packing_forces_stop_marker() {
        let mut frame = CommandFrame::from_bytes([0x08, 0, 0, 0, 0, 0]);
        frame.pack_reply_value(12.5);
        assert_eq!(frame.payload_value(), 12.5);
        assert_eq!(frame.as_bytes()[FRAME_LEN - 1], STOP_BYTE);
    }
}
