//! Argument type tags and the payload shape each one carries.

use std::fmt;

/// Wire-format argument tag (one byte in the type string).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TypeTag {
    Int = b'i',
    Float = b'f',
    String = b's',
    Blob = b'b',
    Char = b'c',
    Symbol = b'S',
    Double = b'd',
    Color = b'r',
    Midi = b'm',
    Long = b'h',
    Timestamp = b't',
    True = b'T',
    False = b'F',
    Nil = b'N',
    Impulse = b'I',
    ArrayStart = b'[',
    ArrayEnd = b']',
}

/// How many payload bytes an argument occupies in the data section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    /// No payload; the tag alone carries the value.
    None,
    /// Fixed-size big-endian payload.
    Fixed(usize),
    /// NUL-terminated bytes, padded to 4.
    Terminated,
    /// 4-byte length prefix plus raw bytes, padded to 4.
    LengthPrefixed,
}

impl TypeTag {
    /// Decode a tag byte; `None` for bytes outside the table.
    pub fn from_byte(b: u8) -> Option<Self> {
        Some(match b {
            b'i' => TypeTag::Int,
            b'f' => TypeTag::Float,
            b's' => TypeTag::String,
            b'b' => TypeTag::Blob,
            b'c' => TypeTag::Char,
            b'S' => TypeTag::Symbol,
            b'd' => TypeTag::Double,
            b'r' => TypeTag::Color,
            b'm' => TypeTag::Midi,
            b'h' => TypeTag::Long,
            b't' => TypeTag::Timestamp,
            b'T' => TypeTag::True,
            b'F' => TypeTag::False,
            b'N' => TypeTag::Nil,
            b'I' => TypeTag::Impulse,
            b'[' => TypeTag::ArrayStart,
            b']' => TypeTag::ArrayEnd,
            _ => return None,
        })
    }

    #[inline]
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Value family the tag decodes to.
    pub fn kind(self) -> ArgKind {
        match self {
            TypeTag::Int | TypeTag::Char | TypeTag::Color | TypeTag::Midi => ArgKind::Int32,
            TypeTag::Float => ArgKind::Float32,
            TypeTag::Long | TypeTag::Timestamp => ArgKind::Int64,
            TypeTag::Double => ArgKind::Float64,
            TypeTag::String | TypeTag::Symbol => ArgKind::String,
            TypeTag::Blob => ArgKind::Blob,
            TypeTag::True | TypeTag::False => ArgKind::Bool,
            TypeTag::Nil => ArgKind::Nil,
            TypeTag::Impulse => ArgKind::Impulse,
            TypeTag::ArrayStart | TypeTag::ArrayEnd => ArgKind::Array,
        }
    }

    pub fn payload(self) -> Payload {
        match self.kind() {
            ArgKind::Int32 | ArgKind::Float32 => Payload::Fixed(4),
            ArgKind::Int64 | ArgKind::Float64 => Payload::Fixed(8),
            ArgKind::String => Payload::Terminated,
            ArgKind::Blob => Payload::LengthPrefixed,
            ArgKind::Bool | ArgKind::Nil | ArgKind::Impulse | ArgKind::Array => Payload::None,
        }
    }
}

/// Decoded value family, used for typed reads and mismatch reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgKind {
    Int32,
    Float32,
    Int64,
    Float64,
    String,
    Blob,
    Bool,
    Nil,
    Impulse,
    Array,
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArgKind::Int32 => "int32 (i|c|r|m)",
            ArgKind::Float32 => "float32 (f)",
            ArgKind::Int64 => "int64 (h|t)",
            ArgKind::Float64 => "float64 (d)",
            ArgKind::String => "string (s|S)",
            ArgKind::Blob => "blob (b)",
            ArgKind::Bool => "bool (T|F)",
            ArgKind::Nil => "nil (N)",
            ArgKind::Impulse => "impulse (I)",
            ArgKind::Array => "array ([|])",
        };
        f.write_str(s)
    }
}

/// Raw tag byte as found in a type string. `RawType::END` marks the
/// position past the last tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawType(pub u8);

impl RawType {
    pub const END: RawType = RawType(0);

    pub fn is_end(self) -> bool {
        self == Self::END
    }

    pub fn tag(self) -> Option<TypeTag> {
        TypeTag::from_byte(self.0)
    }
}

impl From<TypeTag> for RawType {
    fn from(t: TypeTag) -> Self {
        RawType(t.as_byte())
    }
}

impl fmt::Display for RawType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_end() {
            f.write_str("end of type string")
        } else if self.0.is_ascii_graphic() {
            write!(f, "'{}'", self.0 as char)
        } else {
            write!(f, "0x{:02x}", self.0)
        }
    }
}
