//! Fixed-element-width binary buffers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Element type of a fixed-format binary buffer.
///
/// The element type only fixes the width of one element. Diffing treats the
/// buffer as an opaque byte sequence regardless of the element type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    U8,
    U8Clamped,
    I8,
    U16,
    I16,
    U32,
    I32,
    F32,
    U64,
    I64,
    F64,
}

impl ElementType {
    /// Width of a single element in bytes.
    pub const fn width(self) -> usize {
        match self {
            Self::U8 | Self::U8Clamped | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
        }
    }

    /// Short lowercase tag used by the JSON envelope.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U8Clamped => "u8clamped",
            Self::I8 => "i8",
            Self::U16 => "u16",
            Self::I16 => "i16",
            Self::U32 => "u32",
            Self::I32 => "i32",
            Self::F32 => "f32",
            Self::U64 => "u64",
            Self::I64 => "i64",
            Self::F64 => "f64",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ElementType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "u8" => Self::U8,
            "u8clamped" => Self::U8Clamped,
            "i8" => Self::I8,
            "u16" => Self::U16,
            "i16" => Self::I16,
            "u32" => Self::U32,
            "i32" => Self::I32,
            "f32" => Self::F32,
            "u64" => Self::U64,
            "i64" => Self::I64,
            "f64" => Self::F64,
            other => {
                return Err(TypeError::InvalidEnvelope {
                    tag: "$element".into(),
                    reason: format!("unknown element type {other:?}"),
                })
            }
        })
    }
}

/// A fixed-element-width binary buffer (pixel rows, palettes, sample data).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BinaryBuffer {
    element: ElementType,
    bytes: Vec<u8>,
}

impl BinaryBuffer {
    /// Wrap raw bytes. The length must be a multiple of the element width.
    pub fn new(element: ElementType, bytes: Vec<u8>) -> Result<Self, TypeError> {
        if bytes.len() % element.width() != 0 {
            return Err(TypeError::InvalidLength {
                width: element.width(),
                actual: bytes.len(),
            });
        }
        Ok(Self { element, bytes })
    }

    /// A byte buffer (`u8` elements). Never fails.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            element: ElementType::U8,
            bytes: bytes.into(),
        }
    }

    pub fn element(&self) -> ElementType {
        self.element
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Number of elements (bytes divided by element width, rounded down).
    pub fn len(&self) -> usize {
        self.bytes.len() / self.element.width()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for BinaryBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BinaryBuffer<{}>({} bytes)", self.element, self.bytes.len())
    }
}
