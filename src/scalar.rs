//! Cell coercion between string cells and typed field values.
//!
//! Every field slot a record registers has a type implementing [`Scalar`].
//! The trait carries the semantic [`ScalarKind`] of the slot together with the
//! two directions of coercion:
//!
//! - `parse_cell` turns a raw cell into the typed value, failing with a
//!   [`CoercionError`] that names the source text and the target kind
//! - `render_cell` produces the canonical cell text: base-10 integers without
//!   grouping, the shortest round-trippable float for the declared width, and
//!   strings verbatim
//!
//! `Option<T>` wraps any scalar so that an empty cell decodes to `None` and
//! `None` encodes back to an empty cell.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    String,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Boolean,
}

impl ScalarKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::String => "string",
            ScalarKind::Int8 => "int8",
            ScalarKind::Int16 => "int16",
            ScalarKind::Int32 => "int32",
            ScalarKind::Int64 => "int64",
            ScalarKind::UInt8 => "uint8",
            ScalarKind::UInt16 => "uint16",
            ScalarKind::UInt32 => "uint32",
            ScalarKind::UInt64 => "uint64",
            ScalarKind::Float32 => "float32",
            ScalarKind::Float64 => "float64",
            ScalarKind::Boolean => "boolean",
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, ScalarKind::String | ScalarKind::Boolean)
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cell that could not be converted into its target kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot convert '{text}' into {kind}{}", detail_suffix(.detail))]
pub struct CoercionError {
    pub text: String,
    pub kind: ScalarKind,
    pub detail: Option<String>,
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(" ({d})"))
        .unwrap_or_default()
}

impl CoercionError {
    pub fn new(text: &str, kind: ScalarKind) -> Self {
        Self {
            text: text.to_string(),
            kind,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl fmt::Display) -> Self {
        self.detail = Some(detail.to_string());
        self
    }
}

/// A field type the engine can coerce cells into and out of.
pub trait Scalar: Sized + 'static {
    const KIND: ScalarKind;
    /// True when an empty cell is a valid, absent value for the slot.
    const OPTIONAL: bool = false;

    fn parse_cell(text: &str) -> Result<Self, CoercionError>;

    fn render_cell(&self) -> String;
}

impl Scalar for String {
    const KIND: ScalarKind = ScalarKind::String;

    fn parse_cell(text: &str) -> Result<Self, CoercionError> {
        Ok(text.to_string())
    }

    fn render_cell(&self) -> String {
        self.clone()
    }
}

// `Display` for floats already yields the shortest text that parses back to
// the same value at the type's own width.
macro_rules! numeric_scalar {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const KIND: ScalarKind = ScalarKind::$kind;

                fn parse_cell(text: &str) -> Result<Self, CoercionError> {
                    text.parse::<$ty>()
                        .map_err(|err| CoercionError::new(text, Self::KIND).with_detail(err))
                }

                fn render_cell(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

numeric_scalar! {
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
}

impl Scalar for bool {
    const KIND: ScalarKind = ScalarKind::Boolean;

    fn parse_cell(text: &str) -> Result<Self, CoercionError> {
        match text.to_ascii_lowercase().as_str() {
            "true" | "t" | "1" => Ok(true),
            "false" | "f" | "0" => Ok(false),
            _ => Err(CoercionError::new(text, Self::KIND)),
        }
    }

    fn render_cell(&self) -> String {
        self.to_string()
    }
}

impl<T: Scalar> Scalar for Option<T> {
    const KIND: ScalarKind = T::KIND;
    const OPTIONAL: bool = true;

    fn parse_cell(text: &str) -> Result<Self, CoercionError> {
        if text.is_empty() {
            Ok(None)
        } else {
            T::parse_cell(text).map(Some)
        }
    }

    fn render_cell(&self) -> String {
        self.as_ref().map(Scalar::render_cell).unwrap_or_default()
    }
}
