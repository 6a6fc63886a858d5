//! Column type tags for encoded tables.
//!
//! Each header column handed to a codec carries a [`ColumnType`] derived from
//! the field's [`ScalarKind`]. Unsigned kinds widen to the next signed tag.
//! `StringRef` only ever arrives from a codec and is never produced by
//! encoding.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::scalar::ScalarKind;

/// Column type tag handed to the external table codec alongside each header
/// name. The numeric codes are stable and shared with the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    String,
    Int8,
    Int16,
    Int32,
    Float,
    Double,
    /// Reference to a shared long string.
    StringRef,
}

impl ColumnType {
    /// Column type for a field kind, or `None` when the codec has no
    /// representation for it.
    pub fn for_kind(kind: ScalarKind) -> Option<Self> {
        match kind {
            ScalarKind::String => Some(ColumnType::String),
            ScalarKind::Int8 => Some(ColumnType::Int8),
            ScalarKind::Int16 | ScalarKind::UInt8 => Some(ColumnType::Int16),
            ScalarKind::Int32 | ScalarKind::UInt16 => Some(ColumnType::Int32),
            ScalarKind::Float32 => Some(ColumnType::Float),
            ScalarKind::Float64 | ScalarKind::UInt32 => Some(ColumnType::Double),
            ScalarKind::Int64 | ScalarKind::UInt64 | ScalarKind::Boolean => None,
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            ColumnType::String => 0,
            ColumnType::Int8 => 1,
            ColumnType::Int16 => 2,
            ColumnType::Int32 => 3,
            ColumnType::Float => 4,
            ColumnType::Double => 5,
            ColumnType::StringRef => 6,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(ColumnType::String),
            1 => Some(ColumnType::Int8),
            2 => Some(ColumnType::Int16),
            3 => Some(ColumnType::Int32),
            4 => Some(ColumnType::Float),
            5 => Some(ColumnType::Double),
            6 => Some(ColumnType::StringRef),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, ColumnType::String | ColumnType::StringRef)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Int8 => "int8",
            ColumnType::Int16 => "int16",
            ColumnType::Int32 => "int32",
            ColumnType::Float => "float",
            ColumnType::Double => "double",
            ColumnType::StringRef => "string_ref",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_wide_enough_columns() {
        assert_eq!(ColumnType::for_kind(ScalarKind::String), Some(ColumnType::String));
        assert_eq!(ColumnType::for_kind(ScalarKind::UInt8), Some(ColumnType::Int16));
        assert_eq!(ColumnType::for_kind(ScalarKind::UInt16), Some(ColumnType::Int32));
        assert_eq!(ColumnType::for_kind(ScalarKind::Float32), Some(ColumnType::Float));
        assert_eq!(ColumnType::for_kind(ScalarKind::Float64), Some(ColumnType::Double));
        assert_eq!(ColumnType::for_kind(ScalarKind::Int64), None);
        assert_eq!(ColumnType::for_kind(ScalarKind::Boolean), None);
    }

    #[test]
    fn codes_round_trip() {
        for code in 0..7 {
            let column = ColumnType::from_code(code).expect("known code");
            assert_eq!(column.code(), code);
        }
        assert_eq!(ColumnType::from_code(6), Some(ColumnType::StringRef));
        assert_eq!(ColumnType::from_code(7), None);
    }

    #[test]
    fn only_string_columns_are_textual() {
        assert!(!ColumnType::String.is_numeric());
        assert!(!ColumnType::StringRef.is_numeric());
        assert_eq!(ColumnType::StringRef.to_string(), "string_ref");
        assert!(ColumnType::Int8.is_numeric());
        assert!(ColumnType::Double.is_numeric());
    }
}
