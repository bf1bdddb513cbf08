/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Lookup tables for data types, memory orders and index modes.
//!
//! The integer codes are part of the binary metadata format (see
//! [`crate::meta`]) and must stay stable.

use serde::Deserialize;
use serde::Serialize;

/// The element kind stored in a view's buffer.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DType {
    Bool,
    Int8,
    Uint8,
    /// Unsigned 8-bit integers, clamped on write.
    Uint8c,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float32,
    Float64,
    /// Complex numbers with `f32` components.
    Complex64,
    /// Complex numbers with `f64` components.
    Complex128,
    /// Raw bytes.
    Binary,
    /// Untyped storage; elements have no fixed byte size.
    Generic,
}

impl DType {
    /// The code written into the binary metadata.
    pub fn code(self) -> i16 {
        match self {
            DType::Bool => 0,
            DType::Int8 => 1,
            DType::Uint8 => 2,
            DType::Uint8c => 3,
            DType::Int16 => 4,
            DType::Uint16 => 5,
            DType::Int32 => 6,
            DType::Uint32 => 7,
            DType::Float32 => 10,
            DType::Float64 => 11,
            DType::Complex64 => 12,
            DType::Complex128 => 13,
            DType::Binary => 14,
            DType::Generic => 15,
        }
    }

    /// Size of one element in bytes, or `None` for variable-size
    /// storage.
    pub fn bytes_per_element(self) -> Option<usize> {
        match self {
            DType::Bool | DType::Int8 | DType::Uint8 | DType::Uint8c | DType::Binary => Some(1),
            DType::Int16 | DType::Uint16 => Some(2),
            DType::Int32 | DType::Uint32 | DType::Float32 => Some(4),
            DType::Float64 | DType::Complex64 => Some(8),
            DType::Complex128 => Some(16),
            DType::Generic => None,
        }
    }

    /// Whether each element is a (real, imaginary) pair.
    pub fn is_complex(self) -> bool {
        matches!(self, DType::Complex64 | DType::Complex128)
    }

    /// The literal used to render a data block of this dtype. The
    /// placeholder `{{data}}` is replaced with the element list.
    pub(crate) fn literal_template(self) -> &'static str {
        match self {
            DType::Bool => "new BooleanArray( [ {{data}} ] )",
            DType::Int8 => "new Int8Array( [ {{data}} ] )",
            DType::Uint8 => "new Uint8Array( [ {{data}} ] )",
            DType::Uint8c => "new Uint8ClampedArray( [ {{data}} ] )",
            DType::Int16 => "new Int16Array( [ {{data}} ] )",
            DType::Uint16 => "new Uint16Array( [ {{data}} ] )",
            DType::Int32 => "new Int32Array( [ {{data}} ] )",
            DType::Uint32 => "new Uint32Array( [ {{data}} ] )",
            DType::Float32 => "new Float32Array( [ {{data}} ] )",
            DType::Float64 => "new Float64Array( [ {{data}} ] )",
            DType::Complex64 => "new Complex64Array( [ {{data}} ] )",
            DType::Complex128 => "new Complex128Array( [ {{data}} ] )",
            DType::Binary => "new Buffer( [ {{data}} ] )",
            DType::Generic => "[ {{data}} ]",
        }
    }
}

/// The nominal nesting order of a view. Offsets are computed from
/// strides alone; the order decides how a linear index decomposes
/// into subscripts.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Order {
    /// Last dimension varies fastest.
    RowMajor,
    /// First dimension varies fastest.
    ColumnMajor,
}

impl Order {
    pub fn code(self) -> i8 {
        match self {
            Order::RowMajor => 101,
            Order::ColumnMajor => 102,
        }
    }
}

/// How a consumer of the metadata should treat out-of-range indices.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    strum::Display,
    strum::EnumString,
    strum::EnumIter
)]
#[strum(serialize_all = "lowercase")]
pub enum IndexMode {
    #[default]
    Throw,
    Normalize,
    Clamp,
    Wrap,
}

impl IndexMode {
    pub fn code(self) -> i8 {
        match self {
            IndexMode::Throw => 1,
            IndexMode::Clamp => 2,
            IndexMode::Wrap => 3,
            IndexMode::Normalize => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_dtype_names() {
        assert_eq!(DType::Float64.to_string(), "float64");
        assert_eq!(DType::Uint8c.to_string(), "uint8c");
        assert_eq!(DType::from_str("complex128").unwrap(), DType::Complex128);
        assert!(DType::from_str("float16").is_err());
        for dtype in DType::iter() {
            let json = serde_json::to_string(&dtype).unwrap();
            assert_eq!(json, format!("\"{}\"", dtype));
        }
    }

    #[test]
    fn test_dtype_codes_unique() {
        let codes: HashSet<_> = DType::iter().map(DType::code).collect();
        assert_eq!(codes.len(), DType::iter().count());
    }

    #[test]
    fn test_metadata_codes() {
        let dtypes: Vec<(DType, i16)> = DType::iter().map(|d| (d, d.code())).collect();
        assert_eq!(
            dtypes,
            vec![
                (DType::Bool, 0),
                (DType::Int8, 1),
                (DType::Uint8, 2),
                (DType::Uint8c, 3),
                (DType::Int16, 4),
                (DType::Uint16, 5),
                (DType::Int32, 6),
                (DType::Uint32, 7),
                (DType::Float32, 10),
                (DType::Float64, 11),
                (DType::Complex64, 12),
                (DType::Complex128, 13),
                (DType::Binary, 14),
                (DType::Generic, 15),
            ]
        );
        assert_eq!(Order::RowMajor.code(), 101);
        assert_eq!(Order::ColumnMajor.code(), 102);
        assert_eq!(IndexMode::Throw.code(), 1);
        assert_eq!(IndexMode::Clamp.code(), 2);
        assert_eq!(IndexMode::Wrap.code(), 3);
        assert_eq!(IndexMode::Normalize.code(), 4);
    }

    #[test]
    fn test_bytes_per_element() {
        assert_eq!(DType::Float64.bytes_per_element(), Some(8));
        assert_eq!(DType::Complex64.bytes_per_element(), Some(8));
        assert_eq!(DType::Complex128.bytes_per_element(), Some(16));
        assert_eq!(DType::Bool.bytes_per_element(), Some(1));
        assert_eq!(DType::Generic.bytes_per_element(), None);
    }

    #[test]
    fn test_order_and_mode_names() {
        assert_eq!(Order::RowMajor.to_string(), "row-major");
        assert_eq!(Order::from_str("column-major").unwrap(), Order::ColumnMajor);
        assert_eq!(
            serde_json::to_string(&Order::ColumnMajor).unwrap(),
            "\"column-major\""
        );
        assert_eq!(IndexMode::default(), IndexMode::Throw);
        assert_eq!(IndexMode::from_str("wrap").unwrap().code(), 3);
    }
}
