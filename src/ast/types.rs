//! Value kinds and type mappings
//!
//! A [`TypeMapping`] ties a store type (e.g. `nvarchar(max)`, `boolean`) to the
//! kind of runtime value it holds and knows how to spell that value as an
//! inline SQL literal. Mappings are resolved either from a sibling column
//! (the ambient mapping) or from a [`TypeMappingSource`](crate::dialect::TypeMappingSource).

use super::params::Value;
use crate::error::{SqlGenError, SqlGenResult};
use std::fmt::Write;

/// The kind of a runtime value, independent of any store type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Integer,
    Float,
    String,
    Bytes,
    Json,
    /// Integer-backed enumeration
    Enum,
}

/// Static type of a parameter placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueType {
    /// Kind of the value, or of each element for collections
    pub kind: ValueKind,
    /// Whether the host type admits null
    pub nullable: bool,
    /// Whether the parameter holds a collection (e.g. the right side of `IN`)
    pub collection: bool,
}

impl ValueType {
    pub fn scalar(kind: ValueKind) -> Self {
        Self {
            kind,
            nullable: false,
            collection: false,
        }
    }

    pub fn nullable(kind: ValueKind) -> Self {
        Self {
            kind,
            nullable: true,
            collection: false,
        }
    }

    pub fn collection(element_kind: ValueKind) -> Self {
        Self {
            kind: element_kind,
            nullable: false,
            collection: true,
        }
    }
}

/// How a mapping spells literals of its store type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralFormat {
    /// Numbers as-is, booleans as `TRUE`/`FALSE`, strings in single quotes
    Plain,
    /// Booleans as `1`/`0`
    BitBoolean,
    /// Strings prefixed with `N`
    UnicodeString,
    /// Binary as `0x0A0B`
    HexBinary,
    /// Binary as `X'0A0B'`
    BlobBinary,
    /// Binary as `'\x0A0B'`
    ByteaBinary,
}

/// Converts a host value to the value actually stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueConverter {
    /// `true`/`false` stored as `1`/`0`
    BoolToZeroOne,
    /// Booleans stored as two fixed strings
    BoolToString {
        true_value: String,
        false_value: String,
    },
    /// Enum ordinals stored by label; ordinal `n` maps to `labels[n]`
    EnumToString(Vec<String>),
    /// Numbers stored as their decimal text
    NumberToString,
}

impl ValueConverter {
    /// Convert a host value. Values the converter does not understand pass through.
    pub fn convert(&self, value: &Value) -> Value {
        match (self, value) {
            (Self::BoolToZeroOne, Value::Bool(b)) => Value::Integer(i64::from(*b)),
            (
                Self::BoolToString {
                    true_value,
                    false_value,
                },
                Value::Bool(b),
            ) => Value::String(if *b { true_value } else { false_value }.clone()),
            (Self::EnumToString(labels), Value::Integer(n)) => usize::try_from(*n)
                .ok()
                .and_then(|i| labels.get(i))
                .map(|label| Value::String(label.clone()))
                .unwrap_or_else(|| value.clone()),
            (Self::NumberToString, Value::Integer(n)) => Value::String(n.to_string()),
            (Self::NumberToString, Value::Float(f)) => Value::String(f.to_string()),
            _ => value.clone(),
        }
    }
}

/// Mapping between a value kind and a store type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeMapping {
    /// Store type name as it appears in DDL and `CAST`
    pub store_type: String,
    pub kind: ValueKind,
    pub literal_format: LiteralFormat,
    /// Present when the stored value differs from the host value
    pub converter: Option<ValueConverter>,
}

impl TypeMapping {
    pub fn new(store_type: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            store_type: store_type.into(),
            kind,
            literal_format: LiteralFormat::Plain,
            converter: None,
        }
    }

    pub fn with_literal_format(mut self, format: LiteralFormat) -> Self {
        self.literal_format = format;
        self
    }

    pub fn with_converter(mut self, converter: ValueConverter) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Whether a value of `kind` can be formatted through this mapping.
    ///
    /// Kinds must match exactly, except that integers and integer-backed
    /// enums are interchangeable.
    pub fn accepts(&self, kind: ValueKind) -> bool {
        self.kind == kind
            || matches!(
                (self.kind, kind),
                (ValueKind::Enum, ValueKind::Integer) | (ValueKind::Integer, ValueKind::Enum)
            )
    }

    /// Render `value` as an inline SQL literal of this store type
    pub fn generate_literal(&self, value: &Value) -> SqlGenResult<String> {
        let converted;
        let value = match &self.converter {
            Some(converter) => {
                converted = converter.convert(value);
                &converted
            }
            None => value,
        };

        let literal = match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => match (self.literal_format, b) {
                (LiteralFormat::BitBoolean, true) => "1".to_string(),
                (LiteralFormat::BitBoolean, false) => "0".to_string(),
                (_, true) => "TRUE".to_string(),
                (_, false) => "FALSE".to_string(),
            },
            Value::Integer(n) => n.to_string(),
            Value::Float(f) => format_float(*f, &self.store_type)?,
            Value::String(s) => self.quote(s),
            Value::Json(json) => self.quote(&json.to_string()),
            Value::Bytes(bytes) => format_bytes(bytes, self.literal_format),
            Value::Array(_) => {
                return Err(SqlGenError::unsupported_type(format!(
                    "array literal of store type '{}'",
                    self.store_type
                )))
            }
        };
        Ok(literal)
    }

    fn quote(&self, s: &str) -> String {
        let mut out = String::with_capacity(s.len() + 3);
        if self.literal_format == LiteralFormat::UnicodeString {
            out.push('N');
        }
        out.push('\'');
        out.push_str(&s.replace('\'', "''"));
        out.push('\'');
        out
    }
}

fn format_float(f: f64, store_type: &str) -> SqlGenResult<String> {
    if !f.is_finite() {
        return Err(SqlGenError::unsupported_type(format!(
            "non-finite float literal {} of store type '{}'",
            f, store_type
        )));
    }
    // Keep integral floats distinguishable from integers: 2.0, not 2
    if f.fract() == 0.0 && f.abs() < 1e16 {
        Ok(format!("{:.1}", f))
    } else {
        Ok(format!("{}", f))
    }
}

fn format_bytes(bytes: &[u8], format: LiteralFormat) -> String {
    let mut hex = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(hex, "{:02X}", b);
    }
    match format {
        LiteralFormat::BlobBinary => format!("X'{}'", hex),
        LiteralFormat::ByteaBinary => format!("'\\x{}'", hex),
        _ => format!("0x{}", hex),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_literals() {
        let bit = TypeMapping::new("bit", ValueKind::Bool).with_literal_format(LiteralFormat::BitBoolean);
        assert_eq!(bit.generate_literal(&Value::Bool(true)).unwrap(), "1");
        assert_eq!(bit.generate_literal(&Value::Bool(false)).unwrap(), "0");

        let keyword = TypeMapping::new("boolean", ValueKind::Bool);
        assert_eq!(keyword.generate_literal(&Value::Bool(true)).unwrap(), "TRUE");
    }

    #[test]
    fn test_string_literals() {
        let nvarchar = TypeMapping::new("nvarchar(max)", ValueKind::String)
            .with_literal_format(LiteralFormat::UnicodeString);
        assert_eq!(
            nvarchar.generate_literal(&Value::from("it's")).unwrap(),
            "N'it''s'"
        );

        let text = TypeMapping::new("text", ValueKind::String);
        assert_eq!(text.generate_literal(&Value::from("London")).unwrap(), "'London'");
    }

    #[test]
    fn test_numeric_literals() {
        let float = TypeMapping::new("float", ValueKind::Float);
        assert_eq!(float.generate_literal(&Value::Float(2.0)).unwrap(), "2.0");
        assert_eq!(float.generate_literal(&Value::Float(1.5)).unwrap(), "1.5");

        let int = TypeMapping::new("int", ValueKind::Integer);
        assert_eq!(int.generate_literal(&Value::Integer(-7)).unwrap(), "-7");
        assert_eq!(int.generate_literal(&Value::Null).unwrap(), "NULL");
    }

    #[test]
    fn test_binary_literals() {
        let bytes = Value::Bytes(vec![0xDE, 0xAD, 0x01]);
        let hex = TypeMapping::new("varbinary(max)", ValueKind::Bytes)
            .with_literal_format(LiteralFormat::HexBinary);
        assert_eq!(hex.generate_literal(&bytes).unwrap(), "0xDEAD01");

        let blob = TypeMapping::new("BLOB", ValueKind::Bytes)
            .with_literal_format(LiteralFormat::BlobBinary);
        assert_eq!(blob.generate_literal(&bytes).unwrap(), "X'DEAD01'");

        let bytea = TypeMapping::new("bytea", ValueKind::Bytes)
            .with_literal_format(LiteralFormat::ByteaBinary);
        assert_eq!(bytea.generate_literal(&bytes).unwrap(), "'\\xDEAD01'");
    }

    #[test]
    fn test_converters() {
        let status = TypeMapping::new("nvarchar(20)", ValueKind::Enum)
            .with_literal_format(LiteralFormat::UnicodeString)
            .with_converter(ValueConverter::EnumToString(vec![
                "Active".to_string(),
                "Closed".to_string(),
            ]));
        assert_eq!(status.generate_literal(&Value::Integer(1)).unwrap(), "N'Closed'");
        // Unknown ordinals fall through unconverted
        assert_eq!(status.generate_literal(&Value::Integer(9)).unwrap(), "9");

        let yes_no = TypeMapping::new("char(1)", ValueKind::Bool).with_converter(
            ValueConverter::BoolToString {
                true_value: "Y".to_string(),
                false_value: "N".to_string(),
            },
        );
        assert_eq!(yes_no.generate_literal(&Value::Bool(false)).unwrap(), "'N'");

        let zero_one = TypeMapping::new("int", ValueKind::Bool)
            .with_converter(ValueConverter::BoolToZeroOne);
        assert_eq!(zero_one.generate_literal(&Value::Bool(true)).unwrap(), "1");
    }

    #[test]
    fn test_accepts() {
        let int = TypeMapping::new("int", ValueKind::Integer);
        assert!(int.accepts(ValueKind::Integer));
        assert!(int.accepts(ValueKind::Enum));
        assert!(!int.accepts(ValueKind::String));

        let status = TypeMapping::new("int", ValueKind::Enum);
        assert!(status.accepts(ValueKind::Integer));
        assert!(!status.accepts(ValueKind::Bool));
    }

    #[test]
    fn test_array_literal_is_unsupported() {
        let int = TypeMapping::new("int", ValueKind::Integer);
        let err = int
            .generate_literal(&Value::Array(vec![Value::Integer(1)]))
            .unwrap_err();
        assert!(matches!(err, SqlGenError::UnsupportedType(_)));
    }

    #[test]
    fn test_non_finite_float_literal_is_unsupported() {
        let float = TypeMapping::new("float", ValueKind::Float);
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = float.generate_literal(&Value::Float(value)).unwrap_err();
            assert!(matches!(err, SqlGenError::UnsupportedType(_)));
        }
        assert_eq!(float.generate_literal(&Value::Float(2.0)).unwrap(), "2.0");
    }
}
