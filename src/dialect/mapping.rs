//! Type mapping sources

use crate::ast::{LiteralFormat, TypeMapping, Value, ValueKind};
use std::collections::HashMap;

/// Looks up store types for value kinds
pub trait TypeMappingSource {
    /// Mapping for a value kind, if the dialect has one
    fn find_mapping(&self, kind: ValueKind) -> Option<TypeMapping>;

    /// Mapping for a runtime value. Null and arrays have none.
    fn mapping_for_value(&self, value: &Value) -> Option<TypeMapping> {
        value.kind().and_then(|kind| self.find_mapping(kind))
    }
}

/// Table-driven mapping source
#[derive(Debug, Clone, Default)]
pub struct DefaultTypeMappingSource {
    mappings: HashMap<ValueKind, TypeMapping>,
}

impl DefaultTypeMappingSource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the mapping for its kind
    pub fn with_mapping(mut self, mapping: TypeMapping) -> Self {
        self.mappings.insert(mapping.kind, mapping);
        self
    }

    pub fn sql_server() -> Self {
        Self::new()
            .with_mapping(
                TypeMapping::new("bit", ValueKind::Bool)
                    .with_literal_format(LiteralFormat::BitBoolean),
            )
            .with_mapping(TypeMapping::new("int", ValueKind::Integer))
            .with_mapping(TypeMapping::new("int", ValueKind::Enum))
            .with_mapping(TypeMapping::new("float", ValueKind::Float))
            .with_mapping(
                TypeMapping::new("nvarchar(max)", ValueKind::String)
                    .with_literal_format(LiteralFormat::UnicodeString),
            )
            .with_mapping(
                TypeMapping::new("nvarchar(max)", ValueKind::Json)
                    .with_literal_format(LiteralFormat::UnicodeString),
            )
            .with_mapping(
                TypeMapping::new("varbinary(max)", ValueKind::Bytes)
                    .with_literal_format(LiteralFormat::HexBinary),
            )
    }

    pub fn postgres() -> Self {
        Self::new()
            .with_mapping(TypeMapping::new("boolean", ValueKind::Bool))
            .with_mapping(TypeMapping::new("integer", ValueKind::Integer))
            .with_mapping(TypeMapping::new("integer", ValueKind::Enum))
            .with_mapping(TypeMapping::new("double precision", ValueKind::Float))
            .with_mapping(TypeMapping::new("text", ValueKind::String))
            .with_mapping(TypeMapping::new("jsonb", ValueKind::Json))
            .with_mapping(
                TypeMapping::new("bytea", ValueKind::Bytes)
                    .with_literal_format(LiteralFormat::ByteaBinary),
            )
    }

    pub fn sqlite() -> Self {
        Self::new()
            .with_mapping(
                TypeMapping::new("INTEGER", ValueKind::Bool)
                    .with_literal_format(LiteralFormat::BitBoolean),
            )
            .with_mapping(TypeMapping::new("INTEGER", ValueKind::Integer))
            .with_mapping(TypeMapping::new("INTEGER", ValueKind::Enum))
            .with_mapping(TypeMapping::new("REAL", ValueKind::Float))
            .with_mapping(TypeMapping::new("TEXT", ValueKind::String))
            .with_mapping(TypeMapping::new("TEXT", ValueKind::Json))
            .with_mapping(
                TypeMapping::new("BLOB", ValueKind::Bytes)
                    .with_literal_format(LiteralFormat::BlobBinary),
            )
    }
}

impl TypeMappingSource for DefaultTypeMappingSource {
    fn find_mapping(&self, kind: ValueKind) -> Option<TypeMapping> {
        self.mappings.get(&kind).cloned()
    }
}
