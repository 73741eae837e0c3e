//! The generated command artifact

use crate::ast::{TypeMapping, Value, ValueKind};

/// A generated SQL command, ready to bind and execute
#[derive(Debug, Clone, PartialEq)]
pub struct RelationalCommand {
    /// SQL text
    pub command_text: String,
    /// Parameter bindings in the order they were first referenced
    pub parameters: Vec<RelationalParameter>,
    /// False when the text depends on the current parameter values, so the
    /// command must not be reused for other values
    pub cacheable: bool,
    /// How to read each projected column back
    pub materialization: Vec<TypeMaterializationInfo>,
    /// Diagnostics raised during generation (e.g. value-converting literals)
    pub warnings: Vec<String>,
}

impl RelationalCommand {
    /// Find a top-level parameter by invariant name
    pub fn parameter(&self, invariant_name: &str) -> Option<&RelationalParameter> {
        self.parameters
            .iter()
            .find(|p| p.invariant_name() == invariant_name)
    }
}

/// A parameter of a relational command
#[derive(Debug, Clone, PartialEq)]
pub enum RelationalParameter {
    /// One placeholder bound from the value map entry of the same name
    Single(ParameterBinding),
    /// A value-map entry holding an array, spread over generated placeholders
    Composite {
        invariant_name: String,
        members: Vec<ParameterBinding>,
    },
}

impl RelationalParameter {
    /// Key of this parameter in the parameter value map
    pub fn invariant_name(&self) -> &str {
        match self {
            Self::Single(binding) => &binding.invariant_name,
            Self::Composite { invariant_name, .. } => invariant_name,
        }
    }
}

/// How one placeholder is bound
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterBinding {
    /// Key in the parameter value map, or the generated name for members of a
    /// composite parameter
    pub invariant_name: String,
    /// Provider parameter name (e.g. `@id`)
    pub name: String,
    /// Token written into the SQL text
    pub placeholder: String,
    pub type_mapping: Option<TypeMapping>,
    pub nullable: bool,
    /// Captured value for generated parameters; None when bound by name
    pub value: Option<Value>,
}

impl ParameterBinding {
    pub fn new(
        invariant_name: impl Into<String>,
        name: impl Into<String>,
        placeholder: impl Into<String>,
        type_mapping: Option<TypeMapping>,
        nullable: bool,
    ) -> Self {
        Self {
            invariant_name: invariant_name.into(),
            name: name.into(),
            placeholder: placeholder.into(),
            type_mapping,
            nullable,
            value: None,
        }
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }
}

/// Result-reader metadata for one projected column
#[derive(Debug, Clone, PartialEq)]
pub struct TypeMaterializationInfo {
    /// Position in the projection list
    pub index: usize,
    /// Column name or alias, when the projection has one
    pub alias: Option<String>,
    pub kind: Option<ValueKind>,
    pub type_mapping: Option<TypeMapping>,
    pub nullable: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_lookup() {
        let command = RelationalCommand {
            command_text: "SELECT @id".to_string(),
            parameters: vec![
                RelationalParameter::Single(ParameterBinding::new("id", "@id", "@id", None, false)),
                RelationalParameter::Composite {
                    invariant_name: "args".to_string(),
                    members: vec![ParameterBinding::new("p0", "@p0", "@p0", None, false)
                        .with_value(Value::Integer(1))],
                },
            ],
            cacheable: false,
            materialization: Vec::new(),
            warnings: Vec::new(),
        };

        assert!(matches!(
            command.parameter("id"),
            Some(RelationalParameter::Single(b)) if b.name == "@id"
        ));
        match command.parameter("args") {
            Some(RelationalParameter::Composite { members, .. }) => {
                assert_eq!(members[0].value, Some(Value::Integer(1)));
            }
            other => panic!("Expected Composite, got {:?}", other),
        }
        assert!(command.parameter("p0").is_none());
    }
}
