//! Command text builder
//!
//! Accumulates SQL text with lazy indentation: the indent for a line is
//! written only when the first non-empty text lands on it, so blank lines
//! carry no trailing spaces. Parameters are registered alongside the text,
//! once per invariant name.

use super::relational::{ParameterBinding, RelationalParameter};

const INDENT: &str = "    ";

/// Default buffer capacity for simple queries
const DEFAULT_BUFFER_CAPACITY: usize = 1024;

/// Builds the text and parameter list of one command
#[derive(Debug)]
pub struct RelationalCommandBuilder {
    text: String,
    indent_level: usize,
    indent_pending: bool,
    parameters: Vec<RelationalParameter>,
}

impl Default for RelationalCommandBuilder {
    fn default() -> Self {
        Self {
            text: String::with_capacity(DEFAULT_BUFFER_CAPACITY),
            indent_level: 0,
            indent_pending: true,
            parameters: Vec::new(),
        }
    }
}

impl RelationalCommandBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append text to the current line
    pub fn append(&mut self, s: &str) -> &mut Self {
        if !s.is_empty() {
            self.write_indent();
            self.text.push_str(s);
        }
        self
    }

    /// Append text and end the line
    pub fn append_line(&mut self, s: &str) -> &mut Self {
        self.append(s);
        self.text.push('\n');
        self.indent_pending = true;
        self
    }

    /// End the current line
    pub fn new_line(&mut self) -> &mut Self {
        self.append_line("")
    }

    /// Append multi-line text, one line at a time at the current indent
    pub fn append_lines(&mut self, s: &str) -> &mut Self {
        for line in s.lines() {
            self.append_line(line);
        }
        self
    }

    pub fn increment_indent(&mut self) -> &mut Self {
        self.indent_level += 1;
        self
    }

    pub fn decrement_indent(&mut self) -> &mut Self {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
        self
    }

    /// Whether a parameter or composite member with this invariant name is
    /// already registered
    pub fn has_parameter(&self, invariant_name: &str) -> bool {
        self.parameters.iter().any(|p| match p {
            RelationalParameter::Single(binding) => binding.invariant_name == invariant_name,
            RelationalParameter::Composite {
                invariant_name: name,
                members,
            } => {
                name == invariant_name
                    || members.iter().any(|m| m.invariant_name == invariant_name)
            }
        })
    }

    /// Register a parameter unless one with the same invariant name exists.
    /// Returns whether it was added.
    pub fn add_parameter(&mut self, binding: ParameterBinding) -> bool {
        if self.has_parameter(&binding.invariant_name) {
            return false;
        }
        self.parameters.push(RelationalParameter::Single(binding));
        true
    }

    /// Register a parameter expanded into several generated members
    pub fn add_composite_parameter(
        &mut self,
        invariant_name: impl Into<String>,
        members: Vec<ParameterBinding>,
    ) -> bool {
        let invariant_name = invariant_name.into();
        if self.has_parameter(&invariant_name) {
            return false;
        }
        self.parameters.push(RelationalParameter::Composite {
            invariant_name,
            members,
        });
        true
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Take the accumulated text and parameters
    pub fn into_parts(self) -> (String, Vec<RelationalParameter>) {
        (self.text, self.parameters)
    }

    fn write_indent(&mut self) {
        if self.indent_pending {
            for _ in 0..self.indent_level {
                self.text.push_str(INDENT);
            }
            self.indent_pending = false;
        }
    }
}

/// Generates unique names for parameters created during generation
#[derive(Debug, Default)]
pub struct ParameterNameGenerator {
    count: usize,
}

impl ParameterNameGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `p0`, `p1`, ...
    pub fn generate_next(&mut self) -> String {
        let name = format!("p{}", self.count);
        self.count += 1;
        name
    }

    /// Next generated name for which `in_use` is false
    pub fn generate_unused(&mut self, in_use: impl Fn(&str) -> bool) -> String {
        loop {
            let name = self.generate_next();
            if !in_use(&name) {
                return name;
            }
        }
    }
}
