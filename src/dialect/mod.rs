//! Dialect hooks
//!
//! The generator is dialect-agnostic. Everything that differs between
//! database engines is behind two traits:
//!
//! - [`SqlGenerationHelper`]: identifier quoting, parameter naming, typed
//!   boolean literals, paging syntax and the other spelling hooks
//! - [`TypeMappingSource`]: store types for value kinds
//!
//! Built-in helpers are provided for SQL Server, PostgreSQL and SQLite.

mod helpers;
mod mapping;

pub use helpers::*;
pub use mapping::*;

/// How LIMIT/OFFSET are spelled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingStyle {
    /// `SELECT TOP(n)` without an offset, `OFFSET n ROWS FETCH NEXT m ROWS ONLY` with one
    TopOffsetFetch,
    /// `LIMIT m OFFSET n`
    LimitOffset {
        /// Emit `LIMIT -1` when only an offset is present
        offset_requires_limit: bool,
    },
}

/// Dialect-specific spelling used by the generator
pub trait SqlGenerationHelper {
    /// Delimit a single identifier, escaping embedded delimiters
    fn delimit_identifier(&self, identifier: &str) -> String;

    /// Delimit an identifier with an optional schema qualifier
    fn delimit_identifier_with_schema(&self, name: &str, schema: Option<&str>) -> String {
        match schema {
            Some(schema) if !schema.is_empty() => format!(
                "{}.{}",
                self.delimit_identifier(schema),
                self.delimit_identifier(name)
            ),
            _ => self.delimit_identifier(name),
        }
    }

    /// Name under which a parameter is bound (e.g. `@id`)
    fn generate_parameter_name(&self, name: &str) -> String {
        format!("@{}", name)
    }

    /// Token written into the SQL text for a parameter
    fn generate_parameter_name_placeholder(&self, name: &str) -> String {
        self.generate_parameter_name(name)
    }

    /// FROM clause for SELECTs without table sources, e.g. `FROM DUAL`
    fn pseudo_from_clause(&self) -> Option<&str> {
        None
    }

    /// Boolean `true` as a typed scalar value (CASE results)
    fn typed_true_literal(&self) -> &str;

    /// Boolean `false` as a typed scalar value (CASE results)
    fn typed_false_literal(&self) -> &str;

    fn alias_separator(&self) -> &str {
        " AS "
    }

    fn single_line_comment_token(&self) -> &str {
        "--"
    }

    fn paging_style(&self) -> PagingStyle {
        PagingStyle::LimitOffset {
            offset_requires_limit: false,
        }
    }
}
