//! Relational expression tree and SQL generation
//!
//! This module provides a type-safe representation of relational queries and
//! the generator that turns them into parameterized SQL commands. It knows
//! nothing about how the tree was built or how the command is executed.
//!
//! # Architecture
//!
//! - [`expr`]: scalar and predicate expressions
//! - [`stmt`]: SELECT expressions and table sources
//! - [`types`]: value kinds and type mappings
//! - [`params`]: runtime parameter values
//! - [`render`]: the SQL generator
//!
//! # Example
//!
//! ```rust,ignore
//! use relational_sqlgen::ast::*;
//! use relational_sqlgen::dialect::{DefaultTypeMappingSource, SqlServerSqlGenerationHelper};
//!
//! let select = SelectExpr::from_table(TableExpr::table("Customers", "c"))
//!     .project(Expr::column("c", "Id"))
//!     .with_predicate(Expr::column("c", "City").eq(Expr::string("London")));
//!
//! let helper = SqlServerSqlGenerationHelper;
//! let mappings = DefaultTypeMappingSource::sql_server();
//! let command = QuerySqlGenerator::new(&helper, &mappings)
//!     .generate(&select, &ParameterValues::new())?;
//! // SELECT [c].[Id]
//! // FROM [Customers] AS [c]
//! // WHERE [c].[City] = N'London'
//! ```

mod expr;
mod params;
mod render;
mod stmt;
mod types;

// Re-export all public types
pub use expr::*;
pub use params::*;
pub use render::*;
pub use stmt::*;
pub use types::*;
