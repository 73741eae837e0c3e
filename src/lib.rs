//! Relational SQL generation
//!
//! Converts a relational expression tree (projection, filter, joins,
//! grouping, ordering, paging, sub-selects) into parameterized SQL text plus
//! the metadata needed to bind parameters and read result rows back.
//!
//! - [`ast`]: the expression tree and the SQL generator
//! - [`optimizer`]: normalization passes run before each sub-tree is emitted
//! - [`dialect`]: identifier quoting, literal spelling and store types
//! - [`command`]: the generated command and its builder
//! - [`error`]: generation errors

pub mod ast;
pub mod command;
pub mod dialect;
pub mod error;
pub mod optimizer;

pub use ast::{ParameterValues, QuerySqlGenerator, SelectExpr};
pub use command::RelationalCommand;
pub use error::{SqlGenError, SqlGenResult};
pub use optimizer::Position;
