//! Command assembly
//!
//! This module holds what the generator produces and the tools it uses to
//! produce it:
//!
//! - the command text builder with its parameter registry
//! - the [`RelationalCommand`] artifact with parameter bindings and result
//!   materialization metadata
//! - telemetry and logging for generation
//!
//! ```text
//! RelationalCommand
//!   ├── command_text: String
//!   ├── parameters: Vec<RelationalParameter>
//!   ├── cacheable: bool
//!   ├── materialization: Vec<TypeMaterializationInfo>
//!   └── warnings: Vec<String>
//! ```

mod builder;
mod relational;
mod telemetry;

pub use builder::*;
pub use relational::*;
pub use telemetry::*;
