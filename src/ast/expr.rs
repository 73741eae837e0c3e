//! Relational expression types
//!
//! This module defines the closed set of scalar and predicate expressions that
//! can appear in a relational tree: columns, literals, parameters, operators,
//! function calls, CASE, IN, EXISTS, LIKE and scalar sub-selects.
//!
//! The tree is produced upstream and read here; every rewrite pass returns a
//! new tree instead of mutating the input.

use super::params::Value;
use super::stmt::SelectExpr;
use super::types::{TypeMapping, ValueKind, ValueType};
use std::convert::Infallible;

/// An SQL identifier (table, column or alias name)
///
/// Identifiers are always delimited by the dialect when rendered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident(pub String);

impl Ident {
    /// Create a new identifier from any string-like type
    #[inline]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the identifier as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Ident {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Ident {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to a column of a table source in scope
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    /// Alias of the table source (e.g., "c" in "[c].[Id]")
    pub table_alias: Ident,
    /// Column name
    pub name: Ident,
    /// Store type of the column, when known
    pub type_mapping: Option<TypeMapping>,
    /// Whether the column admits NULL
    pub nullable: bool,
}

impl ColumnRef {
    pub fn new(table_alias: impl Into<Ident>, name: impl Into<Ident>) -> Self {
        Self {
            table_alias: table_alias.into(),
            name: name.into(),
            type_mapping: None,
            nullable: false,
        }
    }

    pub fn with_type_mapping(mut self, mapping: TypeMapping) -> Self {
        self.type_mapping = Some(mapping);
        self
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }
}

/// Reference to a named parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParamRef {
    /// Invariant name, the key into the parameter value map
    pub name: String,
    /// Static type of the bound value
    pub value_type: ValueType,
}

impl ParamRef {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Comparison
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Logical
    And,
    Or,

    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,

    /// Rendered as COALESCE(left, right)
    Coalesce,
}

impl BinaryOperator {
    /// Get the SQL representation of this operator
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::Coalesce => "COALESCE",
        }
    }

    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::NotEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq
        )
    }

    pub const fn is_logical(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    /// The comparison that holds exactly when this one does not
    pub const fn negated(self) -> Option<Self> {
        match self {
            Self::Eq => Some(Self::NotEq),
            Self::NotEq => Some(Self::Eq),
            Self::Lt => Some(Self::GtEq),
            Self::LtEq => Some(Self::Gt),
            Self::Gt => Some(Self::LtEq),
            Self::GtEq => Some(Self::Lt),
            _ => None,
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
    Negate,
    /// Host-side conversion; renders as its operand
    Convert,
}

/// A function call expression
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    /// Schema (e.g., "dbo")
    pub schema: Option<Ident>,
    /// Function name, written verbatim
    pub name: String,
    /// Receiver for instance-style calls (`x.method(...)`)
    pub instance: Option<Box<Expr>>,
    pub args: Vec<Expr>,
    /// Niladic functions render without parentheses (e.g., CURRENT_TIMESTAMP)
    pub niladic: bool,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self {
            schema: None,
            name: name.into(),
            instance: None,
            args,
            niladic: false,
        }
    }

    pub fn niladic(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
            instance: None,
            args: Vec::new(),
            niladic: true,
        }
    }

    pub fn with_schema(mut self, schema: impl Into<Ident>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_instance(mut self, instance: Expr) -> Self {
        self.instance = Some(Box::new(instance));
        self
    }
}

/// CASE expression
#[derive(Debug, Clone, PartialEq)]
pub struct CaseExpr {
    /// CASE <operand> (simple case) vs CASE WHEN (searched case)
    pub operand: Option<Box<Expr>>,
    /// WHEN ... THEN ... pairs
    pub when_clauses: Vec<(Expr, Expr)>,
    /// ELSE clause
    pub else_clause: Option<Box<Expr>>,
}

impl CaseExpr {
    /// Create a searched CASE expression (CASE WHEN ... THEN ...)
    pub fn searched(when_clauses: Vec<(Expr, Expr)>, else_clause: Option<Expr>) -> Self {
        Self {
            operand: None,
            when_clauses,
            else_clause: else_clause.map(Box::new),
        }
    }

    /// Create a simple CASE expression (CASE x WHEN ... THEN ...)
    pub fn simple(
        operand: Expr,
        when_clauses: Vec<(Expr, Expr)>,
        else_clause: Option<Expr>,
    ) -> Self {
        Self {
            operand: Some(Box::new(operand)),
            when_clauses,
            else_clause: else_clause.map(Box::new),
        }
    }
}

/// Right-hand side of an IN expression
#[derive(Debug, Clone, PartialEq)]
pub enum InValues {
    /// Explicit values. An element may itself be an array literal or a
    /// collection-typed parameter; both are expanded before emission.
    List(Vec<Expr>),
    /// IN (SELECT ...)
    Subquery(Box<SelectExpr>),
}

/// The main expression enum encompassing all scalar and predicate expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference: alias.column
    Column(ColumnRef),

    /// Projection alias: expr AS alias
    Alias { expr: Box<Expr>, alias: Ident },

    /// Binary operation: expr op expr
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },

    /// Unary operation: op expr
    UnaryOp { op: UnaryOperator, expr: Box<Expr> },

    /// CASE expression
    Case(CaseExpr),

    /// Function call
    FunctionCall(FunctionCall),

    /// expr IN (values | subquery)
    In {
        operand: Box<Expr>,
        values: InValues,
    },

    /// EXISTS (subquery)
    Exists(Box<SelectExpr>),

    /// expr IS NULL; IS NOT NULL is Not(IsNull)
    IsNull(Box<Expr>),

    /// match LIKE pattern [ESCAPE escape]
    Like {
        matched: Box<Expr>,
        pattern: Box<Expr>,
        escape: Option<Box<Expr>>,
    },

    /// Raw SQL text, written verbatim
    Fragment(String),

    /// Inline constant
    Literal(Value),

    /// Parameter placeholder
    Parameter(ParamRef),

    /// Scalar sub-select: (SELECT ...)
    Select(Box<SelectExpr>),

    /// Explicit cast: CAST(expr AS store_type)
    Cast { expr: Box<Expr>, target: ValueKind },
}

impl From<ColumnRef> for Expr {
    fn from(col: ColumnRef) -> Self {
        Self::Column(col)
    }
}

impl Expr {
    // Convenience constructors

    /// Create a column reference with no type information
    pub fn column(table_alias: impl Into<Ident>, name: impl Into<Ident>) -> Self {
        Self::Column(ColumnRef::new(table_alias, name))
    }

    /// Create a NULL literal
    pub fn null() -> Self {
        Self::Literal(Value::Null)
    }

    /// Create a boolean literal
    pub fn bool(b: bool) -> Self {
        Self::Literal(Value::Bool(b))
    }

    /// Create an integer literal
    pub fn int(n: i64) -> Self {
        Self::Literal(Value::Integer(n))
    }

    /// Create a string literal
    pub fn string(s: impl Into<String>) -> Self {
        Self::Literal(Value::String(s.into()))
    }

    /// Create a literal from any value
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Create a parameter placeholder
    pub fn param(name: impl Into<String>, value_type: ValueType) -> Self {
        Self::Parameter(ParamRef::new(name, value_type))
    }

    /// Create a raw SQL fragment
    pub fn fragment(sql: impl Into<String>) -> Self {
        Self::Fragment(sql.into())
    }

    /// Create a binary operation
    pub fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Self {
        Self::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Create a unary operation
    pub fn unary(op: UnaryOperator, expr: Expr) -> Self {
        Self::UnaryOp {
            op,
            expr: Box::new(expr),
        }
    }

    /// Create a NOT expression
    pub fn not(expr: Expr) -> Self {
        Self::unary(UnaryOperator::Not, expr)
    }

    /// Create a host conversion wrapper
    pub fn convert(expr: Expr) -> Self {
        Self::unary(UnaryOperator::Convert, expr)
    }

    /// Create an IS NULL expression
    pub fn is_null(expr: Expr) -> Self {
        Self::IsNull(Box::new(expr))
    }

    /// Create an IS NOT NULL expression
    pub fn is_not_null(expr: Expr) -> Self {
        Self::not(Self::is_null(expr))
    }

    /// Create an IN list
    pub fn in_list(operand: Expr, values: Vec<Expr>) -> Self {
        Self::In {
            operand: Box::new(operand),
            values: InValues::List(values),
        }
    }

    /// Create an IN sub-select
    pub fn in_subquery(operand: Expr, subquery: SelectExpr) -> Self {
        Self::In {
            operand: Box::new(operand),
            values: InValues::Subquery(Box::new(subquery)),
        }
    }

    /// Create an EXISTS expression
    pub fn exists(subquery: SelectExpr) -> Self {
        Self::Exists(Box::new(subquery))
    }

    /// Create a LIKE expression
    pub fn like(matched: Expr, pattern: Expr) -> Self {
        Self::Like {
            matched: Box::new(matched),
            pattern: Box::new(pattern),
            escape: None,
        }
    }

    /// Create a function call
    pub fn function(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::FunctionCall(FunctionCall::new(name, args))
    }

    /// Create a cast
    pub fn cast(expr: Expr, target: ValueKind) -> Self {
        Self::Cast {
            expr: Box::new(expr),
            target,
        }
    }

    /// Wrap in an alias
    pub fn alias(self, alias: impl Into<Ident>) -> Self {
        Self::Alias {
            expr: Box::new(self),
            alias: alias.into(),
        }
    }

    /// Combine with AND
    pub fn and(self, other: Expr) -> Self {
        Self::binary(self, BinaryOperator::And, other)
    }

    /// Combine with OR
    pub fn or(self, other: Expr) -> Self {
        Self::binary(self, BinaryOperator::Or, other)
    }

    /// Check equality
    pub fn eq(self, other: Expr) -> Self {
        Self::binary(self, BinaryOperator::Eq, other)
    }

    /// Check inequality
    pub fn not_eq(self, other: Expr) -> Self {
        Self::binary(self, BinaryOperator::NotEq, other)
    }

    // Inspection helpers

    /// Strip any host conversion wrappers
    pub fn remove_convert(&self) -> &Expr {
        let mut expr = self;
        while let Expr::UnaryOp {
            op: UnaryOperator::Convert,
            expr: inner,
        } = expr
        {
            expr = inner;
        }
        expr
    }

    /// Leaves that can be compared to a boolean literal without wrapping
    pub fn is_simple(&self) -> bool {
        matches!(
            self.remove_convert(),
            Expr::Literal(_) | Expr::Column(_) | Expr::Parameter(_) | Expr::Alias { .. }
        )
    }

    pub fn as_bool_literal(&self) -> Option<bool> {
        match self {
            Expr::Literal(value) => value.as_bool(),
            _ => None,
        }
    }

    pub fn is_null_literal(&self) -> bool {
        matches!(self, Expr::Literal(Value::Null))
    }

    /// Whether this node yields a boolean search condition in SQL
    pub fn is_search_condition(&self) -> bool {
        match self {
            Expr::BinaryOp { op, .. } => op.is_comparison() || op.is_logical(),
            Expr::UnaryOp {
                op: UnaryOperator::Not,
                ..
            } => true,
            Expr::UnaryOp {
                op: UnaryOperator::Convert,
                expr,
            } => expr.is_search_condition(),
            Expr::Exists(_) | Expr::In { .. } | Expr::IsNull(_) | Expr::Like { .. } => true,
            _ => false,
        }
    }

    /// Whether this expression can evaluate to NULL
    pub fn is_nullable(&self) -> bool {
        match self {
            Expr::Column(col) => col.nullable,
            Expr::Parameter(p) => p.value_type.nullable,
            Expr::Literal(value) => value.is_null(),
            Expr::Alias { expr, .. } | Expr::Cast { expr, .. } => expr.is_nullable(),
            Expr::UnaryOp { expr, .. } => expr.is_nullable(),
            Expr::BinaryOp { left, op, right } => {
                if op.is_comparison() || op.is_logical() {
                    false
                } else if *op == BinaryOperator::Coalesce {
                    right.is_nullable()
                } else {
                    left.is_nullable() || right.is_nullable()
                }
            }
            Expr::Case(case) => match &case.else_clause {
                None => true,
                Some(else_clause) => {
                    else_clause.is_nullable()
                        || case.when_clauses.iter().any(|(_, then)| then.is_nullable())
                }
            },
            Expr::Like {
                matched, pattern, ..
            } => matched.is_nullable() || pattern.is_nullable(),
            Expr::Exists(_) | Expr::In { .. } | Expr::IsNull(_) => false,
            Expr::FunctionCall(_) | Expr::Select(_) | Expr::Fragment(_) => true,
        }
    }

    /// Best-effort kind of the value this expression produces
    pub fn value_kind(&self) -> Option<ValueKind> {
        match self {
            Expr::Column(col) => col.type_mapping.as_ref().map(|m| m.kind),
            Expr::Literal(value) => value.kind(),
            Expr::Parameter(p) => Some(p.value_type.kind),
            Expr::Cast { target, .. } => Some(*target),
            Expr::Alias { expr, .. } => expr.value_kind(),
            Expr::UnaryOp {
                op: UnaryOperator::Not,
                ..
            } => Some(ValueKind::Bool),
            Expr::UnaryOp { expr, .. } => expr.value_kind(),
            Expr::BinaryOp { left, op, right } => {
                if op.is_comparison() || op.is_logical() {
                    Some(ValueKind::Bool)
                } else {
                    left.value_kind().or_else(|| right.value_kind())
                }
            }
            Expr::Case(case) => case
                .when_clauses
                .iter()
                .map(|(_, then)| then)
                .chain(case.else_clause.as_deref())
                .find_map(Expr::value_kind),
            Expr::Exists(_) | Expr::In { .. } | Expr::IsNull(_) | Expr::Like { .. } => {
                Some(ValueKind::Bool)
            }
            Expr::Select(select) => select.projection.first().and_then(Expr::value_kind),
            Expr::FunctionCall(_) | Expr::Fragment(_) => None,
        }
    }

    /// Type mapping carried by a column, looking through aliases and conversions
    pub fn column_type_mapping(&self) -> Option<&TypeMapping> {
        match self.remove_convert() {
            Expr::Column(col) => col.type_mapping.as_ref(),
            Expr::Alias { expr, .. } => expr.column_type_mapping(),
            _ => None,
        }
    }

    // Rewriting helpers

    /// Rebuild this node with `f` applied to each direct child expression.
    ///
    /// Sub-selects (EXISTS, IN subquery, scalar SELECT) are not entered; they
    /// are optimized when they are themselves emitted.
    pub fn try_map_children<E>(
        self,
        f: &mut dyn FnMut(Expr) -> Result<Expr, E>,
    ) -> Result<Expr, E> {
        let mapped = match self {
            Expr::Alias { expr, alias } => Expr::Alias {
                expr: Box::new(f(*expr)?),
                alias,
            },
            Expr::BinaryOp { left, op, right } => Expr::BinaryOp {
                left: Box::new(f(*left)?),
                op,
                right: Box::new(f(*right)?),
            },
            Expr::UnaryOp { op, expr } => Expr::UnaryOp {
                op,
                expr: Box::new(f(*expr)?),
            },
            Expr::Case(case) => {
                let operand = match case.operand {
                    Some(operand) => Some(Box::new(f(*operand)?)),
                    None => None,
                };
                let mut when_clauses = Vec::with_capacity(case.when_clauses.len());
                for (test, result) in case.when_clauses {
                    when_clauses.push((f(test)?, f(result)?));
                }
                let else_clause = match case.else_clause {
                    Some(else_clause) => Some(Box::new(f(*else_clause)?)),
                    None => None,
                };
                Expr::Case(CaseExpr {
                    operand,
                    when_clauses,
                    else_clause,
                })
            }
            Expr::FunctionCall(FunctionCall {
                schema,
                name,
                instance,
                args,
                niladic,
            }) => {
                let instance = match instance {
                    Some(instance) => Some(Box::new(f(*instance)?)),
                    None => None,
                };
                let mut mapped_args = Vec::with_capacity(args.len());
                for arg in args {
                    mapped_args.push(f(arg)?);
                }
                Expr::FunctionCall(FunctionCall {
                    schema,
                    name,
                    instance,
                    args: mapped_args,
                    niladic,
                })
            }
            Expr::In { operand, values } => {
                let values = match values {
                    InValues::List(items) => {
                        let mut mapped = Vec::with_capacity(items.len());
                        for item in items {
                            mapped.push(f(item)?);
                        }
                        InValues::List(mapped)
                    }
                    subquery @ InValues::Subquery(_) => subquery,
                };
                Expr::In {
                    operand: Box::new(f(*operand)?),
                    values,
                }
            }
            Expr::IsNull(expr) => Expr::IsNull(Box::new(f(*expr)?)),
            Expr::Like {
                matched,
                pattern,
                escape,
            } => Expr::Like {
                matched: Box::new(f(*matched)?),
                pattern: Box::new(f(*pattern)?),
                escape: match escape {
                    Some(escape) => Some(Box::new(f(*escape)?)),
                    None => None,
                },
            },
            Expr::Cast { expr, target } => Expr::Cast {
                expr: Box::new(f(*expr)?),
                target,
            },
            leaf @ (Expr::Column(_)
            | Expr::Exists(_)
            | Expr::Fragment(_)
            | Expr::Literal(_)
            | Expr::Parameter(_)
            | Expr::Select(_)) => leaf,
        };
        Ok(mapped)
    }

    /// Infallible form of [`Expr::try_map_children`]
    pub fn map_children(self, f: &mut dyn FnMut(Expr) -> Expr) -> Expr {
        match self.try_map_children::<Infallible>(&mut |e| Ok(f(e))) {
            Ok(expr) => expr,
            Err(never) => match never {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_ref() {
        let col = ColumnRef::new("c", "Id");
        assert_eq!(col.table_alias.as_str(), "c");
        assert_eq!(col.name.as_str(), "Id");
        assert!(!col.nullable);
        assert!(col.type_mapping.is_none());

        let col = col.with_nullable(true);
        assert!(Expr::from(col).is_nullable());
    }

    #[test]
    fn test_operator_symbols() {
        assert_eq!(BinaryOperator::NotEq.as_sql(), "<>");
        assert_eq!(BinaryOperator::And.as_sql(), "AND");
        assert_eq!(BinaryOperator::Lt.negated(), Some(BinaryOperator::GtEq));
        assert_eq!(BinaryOperator::GtEq.negated(), Some(BinaryOperator::Lt));
        assert_eq!(BinaryOperator::Add.negated(), None);
    }

    #[test]
    fn test_remove_convert() {
        let expr = Expr::convert(Expr::convert(Expr::int(1)));
        assert_eq!(expr.remove_convert(), &Expr::int(1));
        assert!(expr.is_simple());
        assert!(!Expr::function("GETDATE", vec![]).is_simple());
    }

    #[test]
    fn test_search_condition_shapes() {
        let col = Expr::column("c", "IsLondon");
        assert!(!col.is_search_condition());
        assert!(col.clone().eq(Expr::bool(true)).is_search_condition());
        assert!(Expr::not(col.clone()).is_search_condition());
        assert!(Expr::convert(Expr::is_null(col.clone())).is_search_condition());
        assert!(!Expr::binary(col.clone(), BinaryOperator::Add, Expr::int(1)).is_search_condition());
    }

    #[test]
    fn test_nullability() {
        let nullable = Expr::from(ColumnRef::new("c", "Region").with_nullable(true));
        let required = Expr::column("c", "Id");

        assert!(Expr::null().is_nullable());
        assert!(!Expr::int(1).is_nullable());
        assert!(Expr::binary(nullable.clone(), BinaryOperator::Add, Expr::int(1)).is_nullable());
        assert!(!Expr::binary(nullable.clone(), BinaryOperator::Coalesce, required.clone())
            .is_nullable());
        assert!(!nullable.clone().eq(required).is_nullable());
        assert!(Expr::param("p", ValueType::nullable(ValueKind::Integer)).is_nullable());
    }

    #[test]
    fn test_map_children_skips_subqueries() {
        let expr = Expr::int(1).eq(Expr::int(2));
        let mut visited = 0;
        let mapped = expr.map_children(&mut |e| {
            visited += 1;
            e
        });
        assert_eq!(visited, 2);
        assert_eq!(mapped, Expr::int(1).eq(Expr::int(2)));

        let exists = Expr::exists(SelectExpr::new());
        let mut visited = 0;
        exists.map_children(&mut |e| {
            visited += 1;
            e
        });
        assert_eq!(visited, 0);
    }
}
