//! Expression optimization pipeline
//!
//! Every expression is normalized immediately before it is emitted. The
//! passes run in a fixed order, each over the output of the previous one:
//!
//! 1. null-comparison collapsing against known parameter values
//! 2. three-valued logic expansion (join-condition aware)
//! 3. IN list expansion (may make the command parameter dependent)
//! 4. predicate reduction
//! 5. negation simplification
//! 6. structural reduction
//! 7. search-condition / value translation
//!
//! The input tree is never modified.

mod in_values;
mod null_compare;
mod null_semantics;
mod predicate;
mod reduce;
mod search_condition;

pub use in_values::expand_in_values;
pub use null_compare::collapse_null_comparisons;
pub use null_semantics::expand_null_semantics;
pub use predicate::{reduce_predicates, simplify_negations};
pub use reduce::reduce_expression;
pub use search_condition::translate_search_conditions;

use crate::ast::{Expr, ParameterValues};
use crate::command::{log_optimized, LogLevel};
use crate::error::SqlGenResult;

/// Where an optimized expression is going to be emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// WHERE / HAVING / searched CASE test
    SearchCondition,
    /// ON clause of a join
    JoinCondition,
    /// Projection, ORDER BY, function argument and anything else
    Value,
}

impl Position {
    fn is_search_condition(self) -> bool {
        !matches!(self, Position::Value)
    }

    fn context(self) -> &'static str {
        match self {
            Position::SearchCondition => "predicate",
            Position::JoinCondition => "join condition",
            Position::Value => "value",
        }
    }
}

/// Runs the optimization passes for one generation call
pub struct ExpressionOptimizer<'p> {
    parameters: &'p ParameterValues,
    log_level: LogLevel,
    depends_on_values: bool,
}

impl<'p> ExpressionOptimizer<'p> {
    pub fn new(parameters: &'p ParameterValues, log_level: LogLevel) -> Self {
        Self {
            parameters,
            log_level,
            depends_on_values: false,
        }
    }

    /// Produce the emission-ready form of `expr` for `position`
    pub fn optimize(&mut self, expr: &Expr, position: Position) -> SqlGenResult<Expr> {
        let expr = collapse_null_comparisons(expr.clone(), self.parameters);
        let expr = expand_null_semantics(expr, position == Position::JoinCondition);

        let mut depends = false;
        let expr = expand_in_values(expr, self.parameters, &mut depends)?;
        self.depends_on_values |= depends;

        let expr = reduce_predicates(expr);
        let expr = simplify_negations(expr);
        // Negation can leave new boolean literals behind
        let expr = reduce_predicates(expr);
        let expr = reduce_expression(expr);
        let expr = translate_search_conditions(expr, position.is_search_condition());

        log_optimized(self.log_level, position.context(), &expr);
        Ok(expr)
    }

    /// Whether any optimized expression read the value of a bound parameter
    /// to decide its shape. Such output must not be cached.
    pub fn depends_on_parameter_values(&self) -> bool {
        self.depends_on_values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CaseExpr, ColumnRef, ValueKind, ValueType};

    #[test]
    fn test_boolean_column_predicate() {
        let params = ParameterValues::new();
        let mut optimizer = ExpressionOptimizer::new(&params, LogLevel::Off);
        let flag = Expr::column("c", "IsLondon");

        let expr = optimizer
            .optimize(&flag.clone().eq(Expr::bool(true)), Position::SearchCondition)
            .unwrap();
        assert_eq!(expr, flag.clone().eq(Expr::bool(true)));

        let expr = optimizer
            .optimize(&Expr::not(Expr::not(flag.clone())), Position::SearchCondition)
            .unwrap();
        assert_eq!(expr, flag.eq(Expr::bool(true)));
        assert!(!optimizer.depends_on_parameter_values());
    }

    #[test]
    fn test_null_parameter_pipeline() {
        let params = ParameterValues::new().with("region", crate::ast::Value::Null);
        let mut optimizer = ExpressionOptimizer::new(&params, LogLevel::Off);
        let region = Expr::from(ColumnRef::new("c", "Region").with_nullable(true));
        let expr = region
            .clone()
            .eq(Expr::param("region", ValueType::nullable(ValueKind::String)));

        assert_eq!(
            optimizer.optimize(&expr, Position::SearchCondition).unwrap(),
            Expr::is_null(region)
        );
    }

    #[test]
    fn test_collection_parameter_marks_dependency() {
        let params = ParameterValues::new().with("ids", vec![1, 2]);
        let mut optimizer = ExpressionOptimizer::new(&params, LogLevel::Off);
        let expr = Expr::in_list(
            Expr::column("c", "Id"),
            vec![Expr::param("ids", ValueType::collection(ValueKind::Integer))],
        );
        optimizer.optimize(&expr, Position::SearchCondition).unwrap();
        assert!(optimizer.depends_on_parameter_values());
    }

    #[test]
    fn test_negated_empty_in_folds_to_true() {
        let params = ParameterValues::new();
        let mut optimizer = ExpressionOptimizer::new(&params, LogLevel::Off);
        let region = Expr::from(ColumnRef::new("c", "Region").with_nullable(true));
        let expr = Expr::not(Expr::in_list(
            region,
            vec![Expr::Literal(crate::ast::Value::Array(vec![]))],
        ));

        assert_eq!(
            optimizer.optimize(&expr, Position::SearchCondition).unwrap(),
            Expr::bool(true).eq(Expr::bool(true))
        );
    }

    #[test]
    fn test_predicate_in_value_position() {
        let params = ParameterValues::new();
        let mut optimizer = ExpressionOptimizer::new(&params, LogLevel::Off);
        let cmp = Expr::column("c", "Id").eq(Expr::int(1));

        assert_eq!(
            optimizer.optimize(&cmp, Position::Value).unwrap(),
            Expr::Case(CaseExpr::searched(
                vec![(cmp, Expr::bool(true))],
                Some(Expr::bool(false)),
            ))
        );
    }

    #[test]
    fn test_join_condition_equality_not_expanded() {
        let params = ParameterValues::new();
        let mut optimizer = ExpressionOptimizer::new(&params, LogLevel::Off);
        let a = Expr::from(ColumnRef::new("o", "CustomerId").with_nullable(true));
        let b = Expr::from(ColumnRef::new("c", "Id").with_nullable(true));
        let on = a.eq(b);

        assert_eq!(optimizer.optimize(&on, Position::JoinCondition).unwrap(), on);
        assert_ne!(optimizer.optimize(&on, Position::SearchCondition).unwrap(), on);
    }

    #[test]
    fn test_input_not_modified() {
        let params = ParameterValues::new();
        let mut optimizer = ExpressionOptimizer::new(&params, LogLevel::Off);
        let expr = Expr::not(Expr::column("c", "IsLondon"));
        let before = expr.clone();
        optimizer.optimize(&expr, Position::SearchCondition).unwrap();
        assert_eq!(expr, before);
    }
}
