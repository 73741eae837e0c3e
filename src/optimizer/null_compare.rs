//! Null-comparison collapsing
//!
//! `x = @p` / `x <> @p` where the bound value of `@p` is known decides the
//! comparison's null behavior at generation time instead of relying on
//! `NULL = NULL` evaluating to unknown.

use crate::ast::{BinaryOperator, Expr, ParameterValues, Value};

/// Rewrite equality comparisons against parameters with known null-ness
pub fn collapse_null_comparisons(expr: Expr, parameters: &ParameterValues) -> Expr {
    let expr = expr.map_children(&mut |e| collapse_null_comparisons(e, parameters));

    match expr {
        Expr::BinaryOp { left, op, right }
            if matches!(op, BinaryOperator::Eq | BinaryOperator::NotEq) =>
        {
            collapse(*left, op, *right, parameters)
        }
        other => other,
    }
}

fn collapse(left: Expr, op: BinaryOperator, right: Expr, parameters: &ParameterValues) -> Expr {
    if !is_bound_parameter(&left, parameters) && !is_bound_parameter(&right, parameters) {
        return Expr::binary(left, op, right);
    }

    let equal = op == BinaryOperator::Eq;
    let left_null = bound_value(&left, parameters).map(Value::is_null);
    let right_null = bound_value(&right, parameters).map(Value::is_null);

    match (left_null, right_null) {
        (Some(true), Some(true)) => Expr::bool(equal),
        (Some(true), Some(false)) | (Some(false), Some(true)) => Expr::bool(!equal),
        (Some(true), None) => null_check(right, equal),
        (None, Some(true)) => null_check(left, equal),
        _ => Expr::binary(left, op, right),
    }
}

fn is_bound_parameter(expr: &Expr, parameters: &ParameterValues) -> bool {
    matches!(expr.remove_convert(), Expr::Parameter(p) if parameters.contains(&p.name))
}

/// Statically known value of a literal or a bound parameter
fn bound_value<'a>(expr: &'a Expr, parameters: &'a ParameterValues) -> Option<&'a Value> {
    match expr.remove_convert() {
        Expr::Literal(value) => Some(value),
        Expr::Parameter(p) => parameters.get(&p.name),
        _ => None,
    }
}

fn null_check(operand: Expr, equal: bool) -> Expr {
    if equal {
        Expr::is_null(operand)
    } else {
        Expr::is_not_null(operand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ValueKind, ValueType};

    fn id() -> Expr {
        Expr::column("c", "Id")
    }

    fn param() -> Expr {
        Expr::param("id", ValueType::nullable(ValueKind::Integer))
    }

    #[test]
    fn test_null_parameter_becomes_is_null() {
        let params = ParameterValues::new().with("id", Value::Null);

        let expr = collapse_null_comparisons(id().eq(param()), &params);
        assert_eq!(expr, Expr::is_null(id()));

        let expr = collapse_null_comparisons(param().not_eq(id()), &params);
        assert_eq!(expr, Expr::is_not_null(id()));
    }

    #[test]
    fn test_constant_outcomes() {
        let null = ParameterValues::new().with("id", Value::Null);
        let bound = ParameterValues::new().with("id", 5);

        assert_eq!(
            collapse_null_comparisons(Expr::null().eq(param()), &null),
            Expr::bool(true)
        );
        assert_eq!(
            collapse_null_comparisons(Expr::null().not_eq(param()), &null),
            Expr::bool(false)
        );
        assert_eq!(
            collapse_null_comparisons(Expr::int(3).eq(param()), &null),
            Expr::bool(false)
        );
        assert_eq!(
            collapse_null_comparisons(Expr::null().not_eq(param()), &bound),
            Expr::bool(true)
        );
    }

    #[test]
    fn test_unchanged_when_value_unknown_or_non_null() {
        let bound = ParameterValues::new().with("id", 5);
        let expr = id().eq(param());
        assert_eq!(collapse_null_comparisons(expr.clone(), &bound), expr);
        assert_eq!(
            collapse_null_comparisons(expr.clone(), &ParameterValues::new()),
            expr
        );
        assert_eq!(
            collapse_null_comparisons(Expr::int(1).eq(Expr::int(1)), &bound),
            Expr::int(1).eq(Expr::int(1))
        );
    }

    #[test]
    fn test_nested_comparisons_collapse() {
        let params = ParameterValues::new().with("id", Value::Null);
        let expr = Expr::column("c", "Active")
            .eq(Expr::bool(true))
            .and(id().eq(param()));
        assert_eq!(
            collapse_null_comparisons(expr, &params),
            Expr::column("c", "Active")
                .eq(Expr::bool(true))
                .and(Expr::is_null(id()))
        );
    }
}
