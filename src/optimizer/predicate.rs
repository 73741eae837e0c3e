//! Boolean predicate reduction and negation simplification

use crate::ast::{BinaryOperator, CaseExpr, Expr, UnaryOperator};

/// Remove comparisons against boolean literals and fold boolean literals out
/// of AND/OR. Works bottom-up so folds cascade.
pub fn reduce_predicates(expr: Expr) -> Expr {
    let expr = expr.map_children(&mut reduce_predicates);

    match expr {
        Expr::BinaryOp { left, op, right } => reduce_binary(*left, op, *right),
        Expr::Case(case) => reduce_case(case),
        other => other,
    }
}

fn reduce_binary(left: Expr, op: BinaryOperator, right: Expr) -> Expr {
    match op {
        BinaryOperator::Eq | BinaryOperator::NotEq => {
            let equal = op == BinaryOperator::Eq;
            // x = true, x <> false -> x; x = false, x <> true -> NOT x
            match (left.as_bool_literal(), right.as_bool_literal()) {
                (Some(_), Some(_)) => Expr::binary(left, op, right),
                (None, Some(b)) => keep_or_negate(left, b == equal),
                (Some(b), None) => keep_or_negate(right, b == equal),
                (None, None) => Expr::binary(left, op, right),
            }
        }
        BinaryOperator::And => match (left.as_bool_literal(), right.as_bool_literal()) {
            (Some(true), _) => right,
            (_, Some(true)) => left,
            (Some(false), _) | (_, Some(false)) => Expr::bool(false),
            _ => Expr::binary(left, op, right),
        },
        BinaryOperator::Or => match (left.as_bool_literal(), right.as_bool_literal()) {
            (Some(false), _) => right,
            (_, Some(false)) => left,
            (Some(true), _) | (_, Some(true)) => Expr::bool(true),
            _ => Expr::binary(left, op, right),
        },
        _ => Expr::binary(left, op, right),
    }
}

fn keep_or_negate(expr: Expr, keep: bool) -> Expr {
    if keep {
        expr
    } else {
        Expr::not(expr)
    }
}

/// CASE WHEN x THEN true ELSE false END -> x
fn reduce_case(case: CaseExpr) -> Expr {
    let is_boolean_wrapper = case.operand.is_none()
        && case.when_clauses.len() == 1
        && case.when_clauses[0].1.as_bool_literal() == Some(true)
        && case.else_clause.as_ref().and_then(|e| e.as_bool_literal()) == Some(false);

    if !is_boolean_wrapper {
        return Expr::Case(case);
    }
    match case.when_clauses.into_iter().next() {
        Some((test, _)) => test,
        None => Expr::bool(false),
    }
}

/// Push NOT inward: double negation, negated comparisons, De Morgan's laws
/// and negated boolean literals.
pub fn simplify_negations(expr: Expr) -> Expr {
    match expr {
        Expr::UnaryOp {
            op: UnaryOperator::Not,
            expr,
        } => negate(*expr),
        other => other.map_children(&mut simplify_negations),
    }
}

fn negate(expr: Expr) -> Expr {
    match expr {
        Expr::UnaryOp {
            op: UnaryOperator::Not,
            expr,
        } => simplify_negations(*expr),
        Expr::BinaryOp { left, op, right } if op.is_logical() => {
            let flipped = if op == BinaryOperator::And {
                BinaryOperator::Or
            } else {
                BinaryOperator::And
            };
            Expr::binary(negate(*left), flipped, negate(*right))
        }
        Expr::BinaryOp { left, op, right } => match op.negated() {
            Some(negated) => Expr::binary(
                simplify_negations(*left),
                negated,
                simplify_negations(*right),
            ),
            None => Expr::not(Expr::binary(
                simplify_negations(*left),
                op,
                simplify_negations(*right),
            )),
        },
        Expr::Literal(value) => match value.as_bool() {
            Some(b) => Expr::bool(!b),
            None => Expr::not(Expr::Literal(value)),
        },
        other => Expr::not(simplify_negations(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ColumnRef;

    fn flag() -> Expr {
        Expr::column("c", "IsLondon")
    }

    #[test]
    fn test_boolean_comparisons() {
        assert_eq!(reduce_predicates(flag().eq(Expr::bool(true))), flag());
        assert_eq!(reduce_predicates(Expr::bool(true).eq(flag())), flag());
        assert_eq!(
            reduce_predicates(flag().eq(Expr::bool(false))),
            Expr::not(flag())
        );
        assert_eq!(
            reduce_predicates(flag().not_eq(Expr::bool(true))),
            Expr::not(flag())
        );
        assert_eq!(reduce_predicates(flag().not_eq(Expr::bool(false))), flag());
    }

    #[test]
    fn test_logical_folds() {
        let cmp = Expr::column("c", "Id").eq(Expr::int(1));
        assert_eq!(reduce_predicates(Expr::bool(true).and(cmp.clone())), cmp);
        assert_eq!(
            reduce_predicates(cmp.clone().and(Expr::bool(false))),
            Expr::bool(false)
        );
        assert_eq!(
            reduce_predicates(cmp.clone().or(Expr::bool(true))),
            Expr::bool(true)
        );
        assert_eq!(reduce_predicates(Expr::bool(false).or(cmp.clone())), cmp);
    }

    #[test]
    fn test_folds_cascade() {
        // (true AND true) OR x -> true
        let expr = Expr::bool(true)
            .and(Expr::bool(true))
            .or(flag().eq(Expr::bool(true)));
        assert_eq!(reduce_predicates(expr), Expr::bool(true));
    }

    #[test]
    fn test_boolean_case_unwrapped() {
        let test = Expr::column("c", "Id").eq(Expr::int(1));
        let case = Expr::Case(CaseExpr::searched(
            vec![(test.clone(), Expr::bool(true))],
            Some(Expr::bool(false)),
        ));
        assert_eq!(reduce_predicates(case), test);

        let inverted = Expr::Case(CaseExpr::searched(
            vec![(test.clone(), Expr::bool(false))],
            Some(Expr::bool(true)),
        ));
        assert_eq!(reduce_predicates(inverted.clone()), inverted);
    }

    #[test]
    fn test_double_negation() {
        assert_eq!(simplify_negations(Expr::not(Expr::not(flag()))), flag());
        assert_eq!(
            simplify_negations(Expr::not(Expr::not(Expr::not(flag())))),
            Expr::not(flag())
        );
    }

    #[test]
    fn test_negated_comparison() {
        let id = Expr::column("c", "Id");
        assert_eq!(
            simplify_negations(Expr::not(id.clone().eq(Expr::int(1)))),
            id.clone().not_eq(Expr::int(1))
        );
        assert_eq!(
            simplify_negations(Expr::not(Expr::binary(
                id.clone(),
                BinaryOperator::Lt,
                Expr::int(5)
            ))),
            Expr::binary(id, BinaryOperator::GtEq, Expr::int(5))
        );
    }

    #[test]
    fn test_de_morgan() {
        let a = Expr::column("c", "A");
        let region = Expr::from(ColumnRef::new("c", "Region").with_nullable(true));
        let expr = Expr::not(a.clone().and(Expr::is_null(region.clone())));
        assert_eq!(
            simplify_negations(expr),
            Expr::not(a.clone()).or(Expr::is_not_null(region.clone()))
        );

        let expr = Expr::not(a.clone().or(Expr::not(Expr::is_null(region.clone()))));
        assert_eq!(
            simplify_negations(expr),
            Expr::not(a).and(Expr::is_null(region))
        );
    }

    #[test]
    fn test_negated_literal() {
        assert_eq!(simplify_negations(Expr::not(Expr::bool(true))), Expr::bool(false));
    }
}
