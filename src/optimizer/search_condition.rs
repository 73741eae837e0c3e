//! Search-condition / value context translation
//!
//! SQL keeps predicates and values apart: `WHERE [c].[IsActive]` is not
//! valid everywhere, and `SELECT [a] = [b]` is not valid anywhere. After this
//! pass every node sits in a position of the right kind:
//!
//! - a value where a predicate is required becomes `value = true`
//! - a predicate where a value is required becomes
//!   `CASE WHEN predicate THEN true ELSE false END`

use crate::ast::{BinaryOperator, CaseExpr, Expr, UnaryOperator};

/// Translate `expr` for a search-condition (`true`) or value (`false`)
/// position.
pub fn translate_search_conditions(expr: Expr, search_condition: bool) -> Expr {
    match expr {
        Expr::Alias { expr, alias } => Expr::Alias {
            expr: Box::new(translate_search_conditions(*expr, search_condition)),
            alias,
        },
        Expr::UnaryOp {
            op: UnaryOperator::Convert,
            expr,
        } => Expr::convert(translate_search_conditions(*expr, search_condition)),
        // Raw SQL is opaque
        fragment @ Expr::Fragment(_) => fragment,
        other => apply_conversion(translate_children(other), search_condition),
    }
}

fn translate_children(expr: Expr) -> Expr {
    match expr {
        Expr::BinaryOp { left, op, right } => {
            let operands_are_conditions = op.is_logical();
            Expr::binary(
                translate_search_conditions(*left, operands_are_conditions),
                op,
                translate_search_conditions(*right, operands_are_conditions),
            )
        }
        Expr::UnaryOp {
            op: UnaryOperator::Not,
            expr,
        } => {
            if expr.is_simple() {
                // NOT [c].[IsActive] -> [c].[IsActive] = false
                Expr::binary(
                    translate_search_conditions(*expr, false),
                    BinaryOperator::Eq,
                    Expr::bool(false),
                )
            } else {
                Expr::not(translate_search_conditions(*expr, true))
            }
        }
        Expr::Case(case) => {
            let searched = case.operand.is_none();
            Expr::Case(CaseExpr {
                operand: case
                    .operand
                    .map(|o| Box::new(translate_search_conditions(*o, false))),
                when_clauses: case
                    .when_clauses
                    .into_iter()
                    .map(|(test, result)| {
                        (
                            translate_search_conditions(test, searched),
                            translate_search_conditions(result, false),
                        )
                    })
                    .collect(),
                else_clause: case
                    .else_clause
                    .map(|e| Box::new(translate_search_conditions(*e, false))),
            })
        }
        // Sub-selects are translated when they are emitted
        leaf @ (Expr::Exists(_) | Expr::Select(_)) => leaf,
        other => other.map_children(&mut |e| translate_search_conditions(e, false)),
    }
}

fn apply_conversion(expr: Expr, search_condition: bool) -> Expr {
    match (search_condition, expr.is_search_condition()) {
        (true, false) => expr.eq(Expr::bool(true)),
        (false, true) => Expr::Case(CaseExpr::searched(
            vec![(expr, Expr::bool(true))],
            Some(Expr::bool(false)),
        )),
        _ => expr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flag() -> Expr {
        Expr::column("c", "IsLondon")
    }

    fn as_value(condition: Expr) -> Expr {
        Expr::Case(CaseExpr::searched(
            vec![(condition, Expr::bool(true))],
            Some(Expr::bool(false)),
        ))
    }

    #[test]
    fn test_value_in_search_position() {
        assert_eq!(
            translate_search_conditions(flag(), true),
            flag().eq(Expr::bool(true))
        );
        assert_eq!(
            translate_search_conditions(Expr::not(flag()), true),
            flag().eq(Expr::bool(false))
        );
    }

    #[test]
    fn test_condition_in_value_position() {
        let cmp = Expr::column("c", "Id").eq(Expr::int(1));
        assert_eq!(
            translate_search_conditions(cmp.clone(), false),
            as_value(cmp)
        );
        assert_eq!(translate_search_conditions(flag(), false), flag());
    }

    #[test]
    fn test_logical_operands_are_conditions() {
        let other = Expr::column("c", "IsActive");
        assert_eq!(
            translate_search_conditions(flag().and(other.clone()), true),
            flag()
                .eq(Expr::bool(true))
                .and(other.eq(Expr::bool(true)))
        );
    }

    #[test]
    fn test_comparison_operands_are_values() {
        let cmp = Expr::column("c", "Id").eq(Expr::int(1));
        let expr = flag().eq(cmp.clone());
        assert_eq!(
            translate_search_conditions(expr, true),
            flag().eq(as_value(cmp))
        );
    }

    #[test]
    fn test_searched_case_tests_are_conditions() {
        let case = Expr::Case(CaseExpr::searched(
            vec![(flag(), Expr::string("London"))],
            Some(Expr::string("Elsewhere")),
        ));
        let expected = Expr::Case(CaseExpr::searched(
            vec![(flag().eq(Expr::bool(true)), Expr::string("London"))],
            Some(Expr::string("Elsewhere")),
        ));
        assert_eq!(translate_search_conditions(case, false), expected);
    }

    #[test]
    fn test_alias_keeps_position() {
        let cmp = Expr::column("c", "Id").eq(Expr::int(1));
        assert_eq!(
            translate_search_conditions(cmp.clone().alias("IsFirst"), false),
            as_value(cmp).alias("IsFirst")
        );
    }

    #[test]
    fn test_idempotent() {
        let predicate = Expr::not(flag()).or(Expr::column("c", "Id").eq(Expr::int(1)));
        let once = translate_search_conditions(predicate, true);
        assert_eq!(translate_search_conditions(once.clone(), true), once);

        let value = translate_search_conditions(flag().eq(Expr::int(1)), false);
        assert_eq!(translate_search_conditions(value.clone(), false), value);
    }
}
