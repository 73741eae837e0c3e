//! Three-valued logic expansion
//!
//! Host equality treats `null == null` as true and `null != 1` as true; SQL
//! yields unknown for both. Equality and inequality over nullable operands
//! are rewritten with explicit `IS NULL` checks so that SQL evaluates to the
//! host result.
//!
//! Positions where unknown already behaves like false (the top of a search
//! condition, its AND/OR operands, searched CASE tests) get the shorter form
//! for `=`.

use crate::ast::{BinaryOperator, CaseExpr, Expr, UnaryOperator};

/// Expand `=`/`<>` over nullable operands.
///
/// For a join condition whose top level is an equality, only the operands are
/// expanded: join keys never match on NULL.
pub fn expand_null_semantics(expr: Expr, join_condition: bool) -> Expr {
    if join_condition {
        if let Expr::BinaryOp {
            left,
            op: BinaryOperator::Eq,
            right,
        } = expr
        {
            return Expr::binary(
                visit(*left, false),
                BinaryOperator::Eq,
                visit(*right, false),
            );
        }
    }
    visit(expr, true)
}

fn visit(expr: Expr, null_is_false: bool) -> Expr {
    match expr {
        Expr::BinaryOp { left, op, right } if op.is_logical() => Expr::binary(
            visit(*left, null_is_false),
            op,
            visit(*right, null_is_false),
        ),
        Expr::BinaryOp { left, op, right }
            if matches!(op, BinaryOperator::Eq | BinaryOperator::NotEq) =>
        {
            rewrite_equality(visit(*left, false), op, visit(*right, false), null_is_false)
        }
        Expr::UnaryOp {
            op: UnaryOperator::Convert,
            expr,
        } => Expr::convert(visit(*expr, null_is_false)),
        Expr::Case(case) => {
            let searched = case.operand.is_none();
            Expr::Case(CaseExpr {
                operand: case.operand.map(|o| Box::new(visit(*o, false))),
                when_clauses: case
                    .when_clauses
                    .into_iter()
                    .map(|(test, result)| (visit(test, searched), visit(result, false)))
                    .collect(),
                else_clause: case.else_clause.map(|e| Box::new(visit(*e, false))),
            })
        }
        other => other.map_children(&mut |e| visit(e, false)),
    }
}

fn rewrite_equality(left: Expr, op: BinaryOperator, right: Expr, null_is_false: bool) -> Expr {
    let left_nullable = left.is_nullable();
    let right_nullable = right.is_nullable();
    if !left_nullable && !right_nullable {
        return Expr::binary(left, op, right);
    }

    let equal = op == BinaryOperator::Eq;
    match (left.is_null_literal(), right.is_null_literal()) {
        (true, true) => return Expr::bool(equal),
        (true, false) => return null_check(right, equal),
        (false, true) => return null_check(left, equal),
        (false, false) => {}
    }

    let comparison = Expr::binary(left.clone(), op, right.clone());
    let both_null = || Expr::is_null(left.clone()).and(Expr::is_null(right.clone()));

    if equal {
        match (left_nullable && right_nullable, null_is_false) {
            // a = b OR (a IS NULL AND b IS NULL)
            (true, true) => comparison.or(both_null()),
            // (a = b AND a IS NOT NULL AND b IS NOT NULL) OR (a IS NULL AND b IS NULL)
            (true, false) => comparison
                .and(Expr::is_not_null(left.clone()))
                .and(Expr::is_not_null(right.clone()))
                .or(both_null()),
            (false, true) => comparison,
            // a = b AND a IS NOT NULL
            (false, false) => {
                let nullable = if left_nullable { left } else { right };
                comparison.and(Expr::is_not_null(nullable))
            }
        }
    } else if left_nullable && right_nullable {
        // (a <> b OR a IS NULL OR b IS NULL) AND (a IS NOT NULL OR b IS NOT NULL)
        comparison
            .or(Expr::is_null(left.clone()))
            .or(Expr::is_null(right.clone()))
            .and(Expr::is_not_null(left).or(Expr::is_not_null(right)))
    } else {
        // a <> b OR a IS NULL
        let nullable = if left_nullable { left } else { right };
        comparison.or(Expr::is_null(nullable))
    }
}

fn null_check(operand: Expr, equal: bool) -> Expr {
    if equal {
        Expr::is_null(operand)
    } else {
        Expr::is_not_null(operand)
    }
}
