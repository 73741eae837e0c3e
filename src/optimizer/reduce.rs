//! Structural reductions on operator chains

use crate::ast::{Expr, UnaryOperator, Value};

/// Collapse nested conversions and fold negated numeric literals
pub fn reduce_expression(expr: Expr) -> Expr {
    let expr = expr.map_children(&mut reduce_expression);

    match expr {
        Expr::UnaryOp {
            op: UnaryOperator::Convert,
            expr: inner,
        } => match *inner {
            nested @ Expr::UnaryOp {
                op: UnaryOperator::Convert,
                ..
            } => nested,
            leaf @ (Expr::Column(_) | Expr::Literal(_) | Expr::Parameter(_)) => leaf,
            other => Expr::convert(other),
        },
        Expr::UnaryOp {
            op: UnaryOperator::Negate,
            expr: inner,
        } => match *inner {
            Expr::UnaryOp {
                op: UnaryOperator::Negate,
                expr: twice,
            } => *twice,
            Expr::Literal(Value::Integer(n)) => match n.checked_neg() {
                Some(negated) => Expr::Literal(Value::Integer(negated)),
                None => Expr::unary(UnaryOperator::Negate, Expr::Literal(Value::Integer(n))),
            },
            Expr::Literal(Value::Float(f)) => Expr::Literal(Value::Float(-f)),
            other => Expr::unary(UnaryOperator::Negate, other),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BinaryOperator;

    #[test]
    fn test_nested_converts_collapse() {
        let sum = Expr::binary(Expr::column("o", "Qty"), BinaryOperator::Add, Expr::int(1));
        let expr = Expr::convert(Expr::convert(Expr::convert(sum.clone())));
        assert_eq!(reduce_expression(expr), Expr::convert(sum));
    }

    #[test]
    fn test_convert_of_leaf_removed() {
        assert_eq!(
            reduce_expression(Expr::convert(Expr::column("o", "Qty"))),
            Expr::column("o", "Qty")
        );
    }

    #[test]
    fn test_negation_folding() {
        let negate = |e| Expr::unary(UnaryOperator::Negate, e);
        assert_eq!(reduce_expression(negate(Expr::int(5))), Expr::int(-5));
        assert_eq!(
            reduce_expression(negate(Expr::literal(1.5))),
            Expr::literal(-1.5)
        );
        assert_eq!(
            reduce_expression(negate(negate(Expr::column("o", "Qty")))),
            Expr::column("o", "Qty")
        );
        // i64::MIN has no positive counterpart
        assert_eq!(
            reduce_expression(negate(Expr::int(i64::MIN))),
            negate(Expr::int(i64::MIN))
        );
    }
}
