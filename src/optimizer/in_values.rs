//! IN list value expansion
//!
//! Array literals and collection-typed parameters on the right of `IN` are
//! spread into individual literals. NULL members are pulled out into an
//! `OR x IS NULL` disjunct, since `x IN (NULL)` never matches in SQL.

use crate::ast::{Expr, InValues, ParameterValues, UnaryOperator, Value};
use crate::error::{SqlGenError, SqlGenResult};

/// Expand IN lists. Sets `depends_on_values` when the expansion read the
/// current value of a bound parameter.
pub fn expand_in_values(
    expr: Expr,
    parameters: &ParameterValues,
    depends_on_values: &mut bool,
) -> SqlGenResult<Expr> {
    match expr {
        Expr::UnaryOp {
            op: UnaryOperator::Not,
            expr: inner,
        } => match *inner {
            Expr::In {
                operand,
                values: values @ InValues::List(_),
            } => {
                let operand = expand_in_values(*operand, parameters, depends_on_values)?;
                let nullable = operand.is_nullable();
                let expanded =
                    expand_list(operand.clone(), values, parameters, depends_on_values)?;
                Ok(match expanded {
                    // NOT (x IN (...) OR x IS NULL) is handled by negation simplification
                    (expr, true) => Expr::not(expr),
                    // x NOT IN (...) is unknown for NULL x; the host answer is true
                    (expr, false) if nullable => Expr::not(expr).or(Expr::is_null(operand)),
                    (expr, false) => Expr::not(expr),
                })
            }
            other => Ok(Expr::not(expand_in_values(other, parameters, depends_on_values)?)),
        },
        Expr::In {
            operand,
            values: values @ InValues::List(_),
        } => {
            let operand = expand_in_values(*operand, parameters, depends_on_values)?;
            let (expr, _) = expand_list(operand, values, parameters, depends_on_values)?;
            Ok(expr)
        }
        other => other.try_map_children(&mut |e| expand_in_values(e, parameters, depends_on_values)),
    }
}

/// Returns the expanded expression and whether a NULL member was removed
fn expand_list(
    operand: Expr,
    values: InValues,
    parameters: &ParameterValues,
    depends_on_values: &mut bool,
) -> SqlGenResult<(Expr, bool)> {
    let items = match values {
        InValues::List(items) => items,
        subquery @ InValues::Subquery(_) => {
            return Ok((
                Expr::In {
                    operand: Box::new(operand),
                    values: subquery,
                },
                false,
            ))
        }
    };

    let mut expanded = Vec::with_capacity(items.len());
    let mut has_null = false;

    for item in items {
        match item {
            Expr::Literal(Value::Array(elements)) => {
                push_values(elements, &mut expanded, &mut has_null);
            }
            Expr::Literal(Value::Null) => has_null = true,
            Expr::Parameter(p) if p.value_type.collection => match parameters.get(&p.name) {
                Some(Value::Null) => {
                    return Err(SqlGenError::expected_non_null_parameter(p.name.as_str()))
                }
                Some(Value::Array(elements)) => {
                    *depends_on_values = true;
                    push_values(elements.clone(), &mut expanded, &mut has_null);
                }
                Some(value) => {
                    *depends_on_values = true;
                    push_values(vec![value.clone()], &mut expanded, &mut has_null);
                }
                // Unbound: left for the provider to expand at execution time
                None => expanded.push(Expr::Parameter(p)),
            },
            Expr::Parameter(p) => match parameters.get(&p.name) {
                Some(value) => {
                    *depends_on_values = true;
                    if value.is_null() {
                        has_null = true;
                    } else {
                        expanded.push(Expr::Parameter(p));
                    }
                }
                None => expanded.push(Expr::Parameter(p)),
            },
            other => {
                let other = expand_in_values(other, parameters, depends_on_values)?;
                expanded.push(other);
            }
        }
    }

    let expr = if expanded.is_empty() {
        if has_null {
            Expr::is_null(operand)
        } else {
            Expr::bool(false)
        }
    } else {
        let in_list = Expr::in_list(operand.clone(), expanded);
        if has_null {
            in_list.or(Expr::is_null(operand))
        } else {
            in_list
        }
    };
    Ok((expr, has_null))
}

fn push_values(values: Vec<Value>, expanded: &mut Vec<Expr>, has_null: &mut bool) {
    for value in values {
        if value.is_null() {
            *has_null = true;
        } else {
            expanded.push(Expr::Literal(value));
        }
    }
}
