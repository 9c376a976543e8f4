//! Comparison-method rewrite.
//!
//! Mapping layers express string ordering as `a.CompareTo(b) < 0` or
//! `String.Compare(a, b) >= 0`. The protocol has no compare call, so these
//! collapse into a direct comparison between the two operands. A zero on
//! the left mirrors the operator: `0 < a.CompareTo(b)` becomes `a > b`.

use crate::ast::{BinaryOp, Command, Expr, SelectCommand};
use crate::error::TransformError;
use crate::transform::QueryTransform;
use tracing::trace;

pub struct CompareRewrite;

impl QueryTransform for CompareRewrite {
    fn name(&self) -> &'static str {
        "compare-rewrite"
    }

    fn transform(&self, command: Command) -> Result<Command, TransformError> {
        Ok(match command {
            Command::Select(select) => Command::Select(rewrite_select(select)),
            Command::Insert(mut insert) => {
                insert.assignments = insert
                    .assignments
                    .into_iter()
                    .map(|mut assignment| {
                        assignment.value = rewrite(assignment.value);
                        assignment
                    })
                    .collect();
                Command::Insert(insert)
            }
            Command::Update(mut update) => {
                update.where_clause = update.where_clause.map(rewrite);
                Command::Update(update)
            }
            Command::Delete(mut delete) => {
                delete.where_clause = delete.where_clause.map(rewrite);
                Command::Delete(delete)
            }
        })
    }
}

fn rewrite_select(mut select: SelectCommand) -> SelectCommand {
    select.source = rewrite(select.source);
    select.where_clause = select.where_clause.map(rewrite);
    select.order_by = select
        .order_by
        .into_iter()
        .map(|mut order| {
            order.expr = rewrite(order.expr);
            order
        })
        .collect();
    select.columns = select.columns.into_iter().map(rewrite).collect();
    select
}

fn rewrite_boxed(expr: Box<Expr>) -> Box<Expr> {
    Box::new(rewrite(*expr))
}

/// Rewrite bottom-up so nested comparisons are handled first
fn rewrite(expr: Expr) -> Expr {
    match expr {
        Expr::Binary { op, left, right } => {
            let left = rewrite(*left);
            let right = rewrite(*right);
            if op.is_comparison() {
                if right.literal().is_some_and(|v| v.is_zero()) {
                    if let Some((a, b)) = compare_operands(&left) {
                        trace!(?op, "rewriting compare call");
                        return Expr::binary(op, a, b);
                    }
                }
                if left.literal().is_some_and(|v| v.is_zero()) {
                    if let Some((a, b)) = compare_operands(&right) {
                        trace!(?op, "rewriting mirrored compare call");
                        return Expr::binary(op.mirrored(), a, b);
                    }
                }
            }
            Expr::binary(op, left, right)
        }
        Expr::Unary { op, operand } => Expr::Unary {
            op,
            operand: rewrite_boxed(operand),
        },
        Expr::Call {
            method,
            target,
            args,
        } => Expr::Call {
            method,
            target: target.map(rewrite_boxed),
            args: args.into_iter().map(rewrite).collect(),
        },
        Expr::Conditional {
            test,
            if_true,
            if_false,
        } => Expr::Conditional {
            test: rewrite_boxed(test),
            if_true: rewrite_boxed(if_true),
            if_false: rewrite_boxed(if_false),
        },
        Expr::Aggregate { function, args } => Expr::Aggregate {
            function,
            args: args.into_iter().map(rewrite).collect(),
        },
        Expr::Join { left, right, on } => Expr::Join {
            left: rewrite_boxed(left),
            right: rewrite_boxed(right),
            on: on.map(rewrite_boxed),
        },
        Expr::Subquery { query } => Expr::Subquery {
            query: Box::new(rewrite_select(*query)),
        },
        Expr::ScalarSubquery { query } => Expr::ScalarSubquery {
            query: Box::new(rewrite_select(*query)),
        },
        leaf @ (Expr::Table { .. }
        | Expr::Column { .. }
        | Expr::NamedValue { .. }
        | Expr::Constant { .. }) => leaf,
    }
}

/// Operands of `a.CompareTo(b)` or `Compare(a, b)`
fn compare_operands(expr: &Expr) -> Option<(Expr, Expr)> {
    match expr {
        Expr::Call {
            method,
            target: Some(target),
            args,
        } if method == "CompareTo" && args.len() == 1 => {
            Some(((**target).clone(), args[0].clone()))
        }
        Expr::Call {
            method,
            target: None,
            args,
        } if method == "Compare" && args.len() == 2 => Some((args[0].clone(), args[1].clone())),
        _ => None,
    }
}
