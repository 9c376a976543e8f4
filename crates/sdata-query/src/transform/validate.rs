//! Validation transform.
//!
//! Rejects the whole command up front when any node falls outside the
//! renderable subset, so no partial request is ever produced.

use crate::ast::{BinaryOp, Command, Expr, NodeKind, SelectCommand};
use crate::error::TransformError;
use crate::transform::QueryTransform;

/// Fails fast on joins, grouping, aggregates, subqueries, conditionals and
/// method calls left over after rewriting.
pub struct ValidateTransform;

impl QueryTransform for ValidateTransform {
    fn name(&self) -> &'static str {
        "validate"
    }

    fn transform(&self, command: Command) -> Result<Command, TransformError> {
        match &command {
            Command::Select(select) => check_select(select)?,
            Command::Insert(insert) => {
                let table = check_target(&insert.table)?;
                for assignment in &insert.assignments {
                    check_expr(&assignment.value, table)?;
                }
            }
            Command::Update(update) => {
                let table = check_target(&update.table)?;
                if let Some(predicate) = &update.where_clause {
                    check_expr(predicate, table)?;
                }
                for assignment in &update.assignments {
                    check_expr(&assignment.value, table)?;
                }
            }
            Command::Delete(delete) => {
                let table = check_target(&delete.table)?;
                if let Some(predicate) = &delete.where_clause {
                    check_expr(predicate, table)?;
                }
            }
        }
        Ok(command)
    }
}

fn unsupported(kind: NodeKind, detail: impl Into<String>) -> TransformError {
    TransformError::Unsupported {
        kind,
        detail: detail.into(),
    }
}

fn check_select(select: &SelectCommand) -> Result<(), TransformError> {
    let table = check_target(&select.source)?;
    if let Some(first) = select.group_by.first() {
        return Err(unsupported(
            NodeKind::GroupBy,
            format!("grouping by {}", first.kind()),
        ));
    }
    if let Some(predicate) = &select.where_clause {
        check_expr(predicate, table)?;
    }
    for order in &select.order_by {
        check_expr(&order.expr, table)?;
    }
    for column in &select.columns {
        match column {
            // whole-row projection
            Expr::Table { .. } => {}
            Expr::Column { .. } => check_column(column, table)?,
            other => {
                return Err(unsupported(other.kind(), "computed projection"));
            }
        }
    }
    for paging in [&select.skip, &select.take].into_iter().flatten() {
        if paging.literal().is_none() {
            return Err(unsupported(paging.kind(), "paging must be a literal value"));
        }
    }
    Ok(())
}

/// Command targets must be a single table; returns its name
fn check_target(target: &Expr) -> Result<&str, TransformError> {
    match target {
        Expr::Table { name } => Ok(name),
        Expr::Join { .. } => Err(unsupported(NodeKind::Join, "joined sources")),
        Expr::Subquery { .. } => Err(unsupported(NodeKind::Subquery, "nested query as source")),
        other => Err(unsupported(other.kind(), "command source must be a table")),
    }
}

/// Columns may only belong to the command's own table
fn check_column(column: &Expr, table: &str) -> Result<(), TransformError> {
    match column {
        Expr::Column {
            table: Some(owner),
            name,
        } if owner != table => Err(unsupported(
            NodeKind::Column,
            format!("'{}.{}' belongs to another table", owner, name),
        )),
        _ => Ok(()),
    }
}

fn check_expr(expr: &Expr, table: &str) -> Result<(), TransformError> {
    match expr {
        Expr::Column { .. } => check_column(expr, table),
        Expr::NamedValue { .. } | Expr::Constant { .. } => Ok(()),
        Expr::Unary { operand, .. } => check_expr(operand, table),
        Expr::Binary { op, left, right } => {
            if matches!(op, BinaryOp::Concat | BinaryOp::Coalesce) {
                return Err(unsupported(NodeKind::Binary, format!("{:?}", op).to_lowercase()));
            }
            check_expr(left, table)?;
            check_expr(right, table)
        }
        Expr::Call { method, .. } => Err(unsupported(NodeKind::Call, method.clone())),
        Expr::Table { name } => Err(unsupported(
            NodeKind::Table,
            format!("table '{}' used as a value", name),
        )),
        Expr::Conditional { .. } => Err(unsupported(NodeKind::Conditional, "conditional value")),
        Expr::Aggregate { function, .. } => Err(unsupported(NodeKind::Aggregate, function.clone())),
        Expr::Join { .. } => Err(unsupported(NodeKind::Join, "join inside expression")),
        Expr::Subquery { .. } => Err(unsupported(NodeKind::Subquery, "nested query")),
        Expr::ScalarSubquery { .. } => {
            Err(unsupported(NodeKind::ScalarSubquery, "scalar subquery"))
        }
    }
}
