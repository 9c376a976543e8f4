//! SData request renderer.
//!
//! Renders commands as a collection segment appended to the base URI plus
//! protocol query arguments:
//! - key equality in `where` folds into the segment predicate: `Accounts(123)`
//! - any other filter becomes `where=`
//! - ordering, projection and paging map to `orderby`, `select`,
//!   `startIndex` and `count`

use crate::ast::{BinaryOp, Command, Expr, NodeKind, OrderExpr, SelectCommand, UnaryOp};
use crate::error::RenderError;
use crate::render::literal::render_literal;
use crate::render::{CommandRenderer, HttpVerb, TranslatedRequest};
use sdata_uri::{args, DialectConfig, PathSegment, ProtocolUri};
use std::collections::HashMap;
use tracing::trace;

/// Renderer for the SData query dialect.
#[derive(Debug, Clone)]
pub struct SDataRenderer {
    /// Column whose equality with a named value folds into the path
    pub key_column: String,
    /// Logical table name to protocol resource kind
    resource_names: HashMap<String, String>,
}

impl Default for SDataRenderer {
    fn default() -> Self {
        Self::from_dialect(DialectConfig::shared())
    }
}

impl SDataRenderer {
    pub fn from_dialect(dialect: &DialectConfig) -> Self {
        Self {
            key_column: dialect.key_column.clone(),
            resource_names: HashMap::new(),
        }
    }

    /// Map a logical table to a differently named resource kind
    pub fn with_resource_name(mut self, table: impl Into<String>, resource: impl Into<String>) -> Self {
        self.resource_names.insert(table.into(), resource.into());
        self
    }

    fn resource_name(&self, table: &str) -> String {
        self.resource_names
            .get(table)
            .cloned()
            .unwrap_or_else(|| table.to_string())
    }

    fn plan(&self, command: &Command) -> Result<RequestPlan, RenderError> {
        match command {
            Command::Select(select) => self.plan_select(select),
            Command::Insert(insert) => {
                let table = target_table(&insert.table)?;
                Ok(RequestPlan::new(HttpVerb::Post, self.resource_name(table)))
            }
            Command::Update(update) => {
                let table = target_table(&update.table)?;
                let mut plan = RequestPlan::new(HttpVerb::Put, self.resource_name(table));
                self.plan_where(&mut plan, table, update.where_clause.as_ref())?;
                Ok(plan)
            }
            Command::Delete(delete) => {
                let table = target_table(&delete.table)?;
                let mut plan = RequestPlan::new(HttpVerb::Delete, self.resource_name(table));
                self.plan_where(&mut plan, table, delete.where_clause.as_ref())?;
                Ok(plan)
            }
        }
    }

    fn plan_select(&self, select: &SelectCommand) -> Result<RequestPlan, RenderError> {
        let table = target_table(&select.source)?;
        let mut plan = RequestPlan::new(HttpVerb::Get, self.resource_name(table));
        if let Some(first) = select.group_by.first() {
            return Err(RenderError::unsupported(
                NodeKind::GroupBy,
                format!("grouping by {}", first.kind()),
            ));
        }

        self.plan_where(&mut plan, table, select.where_clause.as_ref())?;

        for OrderExpr { expr, descending } in &select.order_by {
            if *descending {
                trace!("descending flag dropped from order expression");
            }
            plan.order_by.push(self.render_expr(expr, table)?);
        }

        for column in &select.columns {
            match column {
                Expr::Column { .. } => plan.select.push(self.render_expr(column, table)?),
                Expr::Table { .. } => {}
                other => {
                    return Err(RenderError::unsupported(other.kind(), "computed projection"));
                }
            }
        }

        plan.start_index = select
            .skip
            .as_ref()
            .map(|expr| paging_value("skip", expr))
            .transpose()?;
        plan.count = select
            .take
            .as_ref()
            .map(|expr| paging_value("take", expr))
            .transpose()?;

        Ok(plan)
    }

    fn plan_where(
        &self,
        plan: &mut RequestPlan,
        table: &str,
        predicate: Option<&Expr>,
    ) -> Result<(), RenderError> {
        let Some(predicate) = predicate else {
            return Ok(());
        };
        if let Some(key) = self.key_lookup(predicate, table) {
            let rendered = render_literal(key)?;
            trace!(key = %rendered, resource = %plan.resource, "folding key lookup into path");
            plan.key_predicate = Some(rendered);
        } else {
            plan.filter = Some(self.render_expr(predicate, table)?);
        }
        Ok(())
    }

    /// Value of a top-level `key == @named` predicate
    fn key_lookup<'e>(&self, predicate: &'e Expr, table: &str) -> Option<&'e crate::ast::Literal> {
        match predicate {
            Expr::Binary {
                op: BinaryOp::Eq,
                left,
                right,
            } => match (left.as_ref(), right.as_ref()) {
                (Expr::Column { name, .. }, Expr::NamedValue { value, .. })
                    if *name == self.key_column && !left.is_foreign_column(table) =>
                {
                    Some(value)
                }
                _ => None,
            },
            _ => None,
        }
    }

    /// Render an expression in the protocol's filter syntax. Columns must
    /// be unqualified or belong to `table`.
    pub fn render_expr(&self, expr: &Expr, table: &str) -> Result<String, RenderError> {
        match expr {
            Expr::Column {
                table: Some(owner),
                name,
            } if owner != table => Err(RenderError::unsupported(
                NodeKind::Column,
                format!("'{}.{}' belongs to another table", owner, name),
            )),
            Expr::Column { name, .. } => Ok(name.clone()),
            Expr::NamedValue { value, .. } | Expr::Constant { value } => render_literal(value),
            Expr::Unary { op, operand } => {
                let operand = self.render_operand(operand, table)?;
                Ok(match op {
                    UnaryOp::Not => format!("not {}", operand),
                    UnaryOp::Negate => format!("-{}", operand),
                })
            }
            Expr::Binary { op, left, right } => {
                let token = binary_token(*op)?;
                if op.is_comparison() {
                    let left = self.render_operand(left, table)?;
                    let right = self.render_operand(right, table)?;
                    Ok(format!("{} {} {}", left, token, right))
                } else {
                    let left = self.render_expr(left, table)?;
                    let right = self.render_expr(right, table)?;
                    Ok(format!("({} {} {})", left, token, right))
                }
            }
            Expr::Call { method, .. } => Err(RenderError::unsupported(NodeKind::Call, method.clone())),
            Expr::Table { name } => Err(RenderError::unsupported(
                NodeKind::Table,
                format!("table '{}' used as a value", name),
            )),
            other => Err(RenderError::unsupported(other.kind(), "not expressible in a filter")),
        }
    }

    /// Comparisons nested as operands get their own parentheses
    fn render_operand(&self, expr: &Expr, table: &str) -> Result<String, RenderError> {
        let rendered = self.render_expr(expr, table)?;
        match expr {
            Expr::Binary { op, .. } if op.is_comparison() => Ok(format!("({})", rendered)),
            _ => Ok(rendered),
        }
    }
}

impl CommandRenderer for SDataRenderer {
    fn name(&self) -> &str {
        "sdata"
    }

    fn render(&self, command: &Command, base: &ProtocolUri) -> Result<TranslatedRequest, RenderError> {
        let plan = self.plan(command)?;
        Ok(plan.apply(base))
    }
}

/// Name of a command's target table
fn target_table(target: &Expr) -> Result<&str, RenderError> {
    match target {
        Expr::Table { name } => Ok(name),
        other => Err(RenderError::unsupported(
            other.kind(),
            "command source must be a table",
        )),
    }
}

fn binary_token(op: BinaryOp) -> Result<&'static str, RenderError> {
    Ok(match op {
        BinaryOp::And => "and",
        BinaryOp::Or => "or",
        BinaryOp::Eq => "eq",
        BinaryOp::Ne => "ne",
        BinaryOp::Lt => "lt",
        BinaryOp::Le => "le",
        BinaryOp::Gt => "gt",
        BinaryOp::Ge => "ge",
        BinaryOp::Add => "+",
        BinaryOp::Subtract => "-",
        BinaryOp::Multiply => "mul",
        BinaryOp::Divide => "div",
        BinaryOp::Modulo => "mod",
        BinaryOp::Concat | BinaryOp::Coalesce => {
            return Err(RenderError::unsupported(
                NodeKind::Binary,
                format!("{:?}", op).to_lowercase(),
            ));
        }
    })
}

fn paging_value(clause: &'static str, expr: &Expr) -> Result<i64, RenderError> {
    match expr.literal() {
        Some(crate::ast::Literal::Int(value)) if *value >= 0 => Ok(*value),
        Some(other) => Err(RenderError::InvalidPaging {
            clause,
            detail: format!("{:?}", other),
        }),
        None => Err(RenderError::InvalidPaging {
            clause,
            detail: format!("{} is not a literal", expr.kind()),
        }),
    }
}

/// Everything the request needs, collected before touching the URI so a
/// failure leaves nothing half-built.
#[derive(Debug)]
struct RequestPlan {
    verb: HttpVerb,
    resource: String,
    key_predicate: Option<String>,
    filter: Option<String>,
    order_by: Vec<String>,
    select: Vec<String>,
    start_index: Option<i64>,
    count: Option<i64>,
}

impl RequestPlan {
    fn new(verb: HttpVerb, resource: String) -> Self {
        Self {
            verb,
            resource,
            key_predicate: None,
            filter: None,
            order_by: Vec::new(),
            select: Vec::new(),
            start_index: None,
            count: None,
        }
    }

    fn apply(self, base: &ProtocolUri) -> TranslatedRequest {
        let mut uri = base.clone();
        uri.push_segment(PathSegment::with_predicate(self.resource, self.key_predicate));

        if let Some(filter) = self.filter {
            uri.set_where_clause(Some(filter));
        }
        if !self.order_by.is_empty() {
            uri.set_query_arg(args::ORDER_BY, self.order_by.join(","));
        }
        if !self.select.is_empty() {
            uri.set_select(&self.select);
        }
        uri.set_start_index(self.start_index);
        uri.set_count(self.count);

        TranslatedRequest {
            verb: self.verb,
            uri,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{DeleteCommand, InsertCommand, Literal, UpdateCommand};
    use test_case::test_case;

    fn render(command: impl Into<Command>) -> Result<TranslatedRequest, RenderError> {
        SDataRenderer::default().render(&command.into(), &ProtocolUri::new())
    }

    fn filter(expr: Expr) -> String {
        SDataRenderer::default().render_expr(&expr, "Accounts").unwrap()
    }

    #[test]
    fn test_key_lookup_folds_into_path() {
        let select = SelectCommand::from_table("Accounts")
            .filter(Expr::column("Id").equals(Expr::named("p0", Literal::Int(123))));
        let request = render(select).unwrap();

        assert_eq!(request.verb, HttpVerb::Get);
        assert_eq!(request.path(), "/Accounts(123)");
        assert_eq!(request.query(), "");
        assert_eq!(request.uri.where_clause(), None);
    }

    #[test]
    fn test_string_key_is_quoted_in_path() {
        let select = SelectCommand::from_table("Accounts")
            .filter(Expr::column("Id").equals(Expr::named("p0", Literal::string("A1"))));
        assert_eq!(render(select).unwrap().path(), "/Accounts('A1')");
    }

    #[test]
    fn test_key_against_constant_stays_in_where() {
        let select = SelectCommand::from_table("Accounts")
            .filter(Expr::column("Id").equals(Expr::constant(Literal::Int(123))));
        let request = render(select).unwrap();
        assert_eq!(request.path(), "/Accounts");
        assert_eq!(request.query(), "where=Id eq 123");
    }

    #[test]
    fn test_general_filter_with_take() {
        let select = SelectCommand::from_table("Accounts")
            .filter(
                Expr::column("Name")
                    .equals(Expr::named("p0", Literal::string("Bob")))
                    .and(Expr::column("Age").gt(Expr::named("p1", Literal::Int(30)))),
            )
            .take(5);
        let request = render(select).unwrap();

        assert_eq!(request.path(), "/Accounts");
        assert_eq!(request.query(), "where=(Name eq 'Bob' and Age gt 30)&count=5");
    }

    #[test]
    fn test_order_projection_and_skip() {
        let select = SelectCommand::from_table("Accounts")
            .order_by(Expr::column("Name"), false)
            .order_by(Expr::column("Age"), true)
            .project(vec![Expr::column("Name"), Expr::column("Age")])
            .skip(20)
            .take(10);
        let request = render(select).unwrap();
        assert_eq!(
            request.query(),
            "orderby=Name,Age&select=Name,Age&startIndex=20&count=10"
        );
    }

    #[test_case(Expr::unary(UnaryOp::Not, Expr::column("Active")), "not Active" ; "not column")]
    #[test_case(
        Expr::column("A").equals(Expr::constant(Literal::Int(1))).not(),
        "not (A eq 1)" ; "not comparison"
    )]
    #[test_case(
        Expr::unary(UnaryOp::Negate, Expr::column("Balance")).lt(Expr::constant(Literal::Int(0))),
        "-Balance lt 0" ; "negation"
    )]
    #[test_case(
        Expr::binary(
            BinaryOp::Multiply,
            Expr::column("Price"),
            Expr::constant(Literal::Decimal("1.2".to_string())),
        ).gt(Expr::constant(Literal::Int(100))),
        "(Price mul 1.2) gt 100" ; "arithmetic inside comparison"
    )]
    #[test_case(
        Expr::column("A")
            .equals(Expr::constant(Literal::Int(1)))
            .or(Expr::column("B").equals(Expr::constant(Literal::Int(2))))
            .and(Expr::column("C").lt(Expr::constant(Literal::Float(2.0)))),
        "((A eq 1 or B eq 2) and C lt 2.0)" ; "nested logical"
    )]
    fn test_filter_rendering(expr: Expr, expected: &str) {
        assert_eq!(filter(expr), expected);
    }

    #[test]
    fn test_verbs_per_command() {
        let insert = Command::Insert(InsertCommand {
            table: Expr::table("Accounts"),
            assignments: vec![],
        });
        let update = Command::Update(UpdateCommand {
            table: Expr::table("Accounts"),
            where_clause: Some(Expr::column("Id").equals(Expr::named("p0", Literal::Int(7)))),
            assignments: vec![],
        });
        let delete = Command::Delete(DeleteCommand {
            table: Expr::table("Accounts"),
            where_clause: Some(Expr::column("Age").gt(Expr::constant(Literal::Int(90)))),
        });

        let insert = render(insert).unwrap();
        assert_eq!(insert.verb, HttpVerb::Post);
        assert_eq!(insert.path(), "/Accounts");

        let update = render(update).unwrap();
        assert_eq!(update.verb, HttpVerb::Put);
        assert_eq!(update.path(), "/Accounts(7)");

        let delete = render(delete).unwrap();
        assert_eq!(delete.verb, HttpVerb::Delete);
        assert_eq!(delete.path_and_query(), "/Accounts?where=Age gt 90");
    }

    #[test]
    fn test_resource_name_mapping() {
        let renderer = SDataRenderer::default().with_resource_name("Account", "tradingAccounts");
        let base = ProtocolUri::parse("http://host/sdata/accounts50/GCRM/-");
        let request = renderer
            .render(&SelectCommand::from_table("Account").into(), &base)
            .unwrap();
        assert_eq!(request.uri.collection_type().as_deref(), Some("tradingAccounts"));
        assert_eq!(request.path(), "/sdata/accounts50/GCRM/-/tradingAccounts");
    }

    #[test]
    fn test_custom_key_column() {
        let dialect = DialectConfig {
            key_column: "Code".to_string(),
            ..DialectConfig::default()
        };
        let renderer = SDataRenderer::from_dialect(&dialect);
        let select = SelectCommand::from_table("Items")
            .filter(Expr::column("Code").equals(Expr::named("p0", Literal::string("X9"))));
        let request = renderer.render(&select.into(), &ProtocolUri::new()).unwrap();
        assert_eq!(request.path(), "/Items('X9')");
    }

    #[test]
    fn test_negative_paging_rejected() {
        let err = render(SelectCommand::from_table("Accounts").take(-1)).unwrap_err();
        assert!(matches!(err, RenderError::InvalidPaging { clause: "take", .. }));
    }

    #[test]
    fn test_call_rejected_with_kind() {
        let select = SelectCommand::from_table("Accounts").filter(Expr::call(
            Expr::column("Name"),
            "Contains",
            vec![Expr::constant(Literal::string("x"))],
        ));
        assert!(matches!(
            render(select),
            Err(RenderError::Unsupported {
                kind: NodeKind::Call,
                ..
            })
        ));
    }

    fn qualified(table: &str, name: &str) -> Expr {
        Expr::Column {
            table: Some(table.to_string()),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_column_from_other_table_rejected() {
        let select = SelectCommand::from_table("Accounts")
            .filter(qualified("Contacts", "Name").equals(Expr::constant(Literal::string("x"))));
        assert!(matches!(
            render(select),
            Err(RenderError::Unsupported {
                kind: NodeKind::Column,
                ..
            })
        ));
    }

    #[test]
    fn test_foreign_key_column_does_not_fold() {
        let select = SelectCommand::from_table("Accounts")
            .filter(qualified("Contacts", "Id").equals(Expr::named("p0", Literal::Int(1))));
        assert!(matches!(
            render(select),
            Err(RenderError::Unsupported {
                kind: NodeKind::Column,
                ..
            })
        ));
    }

    #[test]
    fn test_foreign_order_and_projection_rejected() {
        let ordered =
            SelectCommand::from_table("Accounts").order_by(qualified("Contacts", "Name"), false);
        let projected =
            SelectCommand::from_table("Accounts").project(vec![qualified("Contacts", "Email")]);
        for select in [ordered, projected] {
            assert!(matches!(
                render(select),
                Err(RenderError::Unsupported {
                    kind: NodeKind::Column,
                    ..
                })
            ));
        }
    }

    #[test]
    fn test_column_qualified_with_own_table() {
        let select = SelectCommand::from_table("Accounts")
            .filter(qualified("Accounts", "Id").equals(Expr::named("p0", Literal::Int(5))))
            .project(vec![qualified("Accounts", "Name")]);
        let request = render(select).unwrap();
        assert_eq!(request.path(), "/Accounts(5)");
        assert_eq!(request.query(), "select=Name");
    }

    #[test]
    fn test_boolean_constant_rejected() {
        let select = SelectCommand::from_table("Accounts")
            .filter(Expr::column("Active").equals(Expr::constant(Literal::Bool(true))));
        assert!(matches!(
            render(select),
            Err(RenderError::Unsupported {
                kind: NodeKind::Constant,
                ..
            })
        ));
    }
}
