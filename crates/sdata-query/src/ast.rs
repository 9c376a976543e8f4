//! Query/command tree consumed by the translator.
//!
//! The tree is produced by an external mapping layer. It covers more than
//! the translator can render (joins, aggregates, subqueries, conditionals,
//! grouping) so that unsupported shapes can be rejected by kind instead of
//! being impossible to express.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Every kind of node the tree can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Table,
    Column,
    NamedValue,
    Constant,
    Unary,
    Binary,
    Call,
    Conditional,
    Aggregate,
    Join,
    Subquery,
    ScalarSubquery,
    GroupBy,
    Select,
    Insert,
    Update,
    Delete,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Column => "column",
            Self::NamedValue => "named value",
            Self::Constant => "constant",
            Self::Unary => "unary operator",
            Self::Binary => "binary operator",
            Self::Call => "method call",
            Self::Conditional => "conditional",
            Self::Aggregate => "aggregate",
            Self::Join => "join",
            Self::Subquery => "subquery",
            Self::ScalarSubquery => "scalar subquery",
            Self::GroupBy => "group by",
            Self::Select => "select",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Literal values carried by constants and named values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Literal {
    String(String),
    Char(char),
    Int(i64),
    Float(f64),
    /// Exact decimal in its textual form, e.g. `"12.50"`
    Decimal(String),
    DateTime(DateTime<FixedOffset>),
    Enum { name: String, value: i64 },
    Guid(Uuid),
    Bool(bool),
    Null,
}

impl Literal {
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Whether this is the integer zero
    pub fn is_zero(&self) -> bool {
        matches!(self, Self::Int(0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Not,
    Negate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    /// String concatenation (no protocol token)
    Concat,
    /// Null coalescing (no protocol token)
    Coalesce,
}

impl BinaryOp {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge
        )
    }

    /// Operator with its operands swapped: `a < b` is `b > a`
    pub fn mirrored(&self) -> Self {
        match self {
            Self::Lt => Self::Gt,
            Self::Le => Self::Ge,
            Self::Gt => Self::Lt,
            Self::Ge => Self::Le,
            other => *other,
        }
    }
}

/// Expression node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expr {
    Table {
        name: String,
    },
    Column {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        table: Option<String>,
        name: String,
    },
    /// Placeholder substituted with a runtime value
    NamedValue {
        name: String,
        value: Literal,
    },
    Constant {
        value: Literal,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Method call; `target` is absent for static calls such as `String.Compare(a, b)`
    Call {
        method: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<Box<Expr>>,
        #[serde(default)]
        args: Vec<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        if_true: Box<Expr>,
        if_false: Box<Expr>,
    },
    Aggregate {
        function: String,
        #[serde(default)]
        args: Vec<Expr>,
    },
    Join {
        left: Box<Expr>,
        right: Box<Expr>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        on: Option<Box<Expr>>,
    },
    Subquery {
        query: Box<SelectCommand>,
    },
    ScalarSubquery {
        query: Box<SelectCommand>,
    },
}

impl Expr {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Table { .. } => NodeKind::Table,
            Self::Column { .. } => NodeKind::Column,
            Self::NamedValue { .. } => NodeKind::NamedValue,
            Self::Constant { .. } => NodeKind::Constant,
            Self::Unary { .. } => NodeKind::Unary,
            Self::Binary { .. } => NodeKind::Binary,
            Self::Call { .. } => NodeKind::Call,
            Self::Conditional { .. } => NodeKind::Conditional,
            Self::Aggregate { .. } => NodeKind::Aggregate,
            Self::Join { .. } => NodeKind::Join,
            Self::Subquery { .. } => NodeKind::Subquery,
            Self::ScalarSubquery { .. } => NodeKind::ScalarSubquery,
        }
    }

    pub fn table(name: impl Into<String>) -> Self {
        Self::Table { name: name.into() }
    }

    pub fn column(name: impl Into<String>) -> Self {
        Self::Column {
            table: None,
            name: name.into(),
        }
    }

    pub fn named(name: impl Into<String>, value: Literal) -> Self {
        Self::NamedValue {
            name: name.into(),
            value,
        }
    }

    pub fn constant(value: Literal) -> Self {
        Self::Constant { value }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Self::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn equals(self, other: Expr) -> Self {
        Self::binary(BinaryOp::Eq, self, other)
    }

    pub fn gt(self, other: Expr) -> Self {
        Self::binary(BinaryOp::Gt, self, other)
    }

    pub fn lt(self, other: Expr) -> Self {
        Self::binary(BinaryOp::Lt, self, other)
    }

    pub fn and(self, other: Expr) -> Self {
        Self::binary(BinaryOp::And, self, other)
    }

    pub fn or(self, other: Expr) -> Self {
        Self::binary(BinaryOp::Or, self, other)
    }

    pub fn not(self) -> Self {
        Self::unary(UnaryOp::Not, self)
    }

    /// Instance call `target.method(args)`
    pub fn call(target: Expr, method: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::Call {
            method: method.into(),
            target: Some(Box::new(target)),
            args,
        }
    }

    /// Static call `Type.method(args)`
    pub fn static_call(method: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::Call {
            method: method.into(),
            target: None,
            args,
        }
    }

    /// Whether this is a column qualified with a table other than `table`
    pub fn is_foreign_column(&self, table: &str) -> bool {
        matches!(self, Self::Column { table: Some(owner), .. } if owner != table)
    }

    /// Literal value of a constant or named value
    pub fn literal(&self) -> Option<&Literal> {
        match self {
            Self::Constant { value } | Self::NamedValue { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// Ordering entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderExpr {
    pub expr: Expr,
    #[serde(default)]
    pub descending: bool,
}

/// Column assignment of an insert or update; carried in the request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub column: String,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectCommand {
    pub source: Expr,
    #[serde(default, rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<Expr>,
    #[serde(default)]
    pub order_by: Vec<OrderExpr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<Expr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take: Option<Expr>,
    /// Projected columns; empty selects whole rows
    #[serde(default)]
    pub columns: Vec<Expr>,
    #[serde(default)]
    pub group_by: Vec<Expr>,
}

impl SelectCommand {
    pub fn from_table(name: impl Into<String>) -> Self {
        Self {
            source: Expr::table(name),
            where_clause: None,
            order_by: Vec::new(),
            skip: None,
            take: None,
            columns: Vec::new(),
            group_by: Vec::new(),
        }
    }

    pub fn filter(mut self, predicate: Expr) -> Self {
        self.where_clause = Some(predicate);
        self
    }

    pub fn order_by(mut self, expr: Expr, descending: bool) -> Self {
        self.order_by.push(OrderExpr { expr, descending });
        self
    }

    pub fn skip(mut self, count: i64) -> Self {
        self.skip = Some(Expr::constant(Literal::Int(count)));
        self
    }

    pub fn take(mut self, count: i64) -> Self {
        self.take = Some(Expr::constant(Literal::Int(count)));
        self
    }

    pub fn project(mut self, columns: Vec<Expr>) -> Self {
        self.columns = columns;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertCommand {
    pub table: Expr,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateCommand {
    pub table: Expr,
    #[serde(default, rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<Expr>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteCommand {
    pub table: Expr,
    #[serde(default, rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<Expr>,
}

/// Top-level command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    Select(SelectCommand),
    Insert(InsertCommand),
    Update(UpdateCommand),
    Delete(DeleteCommand),
}

impl Command {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Select(_) => NodeKind::Select,
            Self::Insert(_) => NodeKind::Insert,
            Self::Update(_) => NodeKind::Update,
            Self::Delete(_) => NodeKind::Delete,
        }
    }
}

impl From<SelectCommand> for Command {
    fn from(select: SelectCommand) -> Self {
        Self::Select(select)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_produce_expected_shape() {
        let expr = Expr::column("Age").gt(Expr::constant(Literal::Int(30)));
        assert_eq!(expr.kind(), NodeKind::Binary);
        match expr {
            Expr::Binary { op, left, .. } => {
                assert_eq!(op, BinaryOp::Gt);
                assert_eq!(*left, Expr::column("Age"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_mirrored_operators() {
        assert_eq!(BinaryOp::Lt.mirrored(), BinaryOp::Gt);
        assert_eq!(BinaryOp::Ge.mirrored(), BinaryOp::Le);
        assert_eq!(BinaryOp::Eq.mirrored(), BinaryOp::Eq);
    }

    #[test]
    fn test_foreign_column() {
        let qualified = |table: &str| Expr::Column {
            table: Some(table.to_string()),
            name: "Name".to_string(),
        };
        assert!(qualified("Contacts").is_foreign_column("Accounts"));
        assert!(!qualified("Accounts").is_foreign_column("Accounts"));
        assert!(!Expr::column("Name").is_foreign_column("Accounts"));
    }

    #[test]
    fn test_literal_accessor() {
        let named = Expr::named("p0", Literal::Int(0));
        assert!(named.literal().unwrap().is_zero());
        assert!(Expr::column("x").literal().is_none());
    }

    #[test]
    fn test_command_json_shape() {
        let command: Command = SelectCommand::from_table("Accounts")
            .filter(Expr::column("Id").equals(Expr::named("p0", Literal::Int(123))))
            .take(5)
            .into();

        let json = serde_json::to_value(&command).unwrap();
        assert_eq!(json["command"], "select");
        assert_eq!(json["source"]["kind"], "table");
        assert_eq!(json["where"]["op"], "eq");
        assert_eq!(json["where"]["right"]["value"]["type"], "int");

        let back: Command = serde_json::from_value(json).unwrap();
        assert_eq!(back, command);
    }

    #[test]
    fn test_command_from_minimal_json() {
        let command: Command = serde_json::from_str(
            r#"{"command": "delete", "table": {"kind": "table", "name": "Notes"}}"#,
        )
        .unwrap();
        assert_eq!(command.kind(), NodeKind::Delete);
    }
}
