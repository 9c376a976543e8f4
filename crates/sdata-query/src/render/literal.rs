//! Literal formatting for protocol expressions.

use crate::ast::{Literal, NodeKind};
use crate::error::RenderError;
use sdata_uri::protocol::DATE_TIME_FORMAT;

/// Render a literal as it appears in a `where` clause or key predicate.
///
/// - strings: single-quoted, or double-quoted when they contain `'`
/// - floats/decimals: always carry a decimal point
/// - datetimes: `@yyyy-MM-ddTHH:mm:ss+hh:mm@`
/// - enums: their integer value
/// - GUIDs: single-quoted hyphenated form
pub fn render_literal(value: &Literal) -> Result<String, RenderError> {
    match value {
        Literal::String(s) => quote_string(s),
        Literal::Char(c) => quote_string(&c.to_string()),
        Literal::Int(i) => Ok(i.to_string()),
        Literal::Float(f) => {
            if !f.is_finite() {
                return Err(RenderError::InvalidLiteral(format!("non-finite float {}", f)));
            }
            Ok(with_decimal_point(f.to_string()))
        }
        Literal::Decimal(text) => {
            if !is_plain_decimal(text) {
                return Err(RenderError::InvalidLiteral(format!("decimal '{}'", text)));
            }
            Ok(with_decimal_point(text.clone()))
        }
        Literal::DateTime(dt) => Ok(format!("@{}@", dt.format(DATE_TIME_FORMAT))),
        Literal::Enum { value, .. } => Ok(value.to_string()),
        Literal::Guid(guid) => Ok(format!("'{}'", guid.hyphenated())),
        Literal::Bool(_) => Err(RenderError::unsupported(NodeKind::Constant, "boolean literal")),
        Literal::Null => Err(RenderError::unsupported(NodeKind::Constant, "null literal")),
    }
}

fn quote_string(s: &str) -> Result<String, RenderError> {
    match (s.contains('\''), s.contains('"')) {
        (true, true) => Err(RenderError::unsupported(
            NodeKind::Constant,
            "string containing both quote characters",
        )),
        (true, false) => Ok(format!("\"{}\"", s)),
        _ => Ok(format!("'{}'", s)),
    }
}

fn with_decimal_point(mut text: String) -> String {
    if !text.contains('.') {
        text.push_str(".0");
    }
    text
}

/// Optional sign, digits, then optionally a point and more digits
fn is_plain_decimal(text: &str) -> bool {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    match unsigned.split_once('.') {
        Some((whole, fraction)) => all_digits(whole) && all_digits(fraction),
        None => all_digits(unsigned),
    }
}
