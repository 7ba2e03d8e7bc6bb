// ── Composable predicate expressions ──
//
// A small expression tree that renders to the backend's boolean filter
// grammar: `and(a,b)`, `or(a,b)`, `field.op.value`, `field.in.(v1,v2)`.
// Callers build the tree directly instead of round-tripping through a
// delimited string, so nesting depth is handled structurally.

use std::fmt;

/// Comparison operators understood by the query endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Neq,
    Like,
    Ilike,
    Gt,
    Gte,
    Lt,
    Lte,
    Is,
}

impl CmpOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Like => "like",
            Self::Ilike => "ilike",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Is => "is",
        }
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A boolean predicate expression over table columns.
///
/// Values are carried as already-rendered strings: the caller is expected
/// to run string values through [`escape_value`] (dates through ISO-8601
/// first) before constructing a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `field.op.value`
    Cmp {
        field: String,
        op: CmpOp,
        value: String,
    },
    /// `field.not.op.value`
    Not {
        field: String,
        op: CmpOp,
        value: String,
    },
    /// `field.in.(v1,v2,...)`
    In { field: String, values: Vec<String> },
    /// `and(child1,child2,...)`
    And(Vec<Expr>),
    /// `or(child1,child2,...)`
    Or(Vec<Expr>),
}

impl Expr {
    pub fn cmp(field: impl Into<String>, op: CmpOp, value: impl Into<String>) -> Self {
        Self::Cmp {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn not(field: impl Into<String>, op: CmpOp, value: impl Into<String>) -> Self {
        Self::Not {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn in_list(field: impl Into<String>, values: Vec<String>) -> Self {
        Self::In {
            field: field.into(),
            values,
        }
    }

    /// Render to the backend's textual filter grammar.
    pub fn render(&self) -> String {
        match self {
            Self::Cmp { field, op, value } => format!("{field}.{op}.{value}"),
            Self::Not { field, op, value } => format!("{field}.not.{op}.{value}"),
            Self::In { field, values } => {
                format!("{field}.in.({})", values.join(","))
            }
            Self::And(children) => Self::render_group("and", children),
            Self::Or(children) => Self::render_group("or", children),
        }
    }

    /// Render for use as the value of a top-level `or=` parameter, which
    /// expects a parenthesised comma-separated clause list without the
    /// leading `or` keyword.
    pub(crate) fn render_or_param(&self) -> String {
        match self {
            Self::Or(children) => {
                let parts: Vec<String> = children.iter().map(Expr::render).collect();
                format!("({})", parts.join(","))
            }
            other => format!("({})", other.render()),
        }
    }

    fn render_group(glue: &str, children: &[Expr]) -> String {
        let parts: Vec<String> = children.iter().map(Expr::render).collect();
        format!("{glue}({})", parts.join(","))
    }
}

/// Backslash-escape the characters that delimit the textual filter grammar.
///
/// Commas separate clauses, parentheses group them, and backslash is the
/// escape character itself; all three must be escaped inside string values
/// to keep a rendered expression well-formed.
pub fn escape_value(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, ',' | '(' | ')' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
