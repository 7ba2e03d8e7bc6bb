// ── Filter tree and predicate compilation ──
//
// A structured filter descriptor (rules combined by and/or groups,
// arbitrarily nested) compiled into query predicates. Flat AND groups
// take the fast path: one native predicate parameter per rule. Anything
// else compiles recursively into an `Expr` tree; a root OR becomes a
// single `or=` parameter, a root AND of mixed children becomes one `or=`
// parameter per child (the backend ANDs parameters together).

use chrono::{DateTime, SecondsFormat, Utc};

use relaydir_api::{CmpOp, Expr, QueryBuilder, escape_value};

use crate::error::CoreError;

/// A scalar or range value carried by a filter rule.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Str(String),
    Num(f64),
    Bool(bool),
    Date(DateTime<Utc>),
    /// Range operand for between/not-between (must hold exactly two
    /// elements when used that way).
    List(Vec<FilterValue>),
}

impl FilterValue {
    /// Raw rendering: dates serialize to ISO-8601, everything else to its
    /// plain textual form.
    fn to_raw(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            Self::Num(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Date(d) => d.to_rfc3339_opts(SecondsFormat::Millis, true),
            Self::List(items) => items
                .iter()
                .map(Self::to_raw)
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    /// Rendering for the textual grammar: string values get their
    /// delimiter characters escaped, other scalars pass through.
    fn to_escaped(&self) -> String {
        match self {
            Self::Str(s) => escape_value(s),
            other => other.to_raw(),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self {
        Self::Num(n)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Per-rule comparison operators. The set is closed: an operator outside
/// it cannot be expressed, so nothing can silently render to an empty
/// predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Contains,
    NotContains,
    Equal,
    NotEqual,
    BeginsWith,
    NotBeginsWith,
    EndsWith,
    NotEndsWith,
    Greater,
    Less,
    GreaterOrEqual,
    LessOrEqual,
    Between,
    NotBetween,
}

/// An atomic predicate: field, operator, value, and an optional explicit
/// includes list which, when non-empty, turns the rule into a membership
/// test regardless of the nominal operator.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterRule {
    pub field: String,
    pub op: FilterOp,
    pub value: FilterValue,
    pub includes: Option<Vec<FilterValue>>,
}

impl FilterRule {
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<FilterValue>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
            includes: None,
        }
    }

    pub fn with_includes(mut self, includes: Vec<FilterValue>) -> Self {
        self.includes = Some(includes);
        self
    }

    fn active_includes(&self) -> Option<&[FilterValue]> {
        self.includes.as_deref().filter(|list| !list.is_empty())
    }

    /// The two operands of a between/not-between range.
    fn range_bounds(&self) -> Result<(&FilterValue, &FilterValue), CoreError> {
        if let FilterValue::List(items) = &self.value {
            if let [lo, hi] = items.as_slice() {
                return Ok((lo, hi));
            }
        }
        Err(CoreError::InvalidFilter {
            reason: format!(
                "'{}' requires exactly two values for a between range",
                self.field
            ),
        })
    }
}

/// Boolean combinator for a group's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glue {
    And,
    Or,
}

/// One node of the filter tree.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    Rule(FilterRule),
    Group(FilterGroup),
}

/// A boolean combination of rules and nested groups.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterGroup {
    pub glue: Glue,
    pub rules: Vec<FilterNode>,
}

impl FilterGroup {
    pub fn and(rules: Vec<FilterNode>) -> Self {
        Self {
            glue: Glue::And,
            rules,
        }
    }

    pub fn or(rules: Vec<FilterNode>) -> Self {
        Self {
            glue: Glue::Or,
            rules,
        }
    }

    /// Fast-path eligibility: an AND of plain rules with no nesting.
    fn is_flat_and(&self) -> bool {
        self.glue == Glue::And
            && self
                .rules
                .iter()
                .all(|node| matches!(node, FilterNode::Rule(_)))
    }
}

/// Apply a filter tree to a query. An absent filter or an empty rule
/// list leaves the query unchanged.
pub fn apply_filter(
    query: QueryBuilder,
    filter: Option<&FilterGroup>,
) -> Result<QueryBuilder, CoreError> {
    let Some(group) = filter else {
        return Ok(query);
    };
    if group.rules.is_empty() {
        return Ok(query);
    }

    if group.is_flat_and() {
        let mut query = query;
        for node in &group.rules {
            if let FilterNode::Rule(rule) = node {
                query = apply_rule_native(query, rule)?;
            }
        }
        return Ok(query);
    }

    match group.glue {
        // A root OR compiles to exactly one combined or= parameter.
        Glue::Or => match compile_group(group)? {
            Some(expr) => Ok(query.or_filter(&expr)),
            None => Ok(query),
        },
        // A root AND with nested groups: each child becomes its own or=
        // parameter; the backend ANDs the parameters together.
        Glue::And => {
            let mut query = query;
            for node in &group.rules {
                let expr = match node {
                    FilterNode::Rule(rule) => Some(compile_rule(rule)?),
                    FilterNode::Group(nested) => compile_group(nested)?,
                };
                if let Some(expr) = expr {
                    query = query.or_filter(&expr);
                }
            }
            Ok(query)
        }
    }
}

/// Fast path: apply one rule as a native predicate parameter.
fn apply_rule_native(query: QueryBuilder, rule: &FilterRule) -> Result<QueryBuilder, CoreError> {
    if let Some(includes) = rule.active_includes() {
        let values: Vec<String> = includes.iter().map(FilterValue::to_raw).collect();
        return Ok(query.in_list(&rule.field, values));
    }

    let field = rule.field.as_str();
    let raw = rule.value.to_raw();
    Ok(match rule.op {
        FilterOp::Contains => query.ilike(field, &format!("*{raw}*")),
        FilterOp::NotContains => query.not(field, "ilike", &format!("*{raw}*")),
        FilterOp::Equal => query.eq(field, raw),
        FilterOp::NotEqual => query.neq(field, raw),
        FilterOp::BeginsWith => query.ilike(field, &format!("{raw}*")),
        FilterOp::NotBeginsWith => query.not(field, "ilike", &format!("{raw}*")),
        FilterOp::EndsWith => query.ilike(field, &format!("*{raw}")),
        FilterOp::NotEndsWith => query.not(field, "ilike", &format!("*{raw}")),
        FilterOp::Greater => query.gt(field, raw),
        FilterOp::Less => query.lt(field, raw),
        FilterOp::GreaterOrEqual => query.gte(field, raw),
        FilterOp::LessOrEqual => query.lte(field, raw),
        FilterOp::Between => {
            let (lo, hi) = rule.range_bounds()?;
            query.gte(field, lo.to_raw()).lte(field, hi.to_raw())
        }
        FilterOp::NotBetween => {
            let (lo, hi) = rule.range_bounds()?;
            let expr = Expr::Or(vec![
                Expr::cmp(field, CmpOp::Lt, lo.to_escaped()),
                Expr::cmp(field, CmpOp::Gt, hi.to_escaped()),
            ]);
            query.or_filter(&expr)
        }
    })
}

/// Compile one rule into a predicate expression.
fn compile_rule(rule: &FilterRule) -> Result<Expr, CoreError> {
    if let Some(includes) = rule.active_includes() {
        let values: Vec<String> = includes.iter().map(FilterValue::to_escaped).collect();
        return Ok(Expr::in_list(rule.field.clone(), values));
    }

    let field = rule.field.clone();
    let escaped = rule.value.to_escaped();
    Ok(match rule.op {
        FilterOp::Contains => Expr::cmp(field, CmpOp::Ilike, format!("*{escaped}*")),
        FilterOp::NotContains => Expr::not(field, CmpOp::Ilike, format!("*{escaped}*")),
        FilterOp::Equal => Expr::cmp(field, CmpOp::Eq, escaped),
        FilterOp::NotEqual => Expr::cmp(field, CmpOp::Neq, escaped),
        FilterOp::BeginsWith => Expr::cmp(field, CmpOp::Ilike, format!("{escaped}*")),
        FilterOp::NotBeginsWith => Expr::not(field, CmpOp::Ilike, format!("{escaped}*")),
        FilterOp::EndsWith => Expr::cmp(field, CmpOp::Ilike, format!("*{escaped}")),
        FilterOp::NotEndsWith => Expr::not(field, CmpOp::Ilike, format!("*{escaped}")),
        FilterOp::Greater => Expr::cmp(field, CmpOp::Gt, escaped),
        FilterOp::Less => Expr::cmp(field, CmpOp::Lt, escaped),
        FilterOp::GreaterOrEqual => Expr::cmp(field, CmpOp::Gte, escaped),
        FilterOp::LessOrEqual => Expr::cmp(field, CmpOp::Lte, escaped),
        FilterOp::Between => {
            let (lo, hi) = rule.range_bounds()?;
            Expr::And(vec![
                Expr::cmp(field.clone(), CmpOp::Gte, lo.to_escaped()),
                Expr::cmp(field, CmpOp::Lte, hi.to_escaped()),
            ])
        }
        FilterOp::NotBetween => {
            let (lo, hi) = rule.range_bounds()?;
            Expr::Or(vec![
                Expr::cmp(field.clone(), CmpOp::Lt, lo.to_escaped()),
                Expr::cmp(field, CmpOp::Gt, hi.to_escaped()),
            ])
        }
    })
}

/// Compile a group recursively. Empty groups contribute nothing; a
/// single-child group collapses to that child.
fn compile_group(group: &FilterGroup) -> Result<Option<Expr>, CoreError> {
    let mut children = Vec::with_capacity(group.rules.len());
    for node in &group.rules {
        match node {
            FilterNode::Rule(rule) => children.push(compile_rule(rule)?),
            FilterNode::Group(nested) => {
                if let Some(expr) = compile_group(nested)? {
                    children.push(expr);
                }
            }
        }
    }

    Ok(match children.len() {
        0 => None,
        1 => children.pop(),
        _ => Some(match group.glue {
            Glue::And => Expr::And(children),
            Glue::Or => Expr::Or(children),
        }),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use relaydir_api::QueryClient;
    use url::Url;

    fn query() -> QueryBuilder {
        let client = QueryClient::with_client(
            reqwest::Client::new(),
            Url::parse("http://localhost").unwrap(),
            "key".to_string().into(),
        );
        client.from("t").unwrap()
    }

    fn rule(field: &str, op: FilterOp, value: impl Into<FilterValue>) -> FilterNode {
        FilterNode::Rule(FilterRule::new(field, op, value))
    }

    #[test]
    fn absent_or_empty_filter_leaves_query_unchanged() {
        let q = apply_filter(query(), None).unwrap();
        assert!(q.params().is_empty());

        let empty = FilterGroup::and(vec![]);
        let q = apply_filter(query(), Some(&empty)).unwrap();
        assert!(q.params().is_empty());
    }

    #[test]
    fn flat_and_takes_fast_path_with_one_param_per_rule() {
        let group = FilterGroup::and(vec![
            rule("status", FilterOp::Equal, true),
            rule("uptime7", FilterOp::GreaterOrEqual, 50.0),
            rule("host", FilterOp::Contains, "example"),
        ]);
        let q = apply_filter(query(), Some(&group)).unwrap();

        assert_eq!(
            q.params(),
            [
                ("status".to_owned(), "eq.true".to_owned()),
                ("uptime7".to_owned(), "gte.50".to_owned()),
                ("host".to_owned(), "ilike.*example*".to_owned()),
            ]
        );
    }

    #[test]
    fn root_or_compiles_to_single_combined_param() {
        let group = FilterGroup::or(vec![
            rule("country", FilterOp::Equal, "DE"),
            rule("country", FilterOp::Equal, "FR"),
            FilterNode::Group(FilterGroup::and(vec![
                rule("status", FilterOp::Equal, true),
                rule("uptime7", FilterOp::Greater, 90.0),
            ])),
        ]);
        let q = apply_filter(query(), Some(&group)).unwrap();

        assert_eq!(
            q.params(),
            [(
                "or".to_owned(),
                "(country.eq.DE,country.eq.FR,and(status.eq.true,uptime7.gt.90))".to_owned()
            )]
        );
    }

    #[test]
    fn root_and_with_nesting_yields_one_or_param_per_child() {
        let group = FilterGroup::and(vec![
            FilterNode::Group(FilterGroup::or(vec![
                rule("country", FilterOp::Equal, "DE"),
                rule("country", FilterOp::Equal, "FR"),
            ])),
            rule("status", FilterOp::Equal, true),
        ]);
        let q = apply_filter(query(), Some(&group)).unwrap();

        assert_eq!(
            q.params(),
            [
                ("or".to_owned(), "(country.eq.DE,country.eq.FR)".to_owned()),
                ("or".to_owned(), "(status.eq.true)".to_owned()),
            ]
        );
    }

    #[test]
    fn between_renders_gte_and_lte_conjunction() {
        let group = FilterGroup::and(vec![rule(
            "age",
            FilterOp::Between,
            FilterValue::List(vec![FilterValue::Num(5.0), FilterValue::Num(10.0)]),
        )]);
        let q = apply_filter(query(), Some(&group)).unwrap();

        assert_eq!(
            q.params(),
            [
                ("age".to_owned(), "gte.5".to_owned()),
                ("age".to_owned(), "lte.10".to_owned()),
            ]
        );
    }

    #[test]
    fn between_with_wrong_arity_is_a_validation_error() {
        let group = FilterGroup::and(vec![rule(
            "age",
            FilterOp::Between,
            FilterValue::List(vec![FilterValue::Num(5.0)]),
        )]);
        let result = apply_filter(query(), Some(&group));
        assert!(matches!(result, Err(CoreError::InvalidFilter { .. })));
    }

    #[test]
    fn not_between_renders_lt_gt_disjunction() {
        let group = FilterGroup::and(vec![rule(
            "age",
            FilterOp::NotBetween,
            FilterValue::List(vec![FilterValue::Num(5.0), FilterValue::Num(10.0)]),
        )]);
        let q = apply_filter(query(), Some(&group)).unwrap();

        assert_eq!(
            q.params(),
            [("or".to_owned(), "(age.lt.5,age.gt.10)".to_owned())]
        );
    }

    #[test]
    fn string_values_escape_grammar_delimiters() {
        let group = FilterGroup::or(vec![
            rule("name", FilterOp::Equal, "a,b(c)"),
            rule("name", FilterOp::Equal, "plain"),
        ]);
        let q = apply_filter(query(), Some(&group)).unwrap();

        assert_eq!(
            q.params(),
            [(
                "or".to_owned(),
                "(name.eq.a\\,b\\(c\\),name.eq.plain)".to_owned()
            )]
        );
    }

    #[test]
    fn includes_overrides_nominal_operator() {
        let group = FilterGroup::and(vec![FilterNode::Rule(
            FilterRule::new("uuid", FilterOp::Contains, "ignored")
                .with_includes(vec!["a".into(), "b".into()]),
        )]);
        let q = apply_filter(query(), Some(&group)).unwrap();

        assert_eq!(q.params(), [("uuid".to_owned(), "in.(a,b)".to_owned())]);
    }

    #[test]
    fn date_values_serialize_to_iso8601() {
        let date = chrono::DateTime::parse_from_rfc3339("2024-06-15T10:30:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        let group = FilterGroup::and(vec![rule(
            "created_at",
            FilterOp::GreaterOrEqual,
            FilterValue::Date(date),
        )]);
        let q = apply_filter(query(), Some(&group)).unwrap();

        assert_eq!(
            q.params(),
            [(
                "created_at".to_owned(),
                "gte.2024-06-15T10:30:00.000Z".to_owned()
            )]
        );
    }

    #[test]
    fn single_child_group_collapses() {
        let group = FilterGroup::or(vec![FilterNode::Group(FilterGroup::and(vec![rule(
            "status",
            FilterOp::Equal,
            true,
        )]))]);
        let q = apply_filter(query(), Some(&group)).unwrap();

        assert_eq!(q.params(), [("or".to_owned(), "(status.eq.true)".to_owned())]);
    }
}
