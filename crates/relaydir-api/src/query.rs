// ── Table query builder ──
//
// Collects filter, order, and range parameters for a single table read,
// then executes it as one GET against the REST endpoint. Filter verbs
// mirror the backend's query grammar: `?field=eq.value`, `?or=(...)`,
// `?order=field.asc`, with the row window carried in a `Range` header.

use reqwest::header::{AUTHORIZATION, CONTENT_RANGE};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::expr::Expr;

const BODY_PREVIEW_LEN: usize = 200;

/// One page of raw rows plus the total match count, when requested.
#[derive(Debug)]
pub struct Page {
    pub rows: Vec<serde_json::Value>,
    /// Total rows matching the filters (from `Content-Range`), present
    /// only when the query asked for an exact count.
    pub total: Option<u64>,
}

/// Builder for a single table read.
///
/// Every filter verb appends one query parameter; parameters are implicitly
/// ANDed by the backend. The builder is consumed by [`execute`](Self::execute).
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    http: reqwest::Client,
    url: Url,
    api_key: SecretString,
    select: String,
    params: Vec<(String, String)>,
    count_exact: bool,
    range: Option<(u64, u64)>,
}

impl QueryBuilder {
    pub(crate) fn new(http: reqwest::Client, url: Url, api_key: SecretString) -> Self {
        Self {
            http,
            url,
            api_key,
            select: "*".into(),
            params: Vec::new(),
            count_exact: false,
            range: None,
        }
    }

    /// Restrict the returned columns (defaults to `*`). Embedded-resource
    /// selects are passed through verbatim.
    pub fn select(mut self, columns: &str) -> Self {
        self.select = columns.into();
        self
    }

    /// Ask the backend to report the exact total match count.
    pub fn count_exact(mut self) -> Self {
        self.count_exact = true;
        self
    }

    // ── Filter verbs ─────────────────────────────────────────────────

    pub fn eq(self, field: &str, value: impl ToString) -> Self {
        self.push(field, format!("eq.{}", value.to_string()))
    }

    pub fn neq(self, field: &str, value: impl ToString) -> Self {
        self.push(field, format!("neq.{}", value.to_string()))
    }

    /// Case-sensitive pattern match; `*` is the wildcard.
    pub fn like(self, field: &str, pattern: &str) -> Self {
        self.push(field, format!("like.{pattern}"))
    }

    /// Case-insensitive pattern match; `*` is the wildcard.
    pub fn ilike(self, field: &str, pattern: &str) -> Self {
        self.push(field, format!("ilike.{pattern}"))
    }

    /// Negated operator application: `field=not.op.pattern`.
    pub fn not(self, field: &str, op: &str, pattern: &str) -> Self {
        self.push(field, format!("not.{op}.{pattern}"))
    }

    /// `field IS NULL`.
    pub fn is_null(self, field: &str) -> Self {
        self.push(field, "is.null".into())
    }

    /// Membership test: `field=in.(v1,v2,...)`. Elements are escaped for
    /// the list grammar.
    pub fn in_list<I, S>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rendered: Vec<String> = values
            .into_iter()
            .map(|v| crate::expr::escape_value(v.as_ref()))
            .collect();
        self.push(field, format!("in.({})", rendered.join(",")))
    }

    pub fn gt(self, field: &str, value: impl ToString) -> Self {
        self.push(field, format!("gt.{}", value.to_string()))
    }

    pub fn gte(self, field: &str, value: impl ToString) -> Self {
        self.push(field, format!("gte.{}", value.to_string()))
    }

    pub fn lt(self, field: &str, value: impl ToString) -> Self {
        self.push(field, format!("lt.{}", value.to_string()))
    }

    pub fn lte(self, field: &str, value: impl ToString) -> Self {
        self.push(field, format!("lte.{}", value.to_string()))
    }

    /// Apply a predicate expression as one `or=(...)` parameter.
    ///
    /// Several `or_filter` calls are ANDed together by the backend, which
    /// is how an outer AND of OR-groups is expressed.
    pub fn or_filter(mut self, expr: &Expr) -> Self {
        self.params.push(("or".into(), expr.render_or_param()));
        self
    }

    // ── Ordering and paging ──────────────────────────────────────────

    pub fn order(mut self, field: &str, ascending: bool) -> Self {
        let dir = if ascending { "asc" } else { "desc" };
        self.params.push(("order".into(), format!("{field}.{dir}")));
        self
    }

    /// Inclusive zero-based row window, sent as a `Range` header.
    pub fn range(mut self, from: u64, to: u64) -> Self {
        self.range = Some((from, to));
        self
    }

    /// The accumulated query parameters, in application order. Exposed for
    /// inspection (the filter compiler's tests rely on it).
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    fn push(mut self, field: &str, value: String) -> Self {
        self.params.push((field.into(), value));
        self
    }

    // ── Execution ────────────────────────────────────────────────────

    /// Run the query. Fails with [`Error::Api`] on any non-success status;
    /// no rows are decoded in that case.
    pub async fn execute(self) -> Result<Page, Error> {
        let mut url = self.url;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("select", &self.select);
            for (key, value) in &self.params {
                pairs.append_pair(key, value);
            }
        }

        debug!("GET {}", url);

        let key = self.api_key.expose_secret();
        let mut request = self
            .http
            .get(url)
            .header("apikey", key)
            .header(AUTHORIZATION, format!("Bearer {key}"));
        if self.count_exact {
            request = request.header("Prefer", "count=exact");
        }
        if let Some((from, to)) = self.range {
            request = request.header("Range", format!("{from}-{to}"));
        }

        let resp = request.send().await.map_err(Error::Transport)?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message: preview(&body).to_owned(),
            });
        }

        let total = resp
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total);

        let body = resp.text().await.map_err(Error::Transport)?;
        let rows: Vec<serde_json::Value> = serde_json::from_str(&body).map_err(|e| {
            let preview = preview(&body);
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
            }
        })?;

        Ok(Page { rows, total })
    }
}

/// Truncate a body for error messages, backing up to a char boundary so
/// multi-byte text never splits mid-character.
fn preview(body: &str) -> &str {
    let mut end = BODY_PREVIEW_LEN.min(body.len());
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

/// Parse the total from a `Content-Range` value like `0-19/57`.
/// An unknown total (`0-19/*`) yields `None`.
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit('/').next()?.parse().ok()
}
