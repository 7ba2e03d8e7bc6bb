//! Async client for the hosted directory's PostgREST-style query backend.
//!
//! Three surfaces:
//!
//! - **[`QueryClient`]** — table reads ([`QueryClient::from`]) and edge
//!   function invocations ([`QueryClient::invoke_function`]).
//! - **[`QueryBuilder`]** — per-table filter/order/range accumulation,
//!   executed as one GET. Parameters are implicitly ANDed by the backend.
//! - **[`Expr`]** — a composable predicate tree rendering to the backend's
//!   boolean filter grammar, applied through
//!   [`QueryBuilder::or_filter`].
//!
//! The crate only requires the backend to honour the documented verb
//! semantics (`eq`/`neq`/`ilike`/`in`/`is`/`gt`/`gte`/`lt`/`lte`/`or`/
//! `order` plus `Range` paging) and to answer non-2xx exactly on failure.

pub mod client;
pub mod error;
pub mod expr;
pub mod query;
pub mod transport;

pub use client::QueryClient;
pub use error::Error;
pub use expr::{CmpOp, Expr, escape_value};
pub use query::{Page, QueryBuilder};
pub use transport::ClientConfig;
