//! HTTP handlers, one module per resource.
//!
//! Handlers decode input, apply the ownership rules and translate store results
//! into responses. Failures are `ApiError`s, rendered as `{"error": "..."}`.

pub mod articles;
pub mod auth;
pub mod authors;
pub mod images;

/// List endpoints always return the first page; paging parameters are not accepted.
pub const LIST_LIMIT: i64 = 10;
pub const LIST_OFFSET: i64 = 0;
