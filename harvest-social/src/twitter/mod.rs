//! Twitter/X API v2 integration surface.
//!
//! `client` issues the HTTP calls, `extract` pulls the optional arrays and the
//! continuation token out of a raw page, `paginate` drives the page loop, and
//! `types` holds the query and aggregate values that flow between them.
pub mod client;
pub mod extract;
pub mod paginate;
pub mod types;

pub use client::{TwitterApi, username_matches};
pub use paginate::{
    ArchiveSearch, PaginationOptions, SearchSource, retrieve, retrieve_keyword_spatial,
    should_continue,
};
pub use types::{Aggregate, SearchQuery, SerializedAggregate};
