//! Social network clients and extractors used by harvest.
//!
//! Only the Twitter/X API v2 pipeline exists: the full-archive search client,
//! the "missing means empty" response extractors, and the pagination driver that
//! folds pages into one [`twitter::Aggregate`].
pub mod error;
pub mod twitter;

pub use error::SocialError;
