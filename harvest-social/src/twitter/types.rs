use crate::error::SocialError;
use crate::twitter::extract::PageExtract;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Time};

/// A keyword + location search over a calendar date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    keyword: String,
    spatial: String,
    start: Date,
    end: Date,
    max_posts: Option<usize>,
}

impl SearchQuery {
    pub fn new(
        keyword: impl Into<String>,
        spatial: impl Into<String>,
        start: Date,
        end: Date,
        max_posts: Option<usize>,
    ) -> Result<Self, SocialError> {
        if end < start {
            return Err(SocialError::InvalidDate(format!(
                "end date {end} precedes start date {start}"
            )));
        }
        Ok(Self {
            keyword: keyword.into(),
            spatial: spatial.into(),
            start,
            end,
            max_posts,
        })
    }

    /// Build from `YYYY-MM-DD` strings.
    ///
    /// ```
    /// use harvest_social::twitter::SearchQuery;
    ///
    /// let q = SearchQuery::parse("(football) lang:en", "place_country:GB", "2015-08-15", "2015-08-17", Some(100)).unwrap();
    /// assert_eq!(q.query_string(), "(football) lang:en place_country:GB");
    /// assert_eq!(q.start_time().unwrap(), "2015-08-15T00:00:00Z");
    /// ```
    pub fn parse(
        keyword: impl Into<String>,
        spatial: impl Into<String>,
        start: &str,
        end: &str,
        max_posts: Option<usize>,
    ) -> Result<Self, SocialError> {
        Self::new(keyword, spatial, parse_date(start)?, parse_date(end)?, max_posts)
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn spatial(&self) -> &str {
        &self.spatial
    }

    pub fn start(&self) -> Date {
        self.start
    }

    pub fn end(&self) -> Date {
        self.end
    }

    /// `None` means no cap on accumulated posts.
    pub fn max_posts(&self) -> Option<usize> {
        self.max_posts
    }

    /// The `query` parameter sent to the search endpoint.
    pub fn query_string(&self) -> String {
        format!("{} {}", self.keyword, self.spatial)
    }

    pub fn start_time(&self) -> Result<String, SocialError> {
        midnight_utc(self.start)
    }

    pub fn end_time(&self) -> Result<String, SocialError> {
        midnight_utc(self.end)
    }
}

fn parse_date(raw: &str) -> Result<Date, SocialError> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|e| SocialError::InvalidDate(format!("{raw}: {e}")))
}

fn midnight_utc(date: Date) -> Result<String, SocialError> {
    date.with_time(Time::MIDNIGHT)
        .assume_utc()
        .format(&Rfc3339)
        .map_err(|e| SocialError::InvalidDate(format!("{date}: {e}")))
}

/// Everything collected across the pages of one search, in page order.
///
/// Items are passed through as received: no deduplication and no merging of
/// repeated users, places, or media between pages. The six lengths are
/// independent of each other.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Aggregate {
    pub tweets: Vec<Value>,
    pub users: Vec<Value>,
    pub places: Vec<Value>,
    /// Referenced posts from `includes.tweets`.
    pub tweets_info: Vec<Value>,
    pub errors: Vec<Value>,
    pub media: Vec<Value>,
}

impl Aggregate {
    /// Append one page's arrays to the running totals.
    pub fn absorb(&mut self, page: PageExtract) {
        self.tweets.extend(page.tweets);
        self.users.extend(page.users);
        self.places.extend(page.places);
        self.tweets_info.extend(page.tweets_info);
        self.errors.extend(page.errors);
        self.media.extend(page.media);
    }

    pub fn post_count(&self) -> usize {
        self.tweets.len()
    }

    /// Render each sequence to its own JSON text.
    pub fn serialize(&self) -> Result<SerializedAggregate, SocialError> {
        Ok(SerializedAggregate {
            tweets: serde_json::to_string(&self.tweets)?,
            users: serde_json::to_string(&self.users)?,
            places: serde_json::to_string(&self.places)?,
            tweets_info: serde_json::to_string(&self.tweets_info)?,
            errors: serde_json::to_string(&self.errors)?,
            media: serde_json::to_string(&self.media)?,
        })
    }
}

/// The aggregate as persisted: one JSON string per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedAggregate {
    pub tweets: String,
    pub users: String,
    pub places: String,
    pub tweets_info: String,
    pub errors: String,
    pub media: String,
}
