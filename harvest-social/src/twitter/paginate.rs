//! Page loop over the full-archive search.
//!
//! The first request carries no token. Every later request waits
//! [`PaginationOptions::page_delay`] and then sends the token returned by the
//! previous page. Each page's arrays are appended to one [`Aggregate`]. The loop
//! ends when a page comes back without a token, or when the posts accumulated so
//! far exceed the cap. The cap is checked after appending, so the result can
//! overshoot it by up to one page. There is no page limit.
//!
//! A failed request ends the loop with that error and the pages gathered so far
//! are dropped.
use crate::error::SocialError;
use crate::twitter::client::{DEFAULT_PAGE_SIZE, TwitterApi};
use crate::twitter::extract::extract_page;
use crate::twitter::types::{Aggregate, SearchQuery};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;

/// Fixed pause between search pages for rate-limit compliance.
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(3100);

/// Anything that can hand back raw search pages by continuation token.
#[async_trait]
pub trait SearchSource: Send + Sync {
    async fn fetch_page(&self, next_token: Option<&str>) -> Result<Value, SocialError>;
}

#[derive(Debug, Clone)]
pub struct PaginationOptions {
    pub page_delay: Duration,
    pub page_size: u32,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            page_delay: DEFAULT_PAGE_DELAY,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// A [`TwitterApi`] bound to one query.
pub struct ArchiveSearch<'a> {
    api: &'a TwitterApi,
    query: &'a SearchQuery,
    page_size: u32,
}

impl<'a> ArchiveSearch<'a> {
    pub fn new(api: &'a TwitterApi, query: &'a SearchQuery, page_size: u32) -> Self {
        Self {
            api,
            query,
            page_size,
        }
    }
}

#[async_trait]
impl SearchSource for ArchiveSearch<'_> {
    async fn fetch_page(&self, next_token: Option<&str>) -> Result<Value, SocialError> {
        self.api
            .search_all(self.query, next_token, self.page_size)
            .await
    }
}

/// Whether another page should be requested.
///
/// ```
/// use harvest_social::twitter::should_continue;
///
/// assert!(should_continue(500, None, Some("tok")));
/// assert!(should_continue(100, Some(100), Some("tok")));
/// assert!(!should_continue(101, Some(100), Some("tok")));
/// assert!(!should_continue(0, None, None));
/// ```
pub fn should_continue(total_posts: usize, max_posts: Option<usize>, next_token: Option<&str>) -> bool {
    next_token.is_some() && max_posts.is_none_or(|cap| total_posts <= cap)
}

/// Drain `source` page by page into one [`Aggregate`].
pub async fn retrieve<S>(
    source: &S,
    max_posts: Option<usize>,
    options: &PaginationOptions,
) -> Result<Aggregate, SocialError>
where
    S: SearchSource + ?Sized,
{
    let mut aggregate = Aggregate::default();
    let mut next_token: Option<String> = None;
    let mut page = 0usize;

    loop {
        if page > 0 {
            sleep(options.page_delay).await;
        }
        page += 1;

        let mut extract = extract_page(source.fetch_page(next_token.as_deref()).await?);
        next_token = extract.next_token.take();

        tracing::info!(
            page,
            tweets = extract.tweets.len(),
            users = extract.users.len(),
            places = extract.places.len(),
            tweets_info = extract.tweets_info.len(),
            errors = extract.errors.len(),
            media = extract.media.len(),
            has_next_token = next_token.is_some(),
            "twitter.search.page"
        );

        aggregate.absorb(extract);

        if !should_continue(aggregate.post_count(), max_posts, next_token.as_deref()) {
            break;
        }
    }

    tracing::info!(
        pages = page,
        total_posts = aggregate.post_count(),
        capped = next_token.is_some(),
        "twitter.search.done"
    );
    Ok(aggregate)
}

/// Run `query` against the full-archive endpoint until exhausted or capped.
pub async fn retrieve_keyword_spatial(
    api: &TwitterApi,
    query: &SearchQuery,
    options: &PaginationOptions,
) -> Result<Aggregate, SocialError> {
    tracing::info!(
        query = %query.query_string(),
        start = %query.start(),
        end = %query.end(),
        max_posts = ?query.max_posts(),
        "twitter.search.start"
    );
    let source = ArchiveSearch::new(api, query, options.page_size);
    retrieve(&source, query.max_posts(), options).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_http::HttpError;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Hands out canned pages in order and records the token of every call.
    struct ScriptedSource {
        pages: Mutex<VecDeque<Result<Value, SocialError>>>,
        seen_tokens: Mutex<Vec<Option<String>>>,
    }

    impl ScriptedSource {
        fn new(pages: Vec<Result<Value, SocialError>>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                seen_tokens: Mutex::new(Vec::new()),
            }
        }

        fn seen_tokens(&self) -> Vec<Option<String>> {
            self.seen_tokens.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SearchSource for ScriptedSource {
        async fn fetch_page(&self, next_token: Option<&str>) -> Result<Value, SocialError> {
            self.seen_tokens
                .lock()
                .unwrap()
                .push(next_token.map(str::to_owned));
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .expect("source asked for more pages than scripted")
        }
    }

    fn page(first_id: usize, posts: usize, token: Option<&str>) -> Value {
        let data: Vec<Value> = (first_id..first_id + posts)
            .map(|i| json!({"id": i.to_string(), "text": format!("post {i}")}))
            .collect();
        let mut page = json!({
            "data": data,
            "includes": {"users": [{"id": format!("u{first_id}")}]},
            "meta": {"result_count": posts}
        });
        if let Some(t) = token {
            page["meta"]["next_token"] = json!(t);
        }
        page
    }

    fn no_delay() -> PaginationOptions {
        PaginationOptions {
            page_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    #[test]
    fn continuation_predicate_table() {
        assert!(should_continue(10_000, None, Some("t")));
        assert!(should_continue(50, Some(100), Some("t")));
        assert!(should_continue(100, Some(100), Some("t")));
        assert!(!should_continue(101, Some(100), Some("t")));
        assert!(!should_continue(0, Some(100), None));
        assert!(!should_continue(0, None, None));
    }

    #[tokio::test]
    async fn stops_when_token_runs_out() {
        let source = ScriptedSource::new(vec![
            Ok(page(0, 60, Some("p2"))),
            Ok(page(60, 60, None)),
        ]);

        let agg = retrieve(&source, Some(100), &no_delay()).await.unwrap();

        assert_eq!(agg.post_count(), 120);
        assert_eq!(agg.users.len(), 2);
        assert_eq!(source.seen_tokens(), vec![None, Some("p2".to_string())]);
    }

    #[tokio::test]
    async fn stops_once_cap_is_exceeded_even_with_token() {
        let source = ScriptedSource::new(vec![
            Ok(page(0, 30, Some("p2"))),
            Ok(page(30, 30, Some("p3"))),
            Ok(page(60, 30, Some("p4"))),
        ]);

        let agg = retrieve(&source, Some(50), &no_delay()).await.unwrap();

        assert_eq!(agg.post_count(), 60);
        assert_eq!(source.seen_tokens().len(), 2);
    }

    #[tokio::test]
    async fn reaching_cap_exactly_still_continues() {
        let source = ScriptedSource::new(vec![
            Ok(page(0, 50, Some("p2"))),
            Ok(page(50, 10, None)),
        ]);

        let agg = retrieve(&source, Some(50), &no_delay()).await.unwrap();
        assert_eq!(agg.post_count(), 60);
    }

    #[tokio::test]
    async fn unbounded_run_follows_every_token() {
        let source = ScriptedSource::new(vec![
            Ok(page(0, 100, Some("a"))),
            Ok(page(100, 100, Some("b"))),
            Ok(page(200, 100, Some("c"))),
            Ok(page(300, 5, None)),
        ]);

        let agg = retrieve(&source, None, &no_delay()).await.unwrap();

        assert_eq!(agg.post_count(), 305);
        assert_eq!(
            source.seen_tokens(),
            vec![
                None,
                Some("a".to_string()),
                Some("b".to_string()),
                Some("c".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn keeps_page_order_and_duplicates() {
        let user = json!({"id": "42", "username": "alice"});
        let first = json!({
            "data": [{"id": "1"}, {"id": "2"}],
            "includes": {"users": [user.clone()], "media": [{"media_key": "m1"}]},
            "meta": {"next_token": "t"}
        });
        let second = json!({
            "data": [{"id": "3"}],
            "includes": {"users": [user.clone()], "places": [{"id": "p"}], "tweets": [{"id": "q"}]},
            "errors": [{"title": "Authorization Error"}]
        });
        let source = ScriptedSource::new(vec![Ok(first), Ok(second)]);

        let agg = retrieve(&source, None, &no_delay()).await.unwrap();

        let ids: Vec<&str> = agg.tweets.iter().map(|t| t["id"].as_str().unwrap()).collect();
        assert_eq!(ids, ["1", "2", "3"]);
        assert_eq!(agg.users, vec![user.clone(), user]);
        assert_eq!(agg.places.len(), 1);
        assert_eq!(agg.tweets_info.len(), 1);
        assert_eq!(agg.errors.len(), 1);
        assert_eq!(agg.media.len(), 1);
    }

    #[tokio::test]
    async fn empty_first_page_ends_the_run() {
        let source = ScriptedSource::new(vec![Ok(json!({"meta": {"result_count": 0}}))]);
        let agg = retrieve(&source, Some(100), &no_delay()).await.unwrap();
        assert_eq!(agg, Aggregate::default());
    }

    #[tokio::test]
    async fn failure_mid_run_discards_progress() {
        let source = ScriptedSource::new(vec![
            Ok(page(0, 10, Some("p2"))),
            Err(SocialError::Http(HttpError::Network("connection reset".into()))),
        ]);

        let err = retrieve(&source, None, &no_delay()).await.unwrap_err();
        assert!(matches!(err, SocialError::Http(HttpError::Network(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn waits_between_pages_but_not_before_the_first() {
        let source = ScriptedSource::new(vec![
            Ok(page(0, 1, Some("p2"))),
            Ok(page(1, 1, Some("p3"))),
            Ok(page(2, 1, None)),
        ]);
        let started = tokio::time::Instant::now();

        retrieve(&source, None, &PaginationOptions::default())
            .await
            .unwrap();

        let elapsed = started.elapsed();
        assert!(elapsed >= DEFAULT_PAGE_DELAY * 2);
        assert!(elapsed < DEFAULT_PAGE_DELAY * 2 + Duration::from_millis(50));
    }
}
