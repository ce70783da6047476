//! Wrapper around the Twitter/X API v2 user-lookup and full-archive search endpoints.
//!
//! Both calls are single GETs with bearer auth and no retries. Anything but
//! `200 OK` comes back as [`HttpError::Api`](harvest_http::HttpError::Api) with the
//! status and body untouched, which is what ends up in a failed run record.
use crate::error::SocialError;
use crate::twitter::types::SearchQuery;
use harvest_http::{Auth, HttpClient, RequestOpts};
use serde_json::Value;
use std::borrow::Cow;

pub const DEFAULT_BASE_URL: &str = "https://api.twitter.com";
pub const DEFAULT_PAGE_SIZE: u32 = 100;

// Accepted `max_results` range for /2/tweets/search/all.
const MIN_PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 500;

const USERS_BY_PATH: &str = "2/users/by";
const SEARCH_ALL_PATH: &str = "2/tweets/search/all";

pub const TWEET_FIELDS: &str = "attachments,author_id,context_annotations,conversation_id,created_at,entities,geo,id,in_reply_to_user_id,lang,possibly_sensitive,public_metrics,referenced_tweets,reply_settings,source,text,withheld";
pub const EXPANSIONS: &str = "attachments.poll_ids,attachments.media_keys,author_id,entities.mentions.username,geo.place_id,in_reply_to_user_id,referenced_tweets.id,referenced_tweets.id.author_id";
pub const USER_FIELDS: &str = "id,username,location,created_at,description";
pub const PLACE_FIELDS: &str =
    "contained_within,country,country_code,full_name,geo,id,name,place_type";
pub const MEDIA_FIELDS: &str =
    "duration_ms,height,media_key,preview_image_url,type,url,width,public_metrics";

#[derive(Clone)]
pub struct TwitterApi {
    http: HttpClient,
    bearer: String,
}

impl TwitterApi {
    pub fn new(bearer_token: String) -> Result<Self, SocialError> {
        Self::with_base_url(DEFAULT_BASE_URL, bearer_token)
    }

    /// Point the client at another host, e.g. a mock server in tests.
    pub fn with_base_url(base_url: &str, bearer_token: String) -> Result<Self, SocialError> {
        Ok(Self {
            http: HttpClient::new(base_url)?,
            bearer: bearer_token,
        })
    }

    /// Look up one account and return its `data[0]` object.
    ///
    /// `user_fields` is a comma separated `user.fields` list; pass `""` for the
    /// endpoint defaults. Fails with [`SocialError::UserNotFound`] when the response
    /// has no user whose `username` equals `username` exactly.
    pub async fn lookup_user(&self, username: &str, user_fields: &str) -> Result<Value, SocialError> {
        let mut params: Vec<(&str, Cow<'_, str>)> = vec![("usernames", username.into())];
        if !user_fields.is_empty() {
            params.push(("user.fields", user_fields.into()));
        }

        let resp: Value = self
            .http
            .get_json(
                USERS_BY_PATH,
                RequestOpts {
                    auth: Some(Auth::Bearer(&self.bearer)),
                    query: Some(params),
                    ..Default::default()
                },
            )
            .await?;

        if !username_matches(&resp, username) {
            tracing::debug!(%username, "twitter.lookup_user.not_found");
            return Err(SocialError::UserNotFound(username.to_string()));
        }

        resp.pointer("/data/0")
            .cloned()
            .ok_or_else(|| SocialError::UserNotFound(username.to_string()))
    }

    /// `true` if the account exists under exactly this username.
    pub async fn confirm_username(&self, username: &str) -> Result<bool, SocialError> {
        match self.lookup_user(username, "").await {
            Ok(_) => Ok(true),
            Err(SocialError::UserNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Fetch one page of `/2/tweets/search/all`.
    ///
    /// The field selections and expansions are fixed. `next_token` is only sent
    /// when present; `page_size` is clamped to what the endpoint accepts.
    pub async fn search_all(
        &self,
        query: &SearchQuery,
        next_token: Option<&str>,
        page_size: u32,
    ) -> Result<Value, SocialError> {
        let max_results = page_size.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE);

        let mut params: Vec<(&str, Cow<'_, str>)> = vec![
            ("query", query.query_string().into()),
            ("max_results", max_results.to_string().into()),
            ("start_time", query.start_time()?.into()),
            ("end_time", query.end_time()?.into()),
            ("tweet.fields", TWEET_FIELDS.into()),
            ("expansions", EXPANSIONS.into()),
            ("user.fields", USER_FIELDS.into()),
            ("place.fields", PLACE_FIELDS.into()),
            ("media.fields", MEDIA_FIELDS.into()),
        ];
        if let Some(token) = next_token {
            params.push(("next_token", token.into()));
        }

        let resp: Value = self
            .http
            .get_json(
                SEARCH_ALL_PATH,
                RequestOpts {
                    auth: Some(Auth::Bearer(&self.bearer)),
                    query: Some(params),
                    ..Default::default()
                },
            )
            .await?;

        tracing::trace!(response = ?resp, "twitter.search_all.response");
        Ok(resp)
    }
}

/// `data[0].username` equals `username`, compared case-sensitively.
///
/// ```
/// use harvest_social::twitter::username_matches;
/// use serde_json::json;
///
/// let resp = json!({"data": [{"id": "2244994945", "username": "TwitterDev"}]});
/// assert!(username_matches(&resp, "TwitterDev"));
/// assert!(!username_matches(&resp, "twitterdev"));
/// assert!(!username_matches(&json!({"errors": []}), "TwitterDev"));
/// ```
pub fn username_matches(response: &Value, username: &str) -> bool {
    response
        .pointer("/data/0/username")
        .and_then(Value::as_str)
        .is_some_and(|found| found == username)
}
