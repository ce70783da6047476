//! One harvest run: search, aggregate, and turn the outcome into a [`RunRecord`].
//!
//! Every failure on the retrieval side ends up in the record instead of the
//! process exit status. Only failing to write the record is fatal.
use anyhow::Result;
use harvest_common::HarvestError;
use harvest_config::HarvestConfig;
use harvest_social::twitter::{
    PaginationOptions, SearchQuery, TwitterApi, retrieve_keyword_spatial,
};
use harvest_store::{RunRecord, send_to_store};
use serde_json::Value;
use std::time::Duration;

pub const APP_NAME: &str = "harvest";

/// Run the configured search and fold the outcome into a record.
pub async fn execute(cfg: &HarvestConfig) -> RunRecord {
    let keyword = &cfg.query.keyword;
    let spatial = &cfg.query.spatial;

    match retrieve(cfg).await {
        Ok(data) => RunRecord::success(keyword, spatial, data),
        Err(err) => {
            tracing::warn!(error = %err, "run.failed");
            RunRecord::failure(keyword, spatial, err.to_string())
        }
    }
}

async fn retrieve(cfg: &HarvestConfig) -> harvest_common::Result<Value> {
    cfg.validate_twitter()?;
    Ok(search(cfg).await?)
}

async fn search(cfg: &HarvestConfig) -> Result<Value> {
    let q = &cfg.query;
    let query = SearchQuery::parse(
        &q.keyword,
        &q.spatial,
        &q.start_date,
        &q.end_date,
        q.max_posts,
    )?;
    let api = TwitterApi::with_base_url(&cfg.twitter.base_url, cfg.twitter.bearer_token.clone())?;
    let options = PaginationOptions {
        page_delay: Duration::from_millis(cfg.twitter.page_delay_ms),
        page_size: cfg.twitter.page_size,
    };

    let aggregate = retrieve_keyword_spatial(&api, &query, &options).await?;
    tracing::info!(
        tweets = aggregate.tweets.len(),
        users = aggregate.users.len(),
        places = aggregate.places.len(),
        tweets_info = aggregate.tweets_info.len(),
        errors = aggregate.errors.len(),
        media = aggregate.media.len(),
        "run.aggregated"
    );

    Ok(serde_json::to_value(aggregate.serialize()?)?)
}

/// Write the record as one new document into the configured collection.
pub async fn persist(cfg: &HarvestConfig, record: &RunRecord) -> harvest_common::Result<String> {
    let document = record
        .to_document()
        .map_err(|e| HarvestError::Store(e.to_string()))?;

    send_to_store(
        &cfg.store.database_url,
        &cfg.store.database,
        &cfg.store.collection,
        &document,
    )
    .await
    .map_err(|e| HarvestError::Store(format!("{e:#}")))
}
