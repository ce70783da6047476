use anyhow::Result;
use harvest_common::observability::init_logging;
use harvest_config::{HarvestConfig, HarvestConfigLoader};
mod harvest;

const CONFIG_FILE: &str = "harvest.yaml";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // File is optional; HARVEST_* env vars win over it.
    let cfg: HarvestConfig = HarvestConfigLoader::new()
        .with_optional_file(CONFIG_FILE)
        .load()?;

    init_logging(cfg.logging.to_log_config(harvest::APP_NAME))?;

    // Without a store there is nowhere to report the outcome of the run.
    cfg.validate_store()?;

    let record = harvest::execute(&cfg).await;
    let id = harvest::persist(&cfg, &record).await?;

    tracing::info!(
        id = %id,
        was_successful = record.was_successful,
        collection = %cfg.store.collection,
        "run.finished"
    );
    Ok(())
}
