pub mod export;
pub mod scrape;
pub mod status;
pub mod sync;

use std::time::Duration;

use anyhow::Result;
use fixturecal_core::{GlobalConfig, HttpSource};

fn http_source(config: &GlobalConfig) -> Result<HttpSource> {
    Ok(HttpSource::new(Duration::from_secs(config.request_timeout_secs))?)
}
