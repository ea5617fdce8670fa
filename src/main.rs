use anyhow::Context;
use env_logger::Env;
use log::info;

use iptv_playlist_aggregator::{http::UpstreamClient, pipeline::Pipeline, settings::Settings};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let settings = Settings::load().context("Failed to load config")?;
    let client = UpstreamClient::from_settings(&settings.upstream)
        .context("Failed to build upstream http client")?;

    let pipeline = Pipeline::from_settings(&settings);
    let report = pipeline.run(&client).await;

    match report.update {
        Some(summary) => info!(
            "Updated {} lines in {} files, merged {} channels",
            summary.lines, summary.files, report.channels
        ),
        None => info!(
            "Upstream unavailable, merged {} channels from local files",
            report.channels
        ),
    }

    Ok(())
}
