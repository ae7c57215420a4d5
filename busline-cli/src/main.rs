use anyhow::Context;
use busline_cli::{app_config::Config, demo, init_tracing};

fn main() -> anyhow::Result<()> {
    let config = Config::load().context("Failed to load config")?;
    init_tracing(&config.logging.filter);
    tracing::info!("Starting busline demo");

    let today = chrono::Utc::now().date_naive();
    let report = demo::run(&config, today)?;
    tracing::info!(
        events = report.ticket_events.len(),
        rejected = report.rejected.len(),
        "Demo finished"
    );

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
