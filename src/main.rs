use anyhow::Result;
use clap::Parser;
use tracing::Instrument;

use freightline::cli::{commands, Cli};
use freightline::config::{self, FreightlineConfig};
use freightline::telemetry;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            FreightlineConfig::load_env_file()?;
            FreightlineConfig::load_from(Some(path))?
        }
        None => config::config()?.clone(),
    };

    telemetry::init_telemetry(
        &config.observability.log_level,
        config.observability.json_logs,
    )?;

    let correlation_id = telemetry::generate_correlation_id();
    let subject = cli.subject();
    let span = telemetry::create_lifecycle_span(
        cli.operation_name(),
        cli.actor.as_deref(),
        subject.as_deref(),
        Some(&correlation_id),
    );

    let result = tokio::runtime::Runtime::new()?
        .block_on(async { commands::dispatch(cli, &config).await }.instrument(span));

    telemetry::shutdown_telemetry();
    result
}
