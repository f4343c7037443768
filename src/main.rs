use vrouter::telemetry::{init_logging_with_config, LogConfig};

fn main() -> anyhow::Result<()> {
    init_logging_with_config(&LogConfig::from_env())?;
    vrouter::cli::run_cli()
}
