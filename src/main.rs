use crudrouter::logging::{init_logging_with_config, LogConfig, LogOutput};

fn main() -> anyhow::Result<()> {
    // CLI output owns stdout; logs go to stderr and stay quiet unless asked for.
    let mut log_config = LogConfig::from_env();
    log_config.output = LogOutput::Stderr;
    if std::env::var_os("CRUDR_LOG_LEVEL").is_none() {
        log_config.log_level = "warn".to_string();
    }
    let _guard = init_logging_with_config(&log_config)?;

    crudrouter::cli::run_cli()
}
