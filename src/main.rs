use clap::Parser;

use webmis_config::cli::{Cli, Commands, run_check, run_show};
use webmis_config::config::settings::LoggerSettings;
use webmis_config::logger::init_logger;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // The logger comes up before resolution so layer application is visible
    // with --verbose; the resolved bundle cannot feed it here.
    let mut logger = LoggerSettings::default();
    if let Some(level) = cli.log_level() {
        logger.level = level.to_string();
    }
    init_logger(&logger)?;

    let loader = cli.loader();

    match cli.command {
        Commands::Check => run_check(&loader)?,
        Commands::Show { reveal } => run_show(&loader, reveal)?,
    }

    Ok(())
}
