//! CLI module - argument parsing and command dispatch

pub mod args;
pub mod commands;
pub mod helpers;

pub use args::{Cli, Commands, GlobalOpts, OutputFormat};

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

use crate::core::config::{Config, DEFAULT_LOG};
use crate::core::identity::RecordKind;

/// Install the stderr log subscriber
///
/// `--verbose` wins over `MOUTH_LOG` and the configured `log` filter.
pub fn init_logging(global: &GlobalOpts, config: &Config) {
    let directive = if global.verbose {
        "mouth=debug"
    } else {
        config.log_filter()
    };
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

/// Run the selected command
///
/// The configured `default_format` applies when `--format` was left at auto.
pub fn run(cli: Cli, config: &Config) -> miette::Result<()> {
    let mut global = cli.global;
    if global.format == OutputFormat::Auto {
        if let Some(ref name) = config.default_format {
            match OutputFormat::from_str(name, true) {
                Ok(format) => global.format = format,
                Err(_) => tracing::warn!(format = %name, "ignoring unknown default_format"),
            }
        }
    }

    match cli.command {
        Commands::Init(args) => commands::init::run(args),
        Commands::Install(args) => commands::install::run(args, &global),
        Commands::Validate(args) => commands::validate::run(args),
        Commands::Schema(cmd) => commands::schema::run(cmd, &global),
        Commands::Locale(cmd) => commands::locale::run(cmd, &global),
        Commands::Template(cmd) => commands::template::run(cmd, &global),
        Commands::Email(cmd) => commands::variant::run(RecordKind::TemplateEmail, cmd, &global),
        Commands::Sms(cmd) => commands::variant::run(RecordKind::TemplateSms, cmd, &global),
        Commands::Completions(args) => commands::completions::run(args),
    }
}
