//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs,
    init::InitArgs,
    install::InstallArgs,
    locale::LocaleCommands,
    schema::SchemaCommands,
    template::TemplateCommands,
    validate::ValidateArgs,
    variant::VariantCommands,
};

#[derive(Parser)]
#[command(name = "mouth")]
#[command(author, version, about = "Template records for a notification service")]
#[command(
    long_about = "Validate, store and inspect locales, templates and their email and SMS variants."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// SQLite store (default: .mouth/mouth.db in the project)
    #[arg(long, global = true, env = "MOUTH_DATABASE")]
    pub database: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new mouth project
    Init(InitArgs),

    /// Create the record tables in the store
    Install(InstallArgs),

    /// Validate record files against their descriptors
    Validate(ValidateArgs),

    /// Inspect record descriptors
    #[command(subcommand)]
    Schema(SchemaCommands),

    /// Locale management
    #[command(subcommand)]
    Locale(LocaleCommands),

    /// Template management
    #[command(subcommand)]
    Template(TemplateCommands),

    /// Email variant management
    #[command(subcommand)]
    Email(VariantCommands),

    /// SMS variant management
    #[command(subcommand)]
    Sms(VariantCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human readable (styled record for show, table for list)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// JSON format (for programming)
    Json,
    /// Just IDs, one per line
    Id,
}
