//! `mouth locale` command - Locale management
//!
//! Variants can only be written in locales that exist here.

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use serde_json::json;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{actor, load_validator, open_store, print_record};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::{RecordId, RecordKind};
use crate::core::locale::LocaleCode;
use crate::core::store::{ListFilter, StoreError};
use crate::entities::Locale;

#[derive(Subcommand, Debug)]
pub enum LocaleCommands {
    /// Add a locale
    Add(AddArgs),

    /// Show a locale
    Show(CodeArgs),

    /// List locales by name
    List(ListArgs),

    /// Rename a locale
    Update(AddArgs),

    /// Delete a locale that no variant uses, or archive it
    Delete(DeleteArgs),

    /// Print whether a locale exists
    Exists(CodeArgs),
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Locale code, e.g. en-US
    pub code: LocaleCode,

    /// Display name, e.g. "English (US)"
    pub name: String,
}

#[derive(clap::Args, Debug)]
pub struct CodeArgs {
    /// Locale code, e.g. en-US
    pub code: LocaleCode,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Include archived locales
    #[arg(long)]
    pub archived: bool,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Locale code, e.g. en-US
    pub code: LocaleCode,

    /// Archive the locale instead of deleting it
    #[arg(long)]
    pub archive: bool,
}

pub fn run(cmd: LocaleCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        LocaleCommands::Add(args) => run_add(args, global),
        LocaleCommands::Show(args) => run_show(args, global),
        LocaleCommands::List(args) => run_list(args, global),
        LocaleCommands::Update(args) => run_update(args, global),
        LocaleCommands::Delete(args) => run_delete(args, global),
        LocaleCommands::Exists(args) => run_exists(args, global),
    }
}

fn run_add(args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let validator = load_validator()?;
    let record = validator.validate(
        RecordKind::Locale,
        &json!({ "_id": args.code, "name": args.name }),
    )?;

    let mut store = open_store(global)?;
    store.create(&record, &actor())?;
    let locale = Locale::try_from(record)?;

    if global.format == OutputFormat::Id {
        println!("{}", locale.code);
    } else if !global.quiet {
        println!(
            "{} Created locale {} ({})",
            style("✓").green(),
            style(locale.code).cyan(),
            style(&locale.name).yellow()
        );
    }
    Ok(())
}

fn run_show(args: CodeArgs, global: &GlobalOpts) -> Result<()> {
    let store = open_store(global)?;
    let record = store.get(RecordKind::Locale, RecordId::from(args.code))?;
    print_record(&record, store.registry(), global.format)
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let store = open_store(global)?;
    let filter = ListFilter {
        archived: args.archived,
        ..Default::default()
    };
    let locales = store
        .list(RecordKind::Locale, &filter)?
        .into_iter()
        .map(Locale::try_from)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    match global.format {
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&locales).into_diagnostic()?);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&locales).into_diagnostic()?);
        }
        OutputFormat::Id => {
            for locale in &locales {
                println!("{}", locale.code);
            }
        }
        OutputFormat::Auto => {
            let mut builder = Builder::default();
            builder.push_record(["CODE", "NAME", "ARCHIVED"]);
            for locale in &locales {
                builder.push_record([
                    locale.code.to_string(),
                    locale.name.clone(),
                    if locale.archived { "yes" } else { "" }.to_string(),
                ]);
            }
            println!("{}", builder.build().with(Style::markdown()));

            if !global.quiet {
                println!();
                println!("{} locale(s) found", style(locales.len()).cyan());
            }
        }
    }
    Ok(())
}

fn run_update(args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let validator = load_validator()?;
    let mut store = open_store(global)?;
    let existing = store.get(RecordKind::Locale, RecordId::from(args.code))?;

    let updated = validator.validate_update(&existing, &json!({ "name": &args.name }))?;
    store.update(&updated, &actor())?;

    if !global.quiet {
        println!(
            "{} Renamed locale {} to {}",
            style("✓").green(),
            style(args.code).cyan(),
            style(&args.name).yellow()
        );
    }
    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let mut store = open_store(global)?;
    let id = RecordId::from(args.code);

    if args.archive {
        let validator = load_validator()?;
        let existing = store.get(RecordKind::Locale, id)?;
        let archived = validator.validate_update(&existing, &json!({ "_archived": true }))?;
        store.update(&archived, &actor())?;
    } else {
        store.delete(RecordKind::Locale, id, &actor())?;
    }

    if !global.quiet {
        let action = if args.archive { "Archived" } else { "Deleted" };
        println!(
            "{} {} locale {}",
            style("✓").green(),
            action,
            style(args.code).cyan()
        );
    }
    Ok(())
}

fn run_exists(args: CodeArgs, global: &GlobalOpts) -> Result<()> {
    let store = open_store(global)?;
    let exists = match store.get(RecordKind::Locale, RecordId::from(args.code)) {
        Ok(_) => true,
        Err(StoreError::NoRecord { .. }) => false,
        Err(e) => return Err(e.into()),
    };
    println!("{}", exists);
    Ok(())
}
