//! `mouth email` and `mouth sms` commands - localized variant management
//!
//! Both kinds share one command set; the kind is fixed by the top-level
//! command.

use clap::Subcommand;
use console::style;
use miette::Result;
use serde_json::Value as JsonValue;
use std::path::PathBuf;

use crate::cli::helpers::{
    actor, load_validator, open_store, parse_patch, print_record, print_records, read_input,
    resolve_template,
};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::{RecordId, RecordKind};
use crate::core::locale::LocaleCode;
use crate::core::record::Record;
use crate::core::store::ListFilter;
use crate::schema::report::DocumentError;

#[derive(Subcommand, Debug)]
pub enum VariantCommands {
    /// Create a variant from a YAML or JSON file ("-" for stdin)
    Add(AddArgs),

    /// Show a variant
    Show(IdArgs),

    /// Find the variant of a template in one locale
    Find(FindArgs),

    /// List variants
    List(ListArgs),

    /// Update a variant from a partial YAML or JSON file
    Update(UpdateArgs),

    /// Delete a variant
    Delete(IdArgs),
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Record file
    pub file: PathBuf,

    /// Template ID or name, overriding the file's `template` field
    #[arg(long, short = 't')]
    pub template: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct IdArgs {
    /// Variant ID
    pub id: RecordId,
}

#[derive(clap::Args, Debug)]
pub struct FindArgs {
    /// Template ID or name
    pub template: String,

    /// Locale code, e.g. en-US
    pub locale: LocaleCode,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only variants of this template (ID or name)
    #[arg(long, short = 't')]
    pub template: Option<String>,

    /// Only variants in this locale
    #[arg(long, short = 'l')]
    pub locale: Option<LocaleCode>,
}

#[derive(clap::Args, Debug)]
pub struct UpdateArgs {
    /// Variant ID
    pub id: RecordId,

    /// File with the fields to change
    pub file: PathBuf,
}

pub fn run(kind: RecordKind, cmd: VariantCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        VariantCommands::Add(args) => run_add(kind, args, global),
        VariantCommands::Show(args) => run_show(kind, args, global),
        VariantCommands::Find(args) => run_find(kind, args, global),
        VariantCommands::List(args) => run_list(kind, args, global),
        VariantCommands::Update(args) => run_update(kind, args, global),
        VariantCommands::Delete(args) => run_delete(kind, args, global),
    }
}

fn run_add(kind: RecordKind, args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let validator = load_validator()?;
    let mut store = open_store(global)?;
    let (content, filename) = read_input(&args.file)?;

    let record = match args.template {
        None => validator.validate_document(&content, &filename, kind)?,
        Some(ref reference) => {
            let template = resolve_template(&store, reference)?;
            let mut value = parse_patch(&content, &filename)?;
            if let JsonValue::Object(ref mut map) = value {
                map.insert("template".into(), JsonValue::String(template.to_string()));
            }
            validator
                .validate(kind, &value)
                .map_err(|e| DocumentError::from_validation(&filename, &content, &e))?
        }
    };

    store.create(&record, &actor())?;

    if global.format == OutputFormat::Id {
        println!("{}", record.id());
    } else if !global.quiet {
        println!(
            "{} Created {} {} for locale {}",
            style("✓").green(),
            kind.short_name(),
            style(record.id()).cyan(),
            style(record.get_str("locale").unwrap_or_default()).yellow()
        );
    }
    Ok(())
}

fn run_show(kind: RecordKind, args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let store = open_store(global)?;
    let record = store.get(kind, args.id)?;
    print_record(&record, store.registry(), global.format)
}

fn run_find(kind: RecordKind, args: FindArgs, global: &GlobalOpts) -> Result<()> {
    let store = open_store(global)?;
    let template = resolve_template(&store, &args.template)?;
    let record: Record = store.find_variant(kind, template, &args.locale)?.ok_or_else(|| {
        miette::miette!(
            "Template {} has no {} variant for {}",
            args.template,
            kind.short_name(),
            args.locale
        )
    })?;
    print_record(&record, store.registry(), global.format)
}

fn run_list(kind: RecordKind, args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let store = open_store(global)?;
    let template = match args.template {
        Some(ref reference) => Some(resolve_template(&store, reference)?),
        None => None,
    };
    let filter = ListFilter {
        template,
        locale: args.locale,
        limit: None,
        ..Default::default()
    };
    let records = store.list(kind, &filter)?;
    let descriptor = store.registry().descriptor(kind)?;
    print_records(&records, descriptor, global)
}

fn run_update(kind: RecordKind, args: UpdateArgs, global: &GlobalOpts) -> Result<()> {
    let validator = load_validator()?;
    let mut store = open_store(global)?;
    let existing = store.get(kind, args.id)?;

    let (content, filename) = read_input(&args.file)?;
    let patch = parse_patch(&content, &filename)?;
    let updated = validator
        .validate_update(&existing, &patch)
        .map_err(|e| DocumentError::from_validation(&filename, &content, &e))?;

    store.update(&updated, &actor())?;

    if !global.quiet {
        println!(
            "{} Updated {} {}",
            style("✓").green(),
            kind.short_name(),
            style(updated.id()).cyan()
        );
    }
    Ok(())
}

fn run_delete(kind: RecordKind, args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let mut store = open_store(global)?;
    store.delete(kind, args.id, &actor())?;

    if !global.quiet {
        println!(
            "{} Deleted {} {}",
            style("✓").green(),
            kind.short_name(),
            style(args.id).cyan()
        );
    }
    Ok(())
}
