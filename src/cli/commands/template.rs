//! `mouth template` command - Template management

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::helpers::{
    actor, format_short_id, load_validator, open_store, parse_patch, print_record, print_records,
    read_input, resolve_template, truncate_str,
};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::{Entity, Variant};
use crate::core::identity::RecordKind;
use crate::core::record::Record;
use crate::core::store::ListFilter;
use crate::entities::{Template, TemplateEmail, TemplateSms};
use crate::schema::report::DocumentError;

#[derive(Subcommand, Debug)]
pub enum TemplateCommands {
    /// Create a template from a YAML or JSON file ("-" for stdin)
    Add(AddArgs),

    /// Show a template
    Show(ShowArgs),

    /// List templates
    List,

    /// Update a template from a partial YAML or JSON file
    Update(UpdateArgs),

    /// Delete a template and all of its variants
    Delete(ShowArgs),

    /// Show every email and SMS variant of a template
    Contents(ShowArgs),
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Record file
    pub file: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Template ID or name
    pub template: String,
}

#[derive(clap::Args, Debug)]
pub struct UpdateArgs {
    /// Template ID or name
    pub template: String,

    /// File with the fields to change
    pub file: PathBuf,
}

pub fn run(cmd: TemplateCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        TemplateCommands::Add(args) => run_add(args, global),
        TemplateCommands::Show(args) => run_show(args, global),
        TemplateCommands::List => run_list(global),
        TemplateCommands::Update(args) => run_update(args, global),
        TemplateCommands::Delete(args) => run_delete(args, global),
        TemplateCommands::Contents(args) => run_contents(args, global),
    }
}

fn run_add(args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let validator = load_validator()?;
    let (content, filename) = read_input(&args.file)?;
    let record = validator.validate_document(&content, &filename, RecordKind::Template)?;

    let mut store = open_store(global)?;
    store.create(&record, &actor())?;
    let template = Template::try_from(record)?;

    if global.format == OutputFormat::Id {
        println!("{}", template.id());
    } else if !global.quiet {
        println!(
            "{} Created template {} ({})",
            style("✓").green(),
            style(&template.name).yellow(),
            style(template.id()).cyan()
        );
        for (name, variable_type) in &template.variables {
            println!("   {} {}", style(name).bold(), style(variable_type).dim());
        }
    }
    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let store = open_store(global)?;
    let id = resolve_template(&store, &args.template)?;
    let record = store.get(RecordKind::Template, id)?;
    print_record(&record, store.registry(), global.format)
}

fn run_list(global: &GlobalOpts) -> Result<()> {
    let store = open_store(global)?;
    let records = store.list(RecordKind::Template, &ListFilter::default())?;
    let descriptor = store.registry().descriptor(RecordKind::Template)?;
    print_records(&records, descriptor, global)
}

fn run_update(args: UpdateArgs, global: &GlobalOpts) -> Result<()> {
    let validator = load_validator()?;
    let mut store = open_store(global)?;
    let id = resolve_template(&store, &args.template)?;
    let existing = store.get(RecordKind::Template, id)?;

    let (content, filename) = read_input(&args.file)?;
    let patch = parse_patch(&content, &filename)?;
    let updated = validator
        .validate_update(&existing, &patch)
        .map_err(|e| DocumentError::from_validation(&filename, &content, &e))?;

    store.update(&updated, &actor())?;

    if !global.quiet {
        println!(
            "{} Updated template {}",
            style("✓").green(),
            style(updated.id()).cyan()
        );
    }
    Ok(())
}

fn run_delete(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let mut store = open_store(global)?;
    let id = resolve_template(&store, &args.template)?;
    let removed = store.delete(RecordKind::Template, id, &actor())?;

    if !global.quiet {
        println!(
            "{} Deleted template {} ({} variant(s) removed)",
            style("✓").green(),
            style(id).cyan(),
            removed.saturating_sub(1)
        );
    }
    Ok(())
}

fn run_contents(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let store = open_store(global)?;
    let id = resolve_template(&store, &args.template)?;
    let records = store.contents(id)?;

    match global.format {
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&records).into_diagnostic()?);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&records).into_diagnostic()?);
        }
        OutputFormat::Id => {
            for record in &records {
                println!("{}", record.id());
            }
        }
        OutputFormat::Auto => {
            if records.is_empty() && !global.quiet {
                println!("No variants");
            }
            for record in records {
                println!("{}", variant_line(record)?);
            }
        }
    }
    Ok(())
}

/// One line of `contents` output for a stored variant
fn variant_line(record: Record) -> Result<String> {
    match record.kind() {
        RecordKind::TemplateEmail => Ok(describe(&TemplateEmail::try_from(record)?)),
        RecordKind::TemplateSms => Ok(describe(&TemplateSms::try_from(record)?)),
        other => Err(miette::miette!("{} is not a template variant", other)),
    }
}

fn describe<V: Variant>(variant: &V) -> String {
    format!(
        "{} {:<6} {} {} {}",
        style(format_short_id(&variant.id())).cyan(),
        V::KIND.short_name(),
        style(variant.locale()).yellow(),
        style(variant.updated().format("%Y-%m-%d")).dim(),
        truncate_str(variant.preview(), 50)
    )
}
