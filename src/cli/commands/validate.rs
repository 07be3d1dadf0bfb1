//! `mouth validate` command - Validate record files against their descriptors

use console::style;
use miette::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::cli::helpers::load_validator;
use crate::core::identity::RecordKind;
use crate::core::project::Project;

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Files or directories to validate (default: entire project)
    #[arg()]
    pub paths: Vec<PathBuf>,

    /// Validate every file as this kind (locale, template, email, sms)
    #[arg(long, short = 'k')]
    pub kind: Option<RecordKind>,

    /// Continue validation after first error
    #[arg(long)]
    pub keep_going: bool,

    /// Show summary only, don't show individual errors
    #[arg(long)]
    pub summary: bool,
}

/// Validation statistics
#[derive(Default)]
struct ValidationStats {
    files_checked: usize,
    files_passed: usize,
    files_failed: usize,
    files_skipped: usize,
    total_errors: usize,
}

pub fn run(args: ValidateArgs) -> Result<()> {
    let validator = load_validator()?;

    let files: Vec<PathBuf> = if args.paths.is_empty() {
        let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
        let mut files: Vec<PathBuf> = project.iter_record_files(args.kind).collect();
        files.sort();
        files
    } else {
        expand_paths(&args.paths, args.kind.is_some())
    };

    let mut stats = ValidationStats::default();
    let mut had_error = false;

    println!(
        "{} Validating {} file(s)...\n",
        style("→").blue(),
        files.len()
    );

    for path in &files {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let Some(kind) = args.kind.or_else(|| RecordKind::from_filename(&filename)) else {
            stats.files_skipped += 1;
            if !args.summary {
                println!(
                    "{} {} - unknown record kind (skipped)",
                    style("?").yellow(),
                    path.display()
                );
            }
            continue;
        };

        stats.files_checked += 1;

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                if !args.summary {
                    println!("{} {} - {}", style("✗").red(), path.display(), e);
                }
                stats.files_failed += 1;
                stats.total_errors += 1;
                had_error = true;
                if !args.keep_going {
                    break;
                }
                continue;
            }
        };

        match validator.validate_document(&content, &filename, kind) {
            Ok(_) => {
                stats.files_passed += 1;
                if !args.summary {
                    println!("{} {}", style("✓").green(), path.display());
                }
            }
            Err(e) => {
                stats.files_failed += 1;
                stats.total_errors += e.violation_count();
                had_error = true;
                tracing::debug!(
                    path = %path.display(),
                    %kind,
                    errors = e.violation_count(),
                    "invalid record file"
                );

                if !args.summary {
                    println!(
                        "{} {} - {} error(s)",
                        style("✗").red(),
                        path.display(),
                        e.violation_count()
                    );

                    let report = miette::Report::new(e);
                    println!("{:?}", report);
                }

                if !args.keep_going {
                    break;
                }
            }
        }
    }

    println!();
    println!("{}", style("─".repeat(60)).dim());
    println!("{}", style("Validation Summary").bold());
    println!("{}", style("─".repeat(60)).dim());
    println!("  Files checked:  {}", style(stats.files_checked).cyan());
    println!("  Files passed:   {}", style(stats.files_passed).green());
    println!("  Files failed:   {}", style(stats.files_failed).red());
    println!("  Total errors:   {}", style(stats.total_errors).red());
    if stats.files_skipped > 0 {
        println!("  Files skipped:  {}", style(stats.files_skipped).yellow());
    }
    println!();

    if had_error {
        if stats.files_failed == 1 {
            Err(miette::miette!("Validation failed: 1 file has errors"))
        } else {
            Err(miette::miette!(
                "Validation failed: {} files have errors",
                stats.files_failed
            ))
        }
    } else {
        println!(
            "{} All files passed validation!",
            style("✓").green().bold()
        );
        Ok(())
    }
}

/// Expand directories into the record files they contain
///
/// Explicit file arguments are always kept; directory walks keep only files
/// whose name declares a kind, unless a kind was forced.
fn expand_paths(paths: &[PathBuf], forced_kind: bool) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_entry(|e| {
                    let name = e.file_name().to_string_lossy();
                    !name.starts_with('.') || e.depth() == 0
                })
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.path().to_path_buf())
                .filter(|p| (forced_kind && is_document(p)) || declares_kind(p))
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }

    files
}

fn declares_kind(path: &Path) -> bool {
    path.file_name()
        .map(|n| RecordKind::from_filename(&n.to_string_lossy()).is_some())
        .unwrap_or(false)
}

fn is_document(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml" | "json")
    )
}
