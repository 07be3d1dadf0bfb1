//! `mouth install` command - create the record tables

use console::style;
use miette::Result;

use crate::cli::helpers::open_store;
use crate::cli::GlobalOpts;

#[derive(clap::Args, Debug)]
pub struct InstallArgs {}

pub fn run(_args: InstallArgs, global: &GlobalOpts) -> Result<()> {
    let mut store = open_store(global)?;
    store.install()?;

    if !global.quiet {
        for descriptor in store.registry().iter() {
            println!(
                "{} {}",
                style("✓").green(),
                style(descriptor.table()).cyan()
            );
            if let Some(changes) = descriptor.changes_table() {
                println!("{} {}", style("✓").green(), style(changes).cyan());
            }
        }
        println!();
        println!("{} Store installed", style("✓").green().bold());
    }
    Ok(())
}
