//! The `list` command.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::config::Config;

/// List configured packages.
///
/// Reads only the configuration; never performs network I/O, so it cannot
/// fail due to network conditions.
#[derive(Args, Debug, Default)]
pub struct ListCommand {}

impl ListCommand {
    /// Print every configured package with its architectures and state.
    pub fn execute(&self, config: &Config) -> Result<()> {
        if config.packages.is_empty() {
            println!("No packages configured.");
            return Ok(());
        }

        println!("{}", "Configured packages:".bold());
        for pkg in config.packages.values() {
            let arch_list = pkg
                .arch
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");

            if pkg.enable {
                println!("  {}  [{}]", pkg.name.green().bold(), arch_list);
            } else {
                println!("  {}  [{}] {}", pkg.name.dimmed(), arch_list, "(disabled)".dimmed());
            }
            if !pkg.upstream.is_empty() {
                println!("      upstream: {}", pkg.upstream);
            }
            println!("      recipe:   {}", pkg.pkgbuild.display());
        }
        Ok(())
    }
}
