//! The `update` command.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::config::Config;
use crate::core::{PackageUpdater, UpdateStatus};

/// Update packages to their latest upstream releases.
///
/// With no names, every enabled package is updated; explicitly named
/// packages are updated even when disabled. Any failing package makes the
/// process exit non-zero, but never prevents the others from completing.
#[derive(Args, Debug, Default)]
pub struct UpdateCommand {
    /// Packages to update; all enabled packages when omitted.
    pub packages: Vec<String>,
}

impl UpdateCommand {
    /// Run the updates and print a per-package report.
    pub async fn execute(&self, config: Config) -> Result<()> {
        let updater = PackageUpdater::new(config)?;

        let reports = if self.packages.is_empty() {
            updater.update_all().await
        } else {
            updater.update_packages(&self.packages).await
        };

        if reports.is_empty() {
            println!("Nothing to update.");
            return Ok(());
        }

        let mut failures = 0usize;
        for report in &reports {
            match &report.status {
                UpdateStatus::Updated { version } => {
                    println!(
                        "{} {} updated to {}",
                        "✓".green(),
                        report.package.bold(),
                        version.green()
                    );
                }
                UpdateStatus::UpToDate => {
                    println!("{} {} already up to date", "✓".green(), report.package.bold());
                }
                UpdateStatus::Failed(error) => {
                    failures += 1;
                    println!("{} {} failed: {error}", "✗".red(), report.package.bold());
                }
            }
            for (arch, error) in &report.arch_failures {
                println!("    {} {arch}: {error}", "!".yellow());
            }
        }

        if failures > 0 {
            anyhow::bail!("{failures} of {} package update(s) failed", reports.len());
        }
        Ok(())
    }
}
