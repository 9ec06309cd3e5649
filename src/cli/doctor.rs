use super::CliConfig;
use super::common::{environment, print_success};
use crate::config::Config;
use crate::doctor::{Doctor, DoctorCheck, DoctorResult, DoctorStatus};
use crate::upgrade::SelfUpdater;
use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;
use tracing::debug;

fn format_check_line(check: &DoctorCheck) -> String {
    let marker = match check.status {
        DoctorStatus::Ok => "✓".green(),
        DoctorStatus::Warning => "!".yellow(),
        DoctorStatus::Error => "✗".red(),
    };
    let mut line = format!("{marker} {}", check.message);
    if let Some(issue) = &check.issue {
        line.push_str(&format!("\n    → {}", issue.fix()));
    }
    line
}

fn print_report(result: &DoctorResult) {
    for check in &result.checks {
        println!("{}", format_check_line(check));
    }
    println!();
    if result.is_healthy() {
        print_success("Your Java environment looks good");
    } else {
        println!(
            "{} error(s), {} warning(s)",
            result.errors.to_string().red(),
            result.warnings.to_string().yellow()
        );
    }
}

#[derive(Args, Debug)]
pub struct DoctorCommand {}

impl DoctorCommand {
    pub fn execute(self, cli: &CliConfig) -> Result<()> {
        let config_path = Config::resolve_path(cli.config_path.as_deref())?;
        let env = environment()?;
        let mut doctor = Doctor::new(&env, config_path);
        if let Ok(exe) = SelfUpdater::current_executable() {
            doctor = doctor.with_executable(exe);
        }

        let result = doctor.diagnose();
        print_report(&result);
        if result.errors > 0 {
            bail!("jv doctor found {} error(s)", result.errors);
        }
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct RepairCommand {}

impl RepairCommand {
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let config_path = Config::resolve_path(cli.config_path.as_deref())?;
        let env = environment()?;
        let mut doctor = Doctor::new(&env, config_path);
        match SelfUpdater::current_executable() {
            Ok(exe) => doctor = doctor.with_executable(exe),
            Err(e) => debug!("Skipping backup check: {e}"),
        }

        let result = doctor.diagnose();
        if result.is_healthy() {
            print_success("Nothing to repair");
            return Ok(());
        }

        let report = doctor.repair(&result).await?;
        for action in &report.repaired {
            print_success(action);
        }
        for issue in &report.remaining {
            println!("{} {issue}\n    → {}", "!".yellow(), issue.fix());
        }
        if !report.remaining.is_empty() {
            bail!("{} issue(s) need manual attention", report.remaining.len());
        }
        Ok(())
    }
}
