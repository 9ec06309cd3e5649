use super::CliConfig;
use super::common::{CommandContext, environment, print_success, print_warning, resolve_target};
use crate::discovery::version_of;
use crate::env::{EnvironmentStore, session_refresh_command};
use crate::utils::platform::is_valid_java_home;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tracing::debug;

#[derive(Args, Debug)]
pub struct UseCommand {
    /// Version (e.g. `21`, `17.0.9`) or path of the JDK.
    #[arg(value_name = "VERSION|PATH")]
    pub target: String,
}

impl UseCommand {
    pub fn execute(self, cli: &CliConfig) -> Result<()> {
        let ctx = CommandContext::load(cli)?;
        let home = resolve_target(&ctx.installations(), &self.target)?;
        debug!("Resolved '{}' to {}", self.target, home.display());

        let env = environment()?;
        env.set_home(&home)?;

        print_success(&format!(
            "Now using Java {} ({})",
            version_of(&home).bold(),
            home.display()
        ));
        println!("New shells pick this up from {}.", env.store().location());
        println!("To update the current shell, run:");
        println!("  {}", session_refresh_command(env.store().flavor(), &home).cyan());
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct CurrentCommand {}

impl CurrentCommand {
    pub fn execute(self, _cli: &CliConfig) -> Result<()> {
        let env = environment()?;
        match env.get_home()? {
            None => {
                println!("JAVA_HOME is not set. Run `jv use <version>` to choose a JDK.");
            }
            Some(home) if !is_valid_java_home(&home) => {
                print_warning(&format!(
                    "JAVA_HOME points to {}, which is not a JDK",
                    home.display()
                ));
            }
            Some(home) => {
                println!("Java {} ({})", version_of(&home).bold(), home.display());
            }
        }
        Ok(())
    }
}
