//! CLI command definitions
//!
//! Defines the clap commands for the app-harness CLI.

use clap::Subcommand;

use crate::common::config::HarnessConfig;
use crate::common::{Error, Result};
use crate::harness::{Harness, HarnessOptions, MarkerRegistry};
use crate::reporter;
use crate::testing::selftest;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// List the markers tests may use
    Markers,

    /// Show the resolved harness options (config file merged with flags)
    Options,

    /// Run the lifecycle checks against the built-in in-memory application
    Selftest,
}

/// Load the configuration named by the options, or discover one
pub fn load_config(options: &HarnessOptions) -> Result<HarnessConfig> {
    match &options.config_path {
        Some(path) => HarnessConfig::load_from(path),
        None => HarnessConfig::load(),
    }
}

/// Built-in markers plus those registered in the config file
pub fn marker_registry(config: &HarnessConfig) -> MarkerRegistry {
    let mut registry = MarkerRegistry::with_defaults();
    for line in &config.markers {
        registry.register_line(line);
    }
    registry
}

/// Run a CLI command
pub fn dispatch(command: Commands, options: HarnessOptions) -> Result<()> {
    let config = load_config(&options)?;

    match command {
        Commands::Markers => {
            for spec in marker_registry(&config).iter() {
                println!("@mark.{}: {}", spec.signature, spec.description);
                println!();
            }
            Ok(())
        }

        Commands::Options => {
            let resolved = options.resolve(&config);
            println!("{}", serde_json::to_string_pretty(&resolved)?);
            Ok(())
        }

        Commands::Selftest => {
            let harness = Harness::with_config(options, &config);
            let summary = selftest::run(&harness)?;
            reporter::print_session(&summary);
            if summary.is_success() {
                Ok(())
            } else {
                Err(Error::TestAssertion(format!(
                    "{} of {} lifecycle checks did not pass",
                    summary.reports.len() - summary.passed(),
                    summary.reports.len()
                )))
            }
        }
    }
}
