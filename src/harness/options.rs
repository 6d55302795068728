//! Command-line options contributed by the harness
//!
//! [`HarnessOptions`] is a clap `Args` group, so a host test binary can
//! flatten it into its own parser.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Args, Parser};
use serde::Serialize;

use crate::common::config::HarnessConfig;

#[derive(Args, Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[command(next_help_heading = "Application harness")]
pub struct HarnessOptions {
    /// Port used to run the live server when the live_server fixture is applied
    #[arg(long = "liveserver-port", value_name = "port")]
    pub liveserver_port: Option<u16>,

    /// Treat markers that were never registered as setup errors
    #[arg(long)]
    pub strict_markers: bool,

    /// Path to an app-harness.toml configuration file
    #[arg(long = "harness-config", value_name = "path")]
    pub config_path: Option<PathBuf>,
}

/// Standalone parser for when the harness options are the whole command line
#[derive(Parser, Debug)]
#[command(name = "app-harness")]
struct OptionsParser {
    #[command(flatten)]
    options: HarnessOptions,
}

impl HarnessOptions {
    /// Parse options from an argument list (first item is the binary name)
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        OptionsParser::try_parse_from(args).map(|parser| parser.options)
    }

    /// Fill unset options from the configuration file
    ///
    /// Values given on the command line win.
    pub fn resolve(mut self, config: &HarnessConfig) -> Self {
        if self.liveserver_port.is_none() {
            self.liveserver_port = config.liveserver_port;
        }
        self.strict_markers |= config.strict_markers;
        self
    }
}
