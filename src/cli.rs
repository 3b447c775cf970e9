//! Command Line Interface (CLI) arguments.

use clap::Parser;
use std::path::PathBuf;

/// Mortality dashboard command line interface
#[derive(Clone, Debug, Parser)]
pub struct CommandLineArgs {
    /// The IP address on which the dashboard should listen
    #[arg(long, default_value = "0.0.0.0", env = "MORTALIDAD_HOST")]
    pub host: String,
    /// The port to which the dashboard should bind
    #[arg(long, default_value_t = 8050, env = "MORTALIDAD_PORT")]
    pub port: u16,
    /// Directory containing the DANE CSV sources
    #[arg(long, default_value = "data", env = "MORTALIDAD_DATA_DIR")]
    pub data_dir: PathBuf,
    /// Open the dashboard in the system browser once it is serving
    #[arg(long, env = "MORTALIDAD_OPEN")]
    pub open: bool,
}

impl CommandLineArgs {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        CommandLineArgs::parse()
    }
}
