//! Parses command-line arguments for the dev relayer.

use std::path::PathBuf;

use clap::{crate_version, Parser};

#[derive(Debug, Parser)]
#[clap(
    name = "dev-relayer",
    about = "Runs a set of bridge relayers against in-memory ledgers",
    version = crate_version!()
)]
pub(crate) struct Cli {
    #[clap(
        long,
        short = 'c',
        help = "The file containing the configuration for the relayers",
        default_value = "config.toml"
    )]
    pub config: PathBuf,
}
