pub mod commands;
pub mod context;
pub mod output;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Encrypt and decrypt batches of files with age.
#[derive(Parser, Debug)]
#[command(name = "agebatch", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the age executable (default: bundled copy, then PATH)
    #[arg(long, global = true, env = "AGEBATCH_ENGINE")]
    pub engine: Option<PathBuf>,

    /// Seconds one file may take before the engine is stopped
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Print the batch result as JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode: only show errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Alternative config directory
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Encrypt files and folders for the given recipients
    Encrypt(BatchArgs),

    /// Decrypt .age files with the given identities
    Decrypt(BatchArgs),

    /// Encrypt or decrypt, depending on the files given
    Process(BatchArgs),

    /// Manage remembered recipient keys
    Keys {
        #[command(subcommand)]
        action: KeysAction,
    },
}

/// Files and keys shared by every batch command.
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Files or folders to process (folders are walked recursively)
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Key file; repeat for several recipients or identities
    #[arg(short, long = "key")]
    pub keys: Vec<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum KeysAction {
    /// List remembered recipient keys
    List,
    /// Remember a recipient public key file
    Add {
        /// Path to the public key file
        path: PathBuf,
    },
    /// Forget a remembered recipient key
    Remove {
        /// Path of the key file to forget
        path: PathBuf,
    },
    /// Forget every remembered recipient key
    Clear,
}
