use std::path::PathBuf;

use clap::Parser;

/// Terminal task manager with nested folders.
/// The whole tree lives in one JSON file, ./config.json unless -c is given.
#[derive(Parser, Debug)]
#[command(name = "tt", version, about = "Nested folder task manager")]
pub struct Cli {
    /// Path to the JSON state file. It must already exist.
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,
}
