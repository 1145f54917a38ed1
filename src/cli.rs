//! Command line argument parsing for the `sprig` binary.

use clap::Parser;
use std::path::PathBuf;

/// Parse a Sprig source file and print its tree and diagnostics.
///
/// The exit code is 0 for a clean parse, 1 when diagnostics were reported
/// and 2 when the file could not be read or parsed at all.
#[derive(Parser)]
#[command(
    name = "sprig",
    version,
    about = "Sprig front end: parse a source file and dump its syntax tree"
)]
pub(crate) struct Cli {
    /// Path to the source file.
    pub(crate) path: PathBuf,

    /// Print the lexeme table before the tree.
    #[arg(long)]
    pub(crate) tokens: bool,

    /// Trace lexemes, parser states and recoveries to stderr.
    #[arg(long)]
    pub(crate) trace: bool,

    /// Disable colored output.
    #[arg(long)]
    pub(crate) no_color: bool,

    /// Only print diagnostics.
    #[arg(short, long)]
    pub(crate) quiet: bool,
}
