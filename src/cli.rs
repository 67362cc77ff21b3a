use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "trie-index",
    about = "Build, query and merge Patricia and hybrid word tries stored as JSON",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Keep hybrid sibling levels AVL-balanced while inserting and merging
    #[arg(long, global = true)]
    pub balanced: bool,

    /// Write JSON on a single line
    #[arg(long, global = true)]
    pub compact: bool,

    /// Enable verbose output (honours RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Kind {
    /// Compressed radix trie
    Patricia,
    /// Ternary search trie
    Hybrid,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a trie from words on stdin (one per line) and print it as JSON
    Insert { kind: Kind },

    /// Delete the words on stdin from a stored trie, rewriting the file
    Delete { kind: Kind, file: PathBuf },

    /// Print the stored words in alphabetical order
    List { kind: Kind, file: PathBuf },

    /// Print the average leaf depth
    Depth { kind: Kind, file: PathBuf },

    /// Print the height (-1 for an empty trie)
    Height { kind: Kind, file: PathBuf },

    /// Print the number of stored words
    Count { kind: Kind, file: PathBuf },

    /// Print how many stored words start with a prefix
    Prefix {
        kind: Kind,
        file: PathBuf,
        prefix: String,
    },

    /// Merge two stored tries and print the result as JSON
    Merge {
        kind: Kind,
        first: PathBuf,
        second: PathBuf,
    },

    /// Print structural statistics
    Stats { kind: Kind, file: PathBuf },

    /// Print the node structure and any integrity problems
    Dump { kind: Kind, file: PathBuf },
}

impl Commands {
    pub fn kind(&self) -> Kind {
        match self {
            Commands::Insert { kind }
            | Commands::Delete { kind, .. }
            | Commands::List { kind, .. }
            | Commands::Depth { kind, .. }
            | Commands::Height { kind, .. }
            | Commands::Count { kind, .. }
            | Commands::Prefix { kind, .. }
            | Commands::Merge { kind, .. }
            | Commands::Stats { kind, .. }
            | Commands::Dump { kind, .. } => *kind,
        }
    }
}
