mod cli;

use std::fs;
use std::io::{self, BufRead};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, Kind};
use tracing::info;
use trie_index::{load, render, Config, HybridTrie, PatriciaTrie, WordTrie};

fn init_tracing(cli: &Cli) {
    // Logs stay off unless --verbose is given, so stdout carries only results.
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    } else {
        tracing_subscriber::EnvFilter::new("off")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let config = Config {
        rebalance: cli.balanced,
        pretty_json: !cli.compact,
    };
    match cli.command.kind() {
        Kind::Patricia => run::<PatriciaTrie>(cli.command, &config),
        Kind::Hybrid => run::<HybridTrie>(cli.command, &config),
    }
}

fn run<T: WordTrie>(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Insert { .. } => {
            let mut trie = T::with_config(config);
            for (line, word) in read_words(io::stdin().lock())? {
                trie.add_word(word.as_bytes(), line)
                    .with_context(|| format!("line {line}: cannot insert {word:?}"))?;
            }
            info!(words = trie.word_count(), "built trie");
            println!("{}", render(&trie, config)?);
        }

        Commands::Delete { file, .. } => {
            let mut trie: T = load_file(&file, config)?;
            let mut removed = 0usize;
            for (line, word) in read_words(io::stdin().lock())? {
                if trie
                    .remove_word(word.as_bytes())
                    .with_context(|| format!("line {line}: cannot delete {word:?}"))?
                {
                    removed += 1;
                }
            }
            fs::write(&file, render(&trie, config)?)
                .with_context(|| format!("writing {}", file.display()))?;
            info!(removed, remaining = trie.word_count(), "deleted words");
        }

        Commands::List { file, .. } => {
            let trie: T = load_file(&file, config)?;
            for word in trie.words() {
                println!("{word}");
            }
        }

        Commands::Depth { file, .. } => {
            let trie: T = load_file(&file, config)?;
            println!("{:.3}", trie.mean_depth());
        }

        Commands::Height { file, .. } => {
            let trie: T = load_file(&file, config)?;
            println!("{}", trie.tree_height());
        }

        Commands::Count { file, .. } => {
            let trie: T = load_file(&file, config)?;
            println!("{}", trie.word_count());
        }

        Commands::Prefix { file, prefix, .. } => {
            let trie: T = load_file(&file, config)?;
            println!("{}", trie.count_prefix(prefix.as_bytes()));
        }

        Commands::Merge { first, second, .. } => {
            let a: T = load_file(&first, config)?;
            let b: T = load_file(&second, config)?;
            let merged = a.absorb(b);
            info!(words = merged.word_count(), "merged tries");
            println!("{}", render(&merged, config)?);
        }

        Commands::Stats { file, .. } => {
            let trie: T = load_file(&file, config)?;
            println!("{}", trie.stats());
        }

        Commands::Dump { file, .. } => {
            let trie: T = load_file(&file, config)?;
            print!("{}", trie.dump());
            for issue in trie.verify() {
                eprintln!("warning: {issue}");
            }
        }
    }
    Ok(())
}

fn load_file<T: WordTrie>(path: &Path, config: &Config) -> Result<T> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let trie = load(&bytes, config).with_context(|| format!("loading {}", path.display()))?;
    Ok(trie)
}

/// Non-empty lines with their 1-based line numbers.
fn read_words(input: impl BufRead) -> Result<Vec<(u64, String)>> {
    let mut words = Vec::new();
    for (line, text) in (1u64..).zip(input.lines()) {
        let text = text.context("reading stdin")?;
        let word = text.trim_end_matches('\r');
        if !word.is_empty() {
            words.push((line, word.to_string()));
        }
    }
    Ok(words)
}
