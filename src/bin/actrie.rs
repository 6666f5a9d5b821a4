//! actrie - build, inspect and query serialized tries and automata.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use rustc_hash::FxHashSet;
use std::fs;
use std::path::PathBuf;
use std::process;

use actrie::buffer::{kind_of, Header, StructureKind};
use actrie::{Ac, MatchOptions, Trie};

#[derive(Parser)]
#[command(name = "actrie")]
#[command(about = "Unicode trie and Aho-Corasick automaton toolkit")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an index from a word list (one word per line) and save it
    Build {
        /// Word list file
        words: PathBuf,

        /// Output index file
        out: PathBuf,

        /// Build an Aho-Corasick automaton instead of a trie
        #[arg(short, long)]
        automaton: bool,

        /// Case-fold words and query text
        #[arg(short, long)]
        ignore_case: bool,

        /// Keep trie transitions sorted (lexicographic predict order)
        #[arg(short, long)]
        ordered: bool,
    },

    /// Match a text file against a saved index
    Match {
        /// Index file produced by `build`
        index: PathBuf,

        /// Text file to scan
        text: PathBuf,

        /// Separator characters bounding valid matches
        #[arg(short, long)]
        separators: Option<String>,

        /// Keep only leftmost-longest non-overlapping matches (automaton)
        #[arg(short, long)]
        leftmost_longest: bool,

        /// Suppress matches nested inside another match (automaton)
        #[arg(short = 'n', long)]
        no_substring: bool,
    },

    /// Print header information for a saved index
    Info {
        /// Index file
        index: PathBuf,
    },
}

fn main() {
    if let Err(e) = run(Cli::parse()) {
        eprintln!("{} {e:#}", "error:".red().bold());
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Build {
            words,
            out,
            automaton,
            ignore_case,
            ordered,
        } => build(words, out, automaton, ignore_case, ordered),
        Commands::Match {
            index,
            text,
            separators,
            leftmost_longest,
            no_substring,
        } => run_match(index, text, separators, leftmost_longest, no_substring),
        Commands::Info { index } => info(index),
    }
}

fn read_words(path: &PathBuf) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading word list {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_owned)
        .collect())
}

fn build(
    words: PathBuf,
    out: PathBuf,
    automaton: bool,
    ignore_case: bool,
    ordered: bool,
) -> Result<()> {
    let list = read_words(&words)?;
    if automaton {
        let ac = Ac::build(&list, ignore_case);
        ac.save(&out)
            .with_context(|| format!("saving {}", out.display()))?;
        println!(
            "{} automaton with {} words ({} bytes) -> {}",
            "built".green().bold(),
            ac.size(),
            ac.buff_size(),
            out.display()
        );
    } else {
        let mut trie = Trie::builder()
            .ignore_case(ignore_case)
            .ordered(ordered)
            .build();
        for word in &list {
            trie.insert(word);
        }
        trie.save(&out)
            .with_context(|| format!("saving {}", out.display()))?;
        println!(
            "{} trie with {} words ({} bytes) -> {}",
            "built".green().bold(),
            trie.len(),
            trie.buff_size(),
            out.display()
        );
    }
    Ok(())
}

fn run_match(
    index: PathBuf,
    text: PathBuf,
    separators: Option<String>,
    leftmost_longest: bool,
    no_substring: bool,
) -> Result<()> {
    let bytes =
        fs::read(&index).with_context(|| format!("reading index {}", index.display()))?;
    let content =
        fs::read_to_string(&text).with_context(|| format!("reading text {}", text.display()))?;
    let sep_set: Option<FxHashSet<char>> = separators.map(|s| s.chars().collect());

    match kind_of(&bytes)? {
        StructureKind::Trie => {
            if leftmost_longest || no_substring {
                bail!("--leftmost-longest/--no-substring only apply to automaton indexes");
            }
            let trie = Trie::from_buff(&bytes, false)?;
            for (id, start, end) in trie.match_longest(&content, sep_set.as_ref()) {
                print_match(id, start, end, &trie.word(id)?);
            }
        }
        StructureKind::Automaton => {
            let ac = Ac::from_buff(&bytes, false)?;
            let mut options = MatchOptions::new();
            if let Some(set) = sep_set.as_ref() {
                options = options.separators(set);
            }
            if leftmost_longest {
                options = options.leftmost_longest();
            }
            if no_substring {
                options = options.no_substring();
            }
            for (id, start, end) in ac.matches_with(&content, &options) {
                print_match(id, start, end, &ac.word(id)?);
            }
        }
    }
    Ok(())
}

fn print_match(id: u32, start: usize, end: usize, word: &str) {
    println!("{start}..{end}\t{}\t{}", id.to_string().cyan(), word.bold());
}

fn info(index: PathBuf) -> Result<()> {
    let bytes =
        fs::read(&index).with_context(|| format!("reading index {}", index.display()))?;
    let header = Header::parse(&bytes)?;
    let kind = match header.kind {
        StructureKind::Trie => "trie",
        StructureKind::Automaton => "automaton",
    };
    println!("{}: {}", "kind".bold(), kind);
    println!("{}: {}", "ignore_case".bold(), header.ignore_case);
    println!("{}: {}", "ordered".bold(), header.ordered);
    println!("{}: {}", "nodes".bold(), header.node_count);
    println!("{}: {}", "word ids".bold(), header.value_count);
    println!("{}: {}", "free nodes".bold(), header.free_node_count);
    println!("{}: {}", "free word ids".bold(), header.free_value_count);
    println!("{}: {}", "bytes".bold(), header.buff_len);
    Ok(())
}
