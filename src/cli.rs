//! cli — командная строка `malhdb`.
//!
//! Subcommands: create / insert / select / stats / check / gendata.
//! Tuples come one per line; output goes to stdout, diagnostics to the log.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod admin;
mod data;

#[derive(Parser, Debug)]
#[command(
    name = "malhdb",
    version,
    about = "Multi-attribute linear-hashed relations",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Create a relation (NAME.info, NAME.data, NAME.ovflow)
    Create {
        #[arg(long)]
        name: PathBuf,
        /// Number of attributes per tuple
        #[arg(long)]
        attrs: u32,
        /// Initial depth: the relation starts with 2^depth buckets
        #[arg(long, default_value_t = 0)]
        depth: u32,
        /// Choice vector "attr,bit:attr,bit:..." (32 items); round-robin if omitted
        #[arg(long)]
        chvec: Option<String>,
        /// Page size in bytes (power of two); MALH_PAGE_SIZE or 1024 if omitted
        #[arg(long)]
        page_size: Option<u32>,
        /// Split before every N-th insert; derived from page size if omitted
        #[arg(long)]
        split_every: Option<u32>,
    },
    /// Insert tuples, one per line (stdin unless --file)
    Insert {
        #[arg(long)]
        name: PathBuf,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Print tuples matching a query such as "1234,?,?"
    Select {
        #[arg(long)]
        name: PathBuf,
        #[arg(long)]
        query: String,
    },
    /// Relation summary and per-bucket page chains
    Stats {
        #[arg(long)]
        name: PathBuf,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Verify chains, tuple placement and the free list
    Check {
        #[arg(long)]
        name: PathBuf,
    },
    /// Print random distinct tuples "id,word,word,..."
    Gendata {
        #[arg(long)]
        tuples: u32,
        #[arg(long)]
        attrs: u32,
        #[arg(long, default_value_t = 0)]
        start_id: u64,
        #[arg(long)]
        seed: Option<u64>,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Create {
            name,
            attrs,
            depth,
            chvec,
            page_size,
            split_every,
        } => admin::cmd_create(name, attrs, depth, chvec, page_size, split_every),
        Cmd::Insert { name, file } => data::cmd_insert(name, file),
        Cmd::Select { name, query } => data::cmd_select(name, query),
        Cmd::Stats { name, json } => admin::cmd_stats(name, json),
        Cmd::Check { name } => admin::cmd_check(name),
        Cmd::Gendata {
            tuples,
            attrs,
            start_id,
            seed,
        } => data::cmd_gendata(tuples, attrs, start_id, seed),
    }
}
