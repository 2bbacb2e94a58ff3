use anyhow::Result;
use std::path::PathBuf;

use crate::chvec::ChoiceVector;
use crate::config::RelnConfig;
use crate::reln::{OpenMode, Relation};

pub fn cmd_create(
    name: PathBuf,
    attrs: u32,
    depth: u32,
    chvec: Option<String>,
    page_size: Option<u32>,
    split_every: Option<u32>,
) -> Result<()> {
    let mut cfg = RelnConfig::from_env();
    if let Some(ps) = page_size {
        cfg = cfg.with_page_size(ps);
    }
    if split_every.is_some() {
        cfg = cfg.with_split_every(split_every);
    }
    let cv = match chvec {
        Some(spec) => ChoiceVector::parse(&spec, attrs)?,
        None => ChoiceVector::round_robin(attrs)?,
    };
    let pages = 1u32.checked_shl(depth).unwrap_or(0);
    Relation::create_with_config(&name, attrs, pages, depth, &cv, &cfg)?;
    println!("Created relation {} ({} attrs, {} bucket(s))", name.display(), attrs, pages);
    Ok(())
}

pub fn cmd_stats(name: PathBuf, json: bool) -> Result<()> {
    let r = Relation::open(&name, OpenMode::ReadOnly)?;
    let st = r.stats()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&st)?);
    } else {
        print!("{}", st);
    }
    r.close()
}

pub fn cmd_check(name: PathBuf) -> Result<()> {
    let r = Relation::open(&name, OpenMode::ReadOnly)?;
    let rep = r.check()?;
    println!("{}", rep);
    r.close()
}
