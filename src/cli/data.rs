use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use crate::error::RelnError;
use crate::metrics::metrics_snapshot;
use crate::reln::{OpenMode, Relation};
use crate::tuple::split_fields;

pub fn cmd_insert(name: PathBuf, file: Option<PathBuf>) -> Result<()> {
    let input: Box<dyn BufRead> = match &file {
        Some(p) => Box::new(BufReader::new(
            File::open(p).with_context(|| format!("open {}", p.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut r = Relation::open(&name, OpenMode::ReadWrite)?;
    let nattrs = r.nattrs() as usize;
    let mut inserted = 0u64;
    for (lineno, line) in input.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        let got = split_fields(line).len();
        if got != nattrs {
            warn!("line {}: {} attribute(s), expected {}; skipped", lineno + 1, got, nattrs);
            continue;
        }
        match r.insert(line) {
            Ok(_) => inserted += 1,
            Err(e) => match e.downcast_ref::<RelnError>() {
                Some(RelnError::TupleTooLong { .. }) | Some(RelnError::BadTuple(_)) => {
                    warn!("line {}: {}; skipped", lineno + 1, e);
                }
                _ => return Err(e),
            },
        }
    }

    let m = metrics_snapshot();
    info!(
        "insert: {} tuple(s), {} split(s), overflow pages grown={} reused={} (reuse {:.1}%)",
        inserted,
        m.splits,
        m.overflow_pages_grown,
        m.overflow_pages_reused,
        m.overflow_reuse_ratio() * 100.0
    );
    r.close()?;
    println!("{}", inserted);
    Ok(())
}

pub fn cmd_select(name: PathBuf, query: String) -> Result<()> {
    let r = Relation::open(&name, OpenMode::ReadOnly)?;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut q = r.query(&query)?;
    while let Some(t) = q.next_tuple()? {
        writeln!(out, "{}", t)?;
    }
    q.close();
    out.flush()?;
    drop(out);
    r.close()
}

// Rough English letter frequencies.
const LETTERS: &[u8] = b"eeeeeeeeeeeettttttttaaaaaaaaoooooooiiiiiiinnnnnnnssssssrrrrrrhhhhhhddddlllluuucccmmmwwffggyyppbbvkjxqz";

fn random_word(rng: &mut StdRng) -> String {
    let len = rng.gen_range(3..=8);
    (0..len)
        .map(|_| LETTERS[rng.gen_range(0..LETTERS.len())] as char)
        .collect()
}

pub fn cmd_gendata(tuples: u32, attrs: u32, start_id: u64, seed: Option<u64>) -> Result<()> {
    if tuples == 0 {
        return Err(anyhow!("--tuples must be at least 1"));
    }
    if !(1..=10).contains(&attrs) {
        return Err(anyhow!("--attrs must be in 1..=10, got {}", attrs));
    }
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for i in 0..tuples as u64 {
        // the leading id keeps tuples distinct
        let mut line = (start_id + i).to_string();
        for _ in 1..attrs {
            line.push(',');
            line.push_str(&random_word(&mut rng));
        }
        writeln!(out, "{}", line)?;
    }
    out.flush()?;
    Ok(())
}
