use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use MalhDB::{OpenMode, Relation, RelnConfig};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("malh-ovf-{prefix}-{pid}-{t}-{id}"))
}

/// One long chain, split by hand: the pages it no longer needs go to the
/// free list and are reused before the overflow file grows again.
#[test]
fn split_frees_pages_and_inserts_reuse_them() -> Result<()> {
    let root = unique_root("reuse");
    fs::create_dir_all(&root)?;
    let name = root.join("r");
    let mut r = Relation::builder(&name)
        .attrs(2)
        .depth(0)
        .config(RelnConfig::default().with_page_size(128).with_split_every(Some(1_000_000)))
        .create_and_open()?;

    for i in 0..200 {
        r.insert(&format!("{:05},payload{}", i, i % 10))?;
    }
    let chained = r.overflow_pages();
    assert!(chained >= 20, "expected a long chain, got {} overflow pages", chained);
    assert_eq!(r.free_head(), None);

    // equal-size tuples: each split needs no more overflow pages than it
    // drained, so pages pile up on the free list without the file growing
    let mut splits = 0;
    while r.free_head().is_none() {
        r.split()?;
        splits += 1;
        assert_eq!(r.overflow_pages(), chained, "split {} grew the overflow file", splits);
        assert!(splits <= 16, "splits never freed an overflow page");
    }
    let rep = r.check()?;
    assert!(rep.free_pages > 0);
    assert_eq!(rep.overflow_pages + rep.free_pages, r.overflow_pages());
    assert_eq!(rep.tuples, 200);

    // while the free list has pages, the overflow file must not grow
    let mut i = 200;
    while r.free_head().is_some() {
        let before = r.overflow_pages();
        r.insert(&format!("{:05},payload{}", i, i % 10))?;
        assert_eq!(r.overflow_pages(), before, "grew with free pages available (insert {})", i);
        i += 1;
        assert!(i < 2_000, "free list never drained");
    }
    let rep = r.check()?;
    assert_eq!(rep.free_pages, 0);
    assert_eq!(rep.tuples, i as u64);

    // the free list survives close/reopen
    r.split()?;
    let head = r.free_head();
    r.close()?;
    let r = Relation::open(&name, OpenMode::ReadOnly)?;
    assert_eq!(r.free_head(), head);
    r.check()?;
    r.close()?;

    fs::remove_dir_all(&root)?;
    Ok(())
}

/// A split takes its new overflow pages from the chain it just drained,
/// not from the end of the file.
#[test]
fn split_refills_from_drained_chain() -> Result<()> {
    let root = unique_root("refill");
    fs::create_dir_all(&root)?;
    let name = root.join("r");
    let mut r = Relation::builder(&name)
        .attrs(2)
        .depth(0)
        .config(RelnConfig::default().with_page_size(128).with_split_every(Some(1_000_000)))
        .create_and_open()?;

    // 15 bytes per tuple, 7 per page: 200 of them fill 1 main + 28 overflow pages
    for i in 0..200 {
        r.insert(&format!("{:05},payload{}", i, i % 10))?;
    }
    let before = r.overflow_pages();
    assert_eq!(before, 28);

    r.split()?;
    assert_eq!(r.overflow_pages(), before, "split appended overflow pages");

    let rep = r.check()?;
    assert_eq!(rep.tuples, 200);
    assert_eq!(rep.overflow_pages + rep.free_pages, before);
    // both result chains are packed: at most one partly filled page each
    let st = r.stats()?;
    for b in &st.buckets {
        let n: u32 = b.pages.iter().map(|p| p.tuples).sum();
        assert_eq!(b.pages.len() as u32, ((n + 6) / 7).max(1), "bucket {}", b.bucket);
    }
    r.close()?;

    fs::remove_dir_all(&root)?;
    Ok(())
}

#[test]
fn stats_show_chains_and_free_list() -> Result<()> {
    let root = unique_root("stats");
    fs::create_dir_all(&root)?;
    let name = root.join("r");
    let mut r = Relation::builder(&name)
        .attrs(2)
        .config(RelnConfig::default().with_page_size(128).with_split_every(Some(1_000_000)))
        .create_and_open()?;
    for i in 0..40 {
        r.insert(&format!("{:03},abcdef", i))?;
    }

    let st = r.stats()?;
    assert_eq!(st.buckets.len(), 1);
    let chain = &st.buckets[0].pages;
    assert_eq!(chain.len() as u32, 1 + r.overflow_pages());
    assert_eq!(chain.iter().map(|p| p.tuples).sum::<u32>(), 40);
    assert_eq!(chain.last().and_then(|p| p.overflow), None);

    let text = st.to_string();
    assert!(text.starts_with("Global Info:\n#attrs:2  #pages:1  #tuples:40  d:0  sp:0\n"));
    assert!(text.contains("[ 0]  (d0,"));
    assert!(text.contains(" -> (ov"));

    let json = serde_json::to_value(&st)?;
    assert_eq!(json["ntuples"], 40);
    assert_eq!(json["buckets"][0]["pages"][0]["kind"], "data");

    r.close()?;
    fs::remove_dir_all(&root)?;
    Ok(())
}
