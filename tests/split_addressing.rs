use anyhow::Result;
use oorandom::Rand64;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use MalhDB::{OpenMode, Relation, RelnConfig, Tuple};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("malh-split-{prefix}-{pid}-{t}-{id}"))
}

fn random_tuple(rng: &mut Rand64, id: u64) -> String {
    format!("{},{},{}", id, rng.rand_range(0..50), rng.rand_range(0..1000))
}

#[test]
fn every_tuple_addresses_home_after_each_split() -> Result<()> {
    let root = unique_root("home");
    fs::create_dir_all(&root)?;
    let name = root.join("r");
    let mut r = Relation::builder(&name)
        .attrs(3)
        .depth(0)
        .config(RelnConfig::default().with_page_size(256).with_split_every(Some(5)))
        .create_and_open()?;

    let mut rng = Rand64::new(0x5eed_0001);
    let mut inserted = Vec::new();
    let mut splits_seen = 0;
    for id in 0..400u64 {
        let t = random_tuple(&mut rng, id);
        let pages_before = r.npages();
        let b = r.insert(&t)?;

        // placement agrees with the addressing rule
        let h = Tuple::parse(&t, 3)?.hash(r.choice_vector());
        assert_eq!(b, r.bucket_of(h), "tuple {}", t);
        assert!(b < r.npages());
        inserted.push(t);

        if r.npages() != pages_before {
            assert_eq!(r.npages(), pages_before + 1, "one split per insert at most");
            splits_seen += 1;
            let rep = r.check()?;
            assert_eq!(rep.tuples, inserted.len() as u64);
        }
    }
    assert_eq!(splits_seen, 79); // before inserts 5, 10, ..., 395
    assert_eq!(r.npages(), 80);
    assert_eq!(r.npages(), (1 << r.depth()) + r.split_pointer());

    // an exact query has exactly one candidate: the tuple's home bucket
    for t in inserted.iter().step_by(7) {
        let h = Tuple::parse(t, 3)?.hash(r.choice_vector());
        let q = r.query(t)?;
        assert_eq!(q.candidate_buckets(), vec![r.bucket_of(h)]);
        let got: Vec<String> = q.collect::<Result<_>>()?;
        assert_eq!(got, vec![t.clone()]);
    }

    r.close()?;
    fs::remove_dir_all(&root)?;
    Ok(())
}

#[test]
fn split_pointer_wraps_into_next_depth() -> Result<()> {
    let root = unique_root("wrap");
    fs::create_dir_all(&root)?;
    let name = root.join("r");
    let mut r = Relation::builder(&name)
        .attrs(2)
        .depth(1)
        .config(RelnConfig::default().with_split_every(Some(1_000_000)))
        .create_and_open()?;

    for i in 0..50 {
        r.insert(&format!("k{},v{}", i, i))?;
    }

    // d=1: buckets 0,1 split in turn, then d=2
    assert_eq!((r.depth(), r.split_pointer(), r.npages()), (1, 0, 2));
    r.split()?;
    assert_eq!((r.depth(), r.split_pointer(), r.npages()), (1, 1, 3));
    r.check()?;
    r.split()?;
    assert_eq!((r.depth(), r.split_pointer(), r.npages()), (2, 0, 4));
    r.check()?;
    for expect_sp in 1..4 {
        r.split()?;
        assert_eq!(r.split_pointer(), expect_sp);
        r.check()?;
    }
    r.split()?;
    assert_eq!((r.depth(), r.split_pointer(), r.npages()), (3, 0, 8));

    let rep = r.check()?;
    assert_eq!(rep.tuples, 50);
    let all: Vec<String> = r.query("?,?")?.collect::<Result<_>>()?;
    assert_eq!(all.len(), 50);

    r.close()?;
    fs::remove_dir_all(&root)?;
    Ok(())
}

#[test]
fn splitting_empty_buckets_is_harmless() -> Result<()> {
    let root = unique_root("empty");
    fs::create_dir_all(&root)?;
    let name = root.join("r");
    let mut r = Relation::builder(&name)
        .attrs(1)
        .config(RelnConfig::default())
        .create_and_open()?;

    for _ in 0..6 {
        r.split()?;
    }
    assert_eq!(r.npages(), 7);
    assert_eq!(r.overflow_pages(), 0);
    assert_eq!(r.check()?.tuples, 0);
    assert_eq!(r.query("?")?.count(), 0);

    r.close()?;
    let r = Relation::open(&name, OpenMode::ReadOnly)?;
    assert_eq!((r.depth(), r.split_pointer(), r.npages()), (2, 3, 7));
    r.close()?;
    fs::remove_dir_all(&root)?;
    Ok(())
}
