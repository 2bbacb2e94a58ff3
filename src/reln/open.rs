//! reln/open — создание и открытие отношения (с конфигом и блокировками).

use anyhow::{anyhow, Result};
use log::{debug, info};
use std::path::Path;

use crate::chvec::ChoiceVector;
use crate::config::RelnConfig;
use crate::consts::{MAX_DEPTH, NO_PAGE};
use crate::error::RelnError;
use crate::free::FreeList;
use crate::lock::{try_acquire_lock, LockMode};
use crate::meta::{read_meta, write_meta_new, RelnMeta};
use crate::page::Page;
use crate::pager::{PageFile, PageKind};

use super::core::{OpenMode, Relation, RelnPaths};

impl Relation {
    /// Create relation `name` with `nattrs` attributes and `initial_pages`
    /// empty buckets, which must equal `2^depth`. `chvec` uses the
    /// `attr,bit:attr,bit:...` text format.
    pub fn create(
        name: impl AsRef<Path>,
        nattrs: u32,
        initial_pages: u32,
        depth: u32,
        chvec: &str,
    ) -> Result<()> {
        let cfg = RelnConfig::from_env();
        let cv = ChoiceVector::parse(chvec, nattrs)?;
        Self::create_with_config(name, nattrs, initial_pages, depth, &cv, &cfg)
    }

    pub fn create_with_config(
        name: impl AsRef<Path>,
        nattrs: u32,
        initial_pages: u32,
        depth: u32,
        chvec: &ChoiceVector,
        cfg: &RelnConfig,
    ) -> Result<()> {
        let name = name.as_ref();

        // All validation first: a rejected create leaves nothing behind.
        cfg.validate()?;
        if nattrs == 0 {
            return Err(RelnError::BadGeometry("relation needs at least one attribute".into()).into());
        }
        if depth > MAX_DEPTH {
            return Err(RelnError::BadGeometry(format!("depth {} exceeds {}", depth, MAX_DEPTH)).into());
        }
        if initial_pages as u64 != 1u64 << depth {
            return Err(RelnError::BadGeometry(format!(
                "initial pages {} != 2^{}",
                initial_pages, depth
            ))
            .into());
        }
        chvec.validate(nattrs)?;

        let paths = RelnPaths::new(name);
        for p in [&paths.info, &paths.data, &paths.ovflow] {
            if p.exists() {
                return Err(RelnError::AlreadyExists(p.clone()).into());
            }
        }

        let meta = RelnMeta::new(
            nattrs,
            depth,
            cfg.page_size,
            cfg.split_every_for(nattrs),
            chvec.clone(),
        );
        meta.validate()?;

        let lock = try_acquire_lock(&paths.lock, LockMode::Exclusive)?;
        let res = (|| -> Result<()> {
            let mut data = PageFile::create(&paths.data, cfg.page_size as usize, PageKind::Data)?;
            data.set_data_fsync(cfg.data_fsync);
            let empty = Page::new(cfg.page_size as usize);
            for _ in 0..initial_pages {
                data.append_page(&empty)?;
            }
            data.sync()?;
            let ovflow = PageFile::create(&paths.ovflow, cfg.page_size as usize, PageKind::Ovflow)?;
            ovflow.sync()?;
            write_meta_new(&paths.info, &meta)
        })();

        if let Err(e) = res {
            let _ = std::fs::remove_file(&paths.data);
            let _ = std::fs::remove_file(&paths.ovflow);
            let _ = std::fs::remove_file(&paths.info);
            drop(lock);
            let _ = std::fs::remove_file(&paths.lock);
            return Err(e.context(format!("create relation {}", name.display())));
        }

        info!(
            "created relation {} (attrs={}, d={}, page_size={}, split_every={})",
            name.display(),
            nattrs,
            depth,
            meta.page_size,
            meta.split_every
        );
        Ok(())
    }

    pub fn open(name: impl AsRef<Path>, mode: OpenMode) -> Result<Self> {
        let cfg = RelnConfig::from_env();
        Self::open_with_config(name, mode, &cfg)
    }

    /// Open an existing relation. ReadWrite takes an exclusive lock on
    /// NAME.lock, ReadOnly a shared one; both fail fast if held elsewhere.
    pub fn open_with_config(name: impl AsRef<Path>, mode: OpenMode, cfg: &RelnConfig) -> Result<Self> {
        let name = name.as_ref();
        let paths = RelnPaths::new(name);
        if !paths.info.exists() {
            return Err(anyhow!("relation {} does not exist", name.display()));
        }

        let lock_mode = match mode {
            OpenMode::ReadOnly => LockMode::Shared,
            OpenMode::ReadWrite => LockMode::Exclusive,
        };
        let lock = try_acquire_lock(&paths.lock, lock_mode)?;

        let meta = read_meta(&paths.info)?;
        let writable = mode == OpenMode::ReadWrite;
        let ps = meta.page_size as usize;

        let mut data = PageFile::open(&paths.data, ps, PageKind::Data, writable)?;
        let mut ovflow = PageFile::open(&paths.ovflow, ps, PageKind::Ovflow, writable)?;
        data.set_data_fsync(cfg.data_fsync);
        ovflow.set_data_fsync(cfg.data_fsync);

        if data.page_count() != meta.npages {
            return Err(anyhow!(
                "corrupt relation {}: meta says {} main pages, data file has {}",
                name.display(),
                meta.npages,
                data.page_count()
            ));
        }
        if meta.free_head != NO_PAGE && meta.free_head >= ovflow.page_count() {
            return Err(anyhow!(
                "corrupt relation {}: free head {} beyond overflow file ({} pages)",
                name.display(),
                meta.free_head,
                ovflow.page_count()
            ));
        }

        debug!(
            "open {}: mode={:?} hash={} d={} sp={} pages={} ovflow={} tuples={}",
            name.display(),
            mode,
            meta.hash_kind,
            meta.depth,
            meta.sp,
            meta.npages,
            ovflow.page_count(),
            meta.ntuples
        );
        info!("opened relation {} ({:?})", name.display(), mode);

        Ok(Self {
            free: FreeList::new(meta.free_head),
            paths,
            meta,
            data,
            ovflow,
            mode,
            closed: false,
            _lock: lock,
        })
    }
}
