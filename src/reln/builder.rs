//! reln/builder — RelnBuilder: параметры create() плюс RelnConfig.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::chvec::ChoiceVector;
use crate::config::RelnConfig;

use super::core::{OpenMode, Relation};

/// Collects create parameters; `Relation::builder(name)` starts one.
/// Config starts from env (`RelnConfig::from_env`), setters override.
#[derive(Clone, Debug)]
pub struct RelnBuilder {
    name: PathBuf,
    attrs: u32,
    depth: u32,
    pages: Option<u32>,
    chvec: Option<String>,
    cfg: RelnConfig,
}

impl Relation {
    pub fn builder(name: impl AsRef<Path>) -> RelnBuilder {
        RelnBuilder::new(name)
    }
}

impl RelnBuilder {
    pub fn new(name: impl AsRef<Path>) -> Self {
        Self {
            name: name.as_ref().to_path_buf(),
            attrs: 1,
            depth: 0,
            pages: None,
            chvec: None,
            cfg: RelnConfig::from_env(),
        }
    }

    pub fn attrs(mut self, n: u32) -> Self {
        self.attrs = n;
        self
    }

    pub fn depth(mut self, d: u32) -> Self {
        self.depth = d;
        self
    }

    /// Initial page count; defaults to `2^depth`.
    pub fn pages(mut self, n: u32) -> Self {
        self.pages = Some(n);
        self
    }

    /// Choice vector text; defaults to round-robin over the attributes.
    pub fn choice_vector<S: Into<String>>(mut self, spec: S) -> Self {
        self.chvec = Some(spec.into());
        self
    }

    pub fn config(mut self, cfg: RelnConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn page_size(mut self, ps: u32) -> Self {
        self.cfg.page_size = ps;
        self
    }

    pub fn split_every(mut self, every: u32) -> Self {
        self.cfg.split_every = Some(every);
        self
    }

    pub fn data_fsync(mut self, on: bool) -> Self {
        self.cfg.data_fsync = on;
        self
    }

    /// Create the relation files.
    pub fn create(&self) -> Result<()> {
        let cv = match &self.chvec {
            Some(spec) => ChoiceVector::parse(spec, self.attrs)?,
            None => ChoiceVector::round_robin(self.attrs)?,
        };
        let pages = match self.pages {
            Some(p) => p,
            None => 1u32.checked_shl(self.depth).unwrap_or(0),
        };
        Relation::create_with_config(&self.name, self.attrs, pages, self.depth, &cv, &self.cfg)
    }

    /// Create, then open read-write.
    pub fn create_and_open(&self) -> Result<Relation> {
        self.create()?;
        Relation::open_with_config(&self.name, OpenMode::ReadWrite, &self.cfg)
    }
}
