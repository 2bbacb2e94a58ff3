// src/meta.rs — MalhDB relation metadata (NAME.info, v1)
//
// Формат NAME.info (LE):
// MAGIC8 = "MALHREL1"
// u32 version         = 1
// u32 page_size       (128..=1MiB, power of two)
// u32 split_every     (split before insert when ntuples % split_every == 0)
// u32 hash_kind       (1 = xxhash32(seed=0))
// u32 nattrs
// u32 depth
// u32 sp
// u32 npages          (main pages == 2^depth + sp)
// u32 ntuples
// u32 free_head       (first free overflow page, NO_PAGE if none)
// 32 x (u32 attr, u32 bit)   choice vector
//
// Политика:
// - Атомарная запись: tmp+rename, затем fsync родительского каталога (best‑effort на Windows).
// - read_meta проверяет геометрию целиком: битый .info не открывается.

use anyhow::{anyhow, Context, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
#[cfg(unix)]
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::chvec::{ChVecItem, ChoiceVector};
use crate::consts::{MAX_CHVEC, MAX_DEPTH, MAX_PAGE_SIZE, META_MAGIC, META_VERSION, MIN_PAGE_SIZE, NO_PAGE};
use crate::error::RelnError;
use crate::hash::HashKind;

/// Encoded size of a v1 metadata file.
pub const META_SIZE: usize = 8 + 4 * 4 + 6 * 4 + MAX_CHVEC * 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelnMeta {
    pub version: u32,
    pub page_size: u32,
    pub split_every: u32,
    pub hash_kind: HashKind,
    pub nattrs: u32,
    pub depth: u32,
    pub sp: u32,
    pub npages: u32,
    pub ntuples: u32,
    pub free_head: u32,
    pub chvec: ChoiceVector,
}

impl RelnMeta {
    /// Metadata of a freshly created relation: 2^depth empty buckets.
    pub fn new(nattrs: u32, depth: u32, page_size: u32, split_every: u32, chvec: ChoiceVector) -> Self {
        Self {
            version: META_VERSION,
            page_size,
            split_every,
            hash_kind: crate::hash::HASH_KIND_DEFAULT,
            nattrs,
            depth,
            sp: 0,
            npages: 1u32 << depth,
            ntuples: 0,
            free_head: NO_PAGE,
            chvec,
        }
    }

    /// Structural checks shared by create and open.
    pub fn validate(&self) -> Result<()> {
        validate_page_size(self.page_size)?;
        if self.nattrs == 0 {
            return Err(RelnError::BadGeometry("relation needs at least one attribute".into()).into());
        }
        if self.depth > MAX_DEPTH {
            return Err(RelnError::BadGeometry(format!("depth {} exceeds {}", self.depth, MAX_DEPTH)).into());
        }
        if self.split_every == 0 {
            return Err(RelnError::BadGeometry("split_every must be >= 1".into()).into());
        }
        let base = 1u64 << self.depth;
        if self.sp as u64 >= base {
            return Err(RelnError::BadGeometry(format!(
                "split pointer {} outside 0..{}",
                self.sp, base
            ))
            .into());
        }
        if self.npages as u64 != base + self.sp as u64 {
            return Err(RelnError::BadGeometry(format!(
                "npages {} != 2^{} + {}",
                self.npages, self.depth, self.sp
            ))
            .into());
        }
        self.chvec.validate(self.nattrs)
    }
}

// ---- Внутренние утилиты ----

fn tmp_path(path: &Path) -> PathBuf {
    let mut s: OsString = path.as_os_str().to_os_string();
    s.push(".tmp");
    PathBuf::from(s)
}

#[cfg(unix)]
fn fsync_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            let dir = File::open(parent)?;
            dir.sync_all()?;
        }
    }
    Ok(())
}
#[cfg(not(unix))]
fn fsync_dir(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Проверка корректности размера страницы (2^n, 128 B .. 1 MiB).
pub fn validate_page_size(page_size: u32) -> Result<()> {
    if page_size < MIN_PAGE_SIZE || page_size > MAX_PAGE_SIZE || !page_size.is_power_of_two() {
        return Err(RelnError::BadGeometry(format!(
            "page_size must be a power of two in [{} .. {}], got {}",
            MIN_PAGE_SIZE, MAX_PAGE_SIZE, page_size
        ))
        .into());
    }
    Ok(())
}

// ---- Запись/чтение ----

/// Создать новый NAME.info. Ошибка, если уже существует.
pub fn write_meta_new(path: &Path, m: &RelnMeta) -> Result<()> {
    if path.exists() {
        return Err(RelnError::AlreadyExists(path.to_path_buf()).into());
    }
    write_meta_overwrite(path, m)
}

/// Перезаписать NAME.info через tmp+rename.
pub fn write_meta_overwrite(path: &Path, m: &RelnMeta) -> Result<()> {
    m.validate()?;

    let tmp = tmp_path(path);
    let _ = fs::remove_file(&tmp); // best‑effort

    let f = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&tmp)
        .with_context(|| format!("open meta tmp {}", tmp.display()))?;
    let mut w = BufWriter::new(f);
    write_meta_contents(&mut w, m)?;
    let f = w
        .into_inner()
        .map_err(|e| anyhow!("flush meta tmp {}: {}", tmp.display(), e.error()))?;
    f.sync_all()?;

    fs::rename(&tmp, path)
        .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
    let _ = fsync_dir(path);
    Ok(())
}

fn write_meta_contents<W: Write>(w: &mut W, m: &RelnMeta) -> Result<()> {
    w.write_all(META_MAGIC)?;
    w.write_u32::<LittleEndian>(m.version)?;
    w.write_u32::<LittleEndian>(m.page_size)?;
    w.write_u32::<LittleEndian>(m.split_every)?;
    w.write_u32::<LittleEndian>(m.hash_kind.to_u32())?;
    for v in [m.nattrs, m.depth, m.sp, m.npages, m.ntuples, m.free_head] {
        w.write_u32::<LittleEndian>(v)?;
    }
    for it in m.chvec.items() {
        w.write_u32::<LittleEndian>(it.attr)?;
        w.write_u32::<LittleEndian>(it.bit)?;
    }
    Ok(())
}

/// Прочитать и проверить NAME.info.
pub fn read_meta(path: &Path) -> Result<RelnMeta> {
    let f = OpenOptions::new()
        .read(true)
        .open(path)
        .with_context(|| format!("open meta {}", path.display()))?;
    let len = f.metadata()?.len();
    if len != META_SIZE as u64 {
        return Err(anyhow!(
            "corrupt meta {}: size {} (expected {})",
            path.display(),
            len,
            META_SIZE
        ));
    }
    let mut r = BufReader::new(f);

    let mut magic = [0u8; 8];
    r.read_exact(&mut magic)?;
    if &magic != META_MAGIC {
        return Err(anyhow!(
            "bad meta magic at {} (expected {:?}, got {:?})",
            path.display(),
            META_MAGIC,
            magic
        ));
    }

    let version = r.read_u32::<LittleEndian>()?;
    if version != META_VERSION {
        return Err(anyhow!(
            "unsupported meta version {} at {} (expected {})",
            version,
            path.display(),
            META_VERSION
        ));
    }

    let page_size = r.read_u32::<LittleEndian>()?;
    let split_every = r.read_u32::<LittleEndian>()?;
    let hk = r.read_u32::<LittleEndian>()?;
    let hash_kind = HashKind::from_u32(hk)
        .ok_or_else(|| anyhow!("unknown hash kind {} at {}", hk, path.display()))?;

    let mut hdr = [0u32; 6];
    for v in hdr.iter_mut() {
        *v = r.read_u32::<LittleEndian>()?;
    }
    let [nattrs, depth, sp, npages, ntuples, free_head] = hdr;

    let mut items = [ChVecItem::default(); MAX_CHVEC];
    for it in items.iter_mut() {
        it.attr = r.read_u32::<LittleEndian>()?;
        it.bit = r.read_u32::<LittleEndian>()?;
    }
    let chvec = ChoiceVector::from_items(items, nattrs)
        .with_context(|| format!("meta {}", path.display()))?;

    let m = RelnMeta {
        version,
        page_size,
        split_every,
        hash_kind,
        nattrs,
        depth,
        sp,
        npages,
        ntuples,
        free_head,
        chvec,
    };
    m.validate()
        .with_context(|| format!("corrupt meta {}", path.display()))?;
    Ok(m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_v1_roundtrip() {
        let dir = std::env::temp_dir().join(format!("malh-meta-{}", nanos_for_test()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("r.info");

        let cv = ChoiceVector::round_robin(3).unwrap();
        let mut m0 = RelnMeta::new(3, 2, 1024, 34, cv);
        write_meta_new(&path, &m0).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), META_SIZE as u64);
        assert_eq!(read_meta(&path).unwrap(), m0);

        let err = write_meta_new(&path, &m0).unwrap_err();
        assert!(matches!(err.downcast_ref::<RelnError>(), Some(RelnError::AlreadyExists(_))));

        m0.sp = 3;
        m0.npages = 7;
        m0.ntuples = 99;
        m0.free_head = 5;
        write_meta_overwrite(&path, &m0).unwrap();
        assert_eq!(read_meta(&path).unwrap(), m0);
        assert!(!tmp_path(&path).exists());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn rejects_bad_geometry_and_garbage() {
        let dir = std::env::temp_dir().join(format!("malh-meta-bad-{}", nanos_for_test()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("r.info");

        let cv = ChoiceVector::round_robin(2).unwrap();
        let mut m = RelnMeta::new(2, 1, 1000, 10, cv.clone());
        assert!(write_meta_new(&path, &m).is_err()); // not a power of two
        m.page_size = 1024;
        m.npages = 5;
        assert!(write_meta_new(&path, &m).is_err());
        assert!(!path.exists());

        fs::write(&path, vec![0u8; META_SIZE]).unwrap();
        assert!(read_meta(&path).is_err());
        fs::write(&path, b"MALHREL1").unwrap();
        assert!(read_meta(&path).is_err());

        assert!(validate_page_size(128).is_ok());
        assert!(validate_page_size(64).is_err());
        assert!(validate_page_size(MAX_PAGE_SIZE * 2).is_err());
        fs::remove_dir_all(&dir).unwrap();
    }

    fn nanos_for_test() -> u128 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    }
}
