//! reln — менеджер отношения (linear hashing поверх трёх файлов).
//!
//! Разделение по подмодулям:
//! - core.rs    — Relation, OpenMode, пути файлов, адресация, close/Drop
//! - open.rs    — create/open (+ _with_config), блокировки
//! - builder.rs — RelnBuilder (параметры create + конфиг)
//! - chain.rs   — цепочки страниц бакета: обход, привязка, unlink+release
//! - insert.rs  — вставка кортежа (split перед вставкой по порогу)
//! - split.rs   — расщепление бакета sp
//! - stats.rs   — RelnStats (текст/JSON)
//! - check.rs   — проверка инвариантов, CheckReport

pub mod builder;
pub mod chain;
pub mod check;
pub mod core;
pub mod insert;
pub mod open;
pub mod split;
pub mod stats;

pub use self::builder::RelnBuilder;
pub use self::chain::PageLoc;
pub use self::check::CheckReport;
pub use self::core::{OpenMode, Relation, RelnPaths};
pub use self::stats::{BucketStats, PageStats, RelnStats};
