//! pager — постраничный ввод/вывод файлов отношения.
//!
//! Подмодули:
//! - core.rs — структура PageFile, create/open, геометрия.
//! - io.rs   — read_page/write_page/append_page/sync.
//!
//! A relation owns two page files (`.data` for main buckets, `.ovflow` for
//! overflow chains and free pages) with identical page layout.

pub mod core;
pub mod io;

pub use self::core::{PageFile, PageKind};
