#![allow(non_snake_case)]

// Форматы и базовые утилиты
pub mod consts;
pub mod error;
pub mod hash;
pub mod util;   // src/util/mod.rs — битовые операции

// Кортежи и choice vector
pub mod chvec;
pub mod tuple;

// Страницы и файлы страниц
pub mod page;   // src/page/{mod,header}.rs
pub mod pager;  // src/pager/{mod,core,io}.rs
pub mod free;   // src/free/mod.rs — free-лист overflow-страниц

// Отношение
pub mod config;
pub mod lock;
pub mod meta;
pub mod metrics;
pub mod query;
pub mod reln;   // src/reln/{mod,core,open,builder,chain,insert,split,stats,check}.rs

// CLI (используется бинарником malhdb)
pub mod cli;

// Удобные реэкспорты
pub use chvec::{ChVecItem, ChoiceVector};
pub use config::RelnConfig;
pub use error::{PageFull, RelnError};
pub use query::Query;
pub use reln::{CheckReport, OpenMode, Relation, RelnBuilder, RelnStats};
pub use tuple::Tuple;
