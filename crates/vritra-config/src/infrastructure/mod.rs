//! File system side of the settings subsystem: the cross-process lock and
//! the storage primitives (layout, atomic writes, backup).

pub mod lock;
pub mod storage;
