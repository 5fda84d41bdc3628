//! HID backend worker
//!
//! Owns all device I/O: enumeration, per-path asynchronous read listeners,
//! and write-then-read command dispatch. Runs on a dedicated blocking
//! thread and is reachable only through the channel boundary defined in
//! the session crate.

pub mod worker;

pub use worker::{HidWorkerThread, WorkerConfig, spawn_worker};
