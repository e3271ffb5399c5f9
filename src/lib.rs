//! Single-file JSON key-value store with write-coalescing persistence.
//!
//! The whole mapping stays in memory; every mutation lands there immediately
//! and a background writer mirrors it to one JSON file. Writes never stack
//! up: while one is in flight, newer states collapse into a single queued
//! snapshot, so bursts cost bounded memory and the file still ends up at the
//! latest state.
//!
//! ```rust,no_run
//! use json_stash::JsonStash;
//! use serde_json::json;
//!
//! let db = JsonStash::open("db.json").unwrap();
//! let receipt = db.insert("hello", json!("world")).unwrap();
//! receipt.wait().unwrap(); // durable on disk from here on
//! ```
//!
//! **Single-process, single-instance only.** Two stores (or two processes)
//! on the same file will clobber each other; there is no file locking. Use a
//! real database for shared access.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod coalesce;
pub mod error;
pub mod persist;
pub mod serializer;
pub mod store;

pub use coalesce::{WriteCoalescer, WriteReceipt};
pub use error::{Error, Result};
pub use store::{JsonStash, JsonStashBuilder};
