//! # Clipshelf Store
//!
//! In-memory implementation of the clipshelf backing-store trait.
//!
//! [`MemoryStore`] keeps one record list per resource behind a
//! [`parking_lot::RwLock`] and hands out deep copies, so callers can
//! mutate what they receive without corrupting stored state. Ids come
//! from a process-scoped counter and are never reused within a process
//! lifetime.
//!
//! The store is constructed once at startup and injected as
//! `Arc<dyn ResourceStore>`; there is no global singleton.
//!
//! ## Example
//!
//! ```
//! use clipshelf_core::{record_id, ResourceStore};
//! use clipshelf_store::MemoryStore;
//! use serde_json::json;
//!
//! let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! rt.block_on(async {
//!     let store = MemoryStore::new();
//!     let record = json!({"title": "T"}).as_object().unwrap().clone();
//!     let id = store.insert("videos", record).await.unwrap();
//!     let found = store.find_by_id("videos", id).await.unwrap().unwrap();
//!     assert_eq!(record_id(&found), Some(id));
//! });
//! ```

#![doc(html_root_url = "https://docs.rs/clipshelf-store/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod memory;

pub use memory::MemoryStore;
