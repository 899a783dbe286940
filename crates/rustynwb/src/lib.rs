//! Typed Neurodata Without Borders (NWB) objects over a hierarchical store.
//!
//! The crate maps NWB schema types onto groups, datasets and attributes of a
//! storage backend implementing [`io::BaseIo`], and coordinates the writer
//! lifecycle: build the file structure, start recording, append samples,
//! stop recording.
//!
//! # Quick start
//!
//! ```
//! use std::sync::Arc;
//! use rustynwb::io::{BaseIo, FileMode, MemoryIo, SharedIo};
//! use rustynwb::nwb::{NwbFile, NwbFileSettings};
//! use rustynwb::nwb::registry::create_typed;
//!
//! let io: SharedIo = Arc::new(MemoryIo::new("session.nwb"));
//! io.open(FileMode::Overwrite).unwrap();
//! let file = create_typed::<NwbFile>("/", &io);
//! file.initialize(&NwbFileSettings::new("abc")).unwrap();
//! assert!(file.is_initialized());
//! io.close().unwrap();
//! ```
//!
//! # Modules
//!
//! - [`io`]: the storage interface, data blocks, selections and the
//!   in-memory backend
//! - [`nwb`]: registered schema types and the type registry
//! - [`spec`]: cached schema namespaces written into every file
//! - [`channel`]: acquisition channel descriptions

pub mod channel;
pub mod config;
pub mod error;
pub mod io;
pub mod nwb;
pub mod spec;
pub mod utils;

pub use channel::Channel;
pub use config::IoConfig;
pub use error::{Error, Result};
