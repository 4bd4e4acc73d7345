//! Core data model for watsong.
//!
//! This crate defines the feel vector and the track/album records it
//! attaches to, plus the durable key-value storage that backs the
//! lookup memo (SQLite via [`schema::Database`], or an in-memory fake).

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod model;
pub mod schema;
pub mod storage;

pub use error::{Error, Result};
pub use model::{Album, AlbumDescription, Dial, Feel, Track, DEFAULT_DIAL};
pub use storage::{InMemoryStorage, MemoKind, MemoStorage};
