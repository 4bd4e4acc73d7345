//! Nearest-neighbor track selection for watsong.
//!
//! Ranks annotated tracks by squared Euclidean distance between their feel
//! and a target feel, keeping only the closest `k`.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod select;

pub use error::SelectError;
pub use select::{select, select_scored, Scored, DEFAULT_K};
