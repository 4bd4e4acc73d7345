pub mod album;
pub mod feel;
pub mod track;

pub use album::{Album, AlbumDescription};
pub use feel::{Dial, Feel, DEFAULT_DIAL};
pub use track::Track;
