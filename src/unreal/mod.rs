//! Engine payload ingestion and export
//!
//! Handles the text-encoded mesh payload exported by the game engine: the
//! relax-and-rewrite path ([`format`]) and the per-tile CSV table export
//! ([`tiles`]).

pub mod format;
pub mod tiles;

pub use format::{is_engine_payload, process};
