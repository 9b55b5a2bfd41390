//! Mozart Client Library Crate
//!
//! Configuration, the terminal front-end and its event loop, and (with the
//! `livekit` feature) the WebRTC transport and audio devices. The `mozart`
//! binary is a thin wrapper around this library.

pub mod app;
pub mod config;
#[cfg(feature = "livekit")]
pub mod livekit;
pub mod terminal;
