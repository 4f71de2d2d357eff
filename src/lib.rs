//! SailSim client core
//!
//! Mirrors the server's entities from the tagged message stream, decays wake
//! trails on server ticks, keeps the camera on the controlled boat and turns
//! key/wheel input into control commands. Drawing and the socket itself are
//! left to the `render::Renderer` and `ws::transport::OutboundTransport`
//! implementations plugged in by the host.

pub mod app;
pub mod config;
pub mod game;
pub mod render;
pub mod util;
pub mod ws;
