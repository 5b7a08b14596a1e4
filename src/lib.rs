pub mod audio;
pub mod common;
pub mod config;
pub mod protocol;
pub mod room;
pub mod server;
pub mod transport;
pub mod ws;
