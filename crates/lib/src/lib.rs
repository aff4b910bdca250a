//! bconsole bridge library: allowlisted console commands, director resolution,
//! transcript normalization, and the HTTP gateway exposing them.

pub mod config;
pub mod console;
pub mod gateway;
pub mod init;
pub mod jobs;
