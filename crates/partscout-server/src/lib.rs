//! LINE webhook server: signature check, event parsing and background replies.

pub mod config;
pub mod dto;
pub mod error;
pub mod routes;
pub mod signature;
pub mod state;
