mod client;
mod dev;
mod takt_url;

pub mod domain;
pub mod dto;

pub(crate) use takt_url::*;

pub use client::*;
