// src/lib.rs — Library root for wkcache

pub mod api;
pub mod cache;
pub mod cli;
pub mod client;
pub mod collection;
pub mod deferred;
pub mod infra;
pub mod render;
