pub mod app;
pub mod compact;
pub mod config;
pub mod description;
pub mod domain;
pub mod error;
pub mod export;
pub mod fetcher;
pub mod figshare;
pub mod fs_util;
pub mod output;
pub mod poscar;
pub mod record;
pub mod store;
pub mod structure;
