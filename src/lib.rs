pub mod abundance;
pub mod analyzer;
pub mod blast;
pub mod config;
pub mod domain;
pub mod error;
pub mod extract;
pub mod filter;
pub mod genomes;
mod http;
pub mod output;
pub mod taxonomy;
