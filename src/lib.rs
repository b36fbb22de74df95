//! Short aliases for URLs with ranked exact, fuzzy and vector search.

pub mod aliases;
pub mod cli;
pub mod config;
pub mod keywords;
pub mod search;
pub mod stats;
pub mod storage;

#[cfg(test)]
mod tests;
