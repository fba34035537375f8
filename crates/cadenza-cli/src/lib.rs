//! Shared helpers for the Cadenza command-line tools

pub mod output;
