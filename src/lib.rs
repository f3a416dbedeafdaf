//! Core library for the `tlsload` CLI.
//!
//! This crate provides the building blocks used by the binary: CLI argument
//! types, configuration parsing, TLS cipher-suite policy, HTTP transports,
//! virtual-user scheduling, and metrics aggregation. The primary interface
//! is the `tlsload` command-line application.
pub mod args;
pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod runner;
pub mod shutdown;
pub mod target;
pub mod tls;
