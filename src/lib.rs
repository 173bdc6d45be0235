//! Ratefetch Core Library
//!
//! This library provides the core functionality for the ratefetch tool,
//! which downloads a list of URLs from rate-limited servers sequentially,
//! respecting server-declared limits and retrying transient failures with
//! exponential backoff.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`download`] - retry engine, rate-limit signal parsing, HTTP transport
//! - [`mapper`] - URL to local path mapping with prefix stripping
//! - [`input`] - URL list reading and filtering
//! - [`run`] - sequential batch runner and per-outcome statistics

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;
pub mod input;
pub mod mapper;
pub mod run;
pub mod util;

// Re-export commonly used types
pub use download::{
    CancelFlag, DownloadTarget, EngineConfig, FailureKind, FetchError, HttpTransport, Outcome,
    RateLimitSignal, RawResponse, ResetValue, RetryEngine, Transport, WaitSource, classify_status,
    compute_wait,
};
pub use input::{InputFilter, read_urls};
pub use mapper::{PathMapper, ResolvedPath};
pub use run::{Runner, RunStats};
