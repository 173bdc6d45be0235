//! Rate-limit-aware HTTP retrieval.
//!
//! This module contains the retry engine and its collaborators:
//!
//! - [`RetryEngine`] drives one URL through the fetch/evaluate/wait cycle
//! - [`RateLimitSignal`] normalizes heterogeneous rate-limit headers
//! - [`Transport`] abstracts the HTTP GET so the engine is testable
//!
//! # Example
//!
//! ```no_run
//! use ratefetch_core::download::{
//!     CancelFlag, DownloadTarget, EngineConfig, HttpTransport, RetryEngine,
//! };
//!
//! # async fn example() {
//! let engine = RetryEngine::new(EngineConfig::with_max_attempts(5));
//! let transport = HttpTransport::new();
//! let target = DownloadTarget::new("https://example.com/data/file.csv", "data/file.csv");
//! let outcome = engine.fetch(&target, &transport, &CancelFlag::new()).await;
//! println!("{outcome:?}");
//! # }
//! ```

pub mod constants;
mod engine;
mod error;
pub mod rate_limit;
mod retry;
mod transport;

pub use engine::{CancelFlag, DownloadTarget, EngineConfig, Outcome, RetryEngine};
pub use error::FetchError;
pub use rate_limit::{RateLimitSignal, ResetValue, parse_retry_after};
pub use retry::{FailureKind, WaitSource, classify_status, compute_wait};
pub use transport::{HttpTransport, RawResponse, Transport};
