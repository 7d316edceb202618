//! Batch Upload Module
//!
//! Implements the resumable batch-upload protocol:
//! - sessions track which sequence numbers are still expected
//! - batches arrive independently and in any order, each fingerprinted at
//!   ingest
//! - finish re-validates every fingerprint, merges the batches in sequence
//!   order and returns a Success/Failed verdict
//!
//! Protocol flow:
//! 1. Client opens a session declaring the total record count
//! 2. Client uploads `ceil(total / BATCH_SIZE)` batches, retrying freely
//! 3. Finish either reports the missing sequence numbers or performs the
//!    merge and retires the session

pub mod digest;
pub mod registry;
pub mod service;
pub mod types;

pub use registry::SessionRegistry;
pub use service::{FinishOutcome, UploadService};
pub use types::*;
