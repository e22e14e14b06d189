//! State module for tracking crawl workers
//!
//! # Components
//!
//! - `WorkerState`: where each worker is in its fetch cycle

mod worker_state;

pub use worker_state::WorkerState;
