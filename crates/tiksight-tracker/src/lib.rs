//! Import-job tracking and progress reconciliation.
//!
//! This crate provides:
//! - The [`JobTracker`]: register submitted jobs, poll their status on a
//!   fixed cadence, merge updates, and retire finished jobs
//! - The [`ProgressSource`] and [`VideoLibrary`] seams the tracker polls
//!   and notifies, implemented for the backend API client

pub mod config;
pub mod source;
pub mod tracker;

pub use config::TrackerConfig;
pub use source::{ProgressSource, VideoLibrary};
pub use tracker::JobTracker;
