//! Threshold evaluation and the notification log it feeds.
//!
//! Submodules:
//! - `thresholds`: pure edge-triggered crossing detection.
//! - `notifications`: the newest-first alert log.

pub mod notifications;
pub mod thresholds;
