//! # Algorithms Module
//!
//! Feed total computation and catch-up planning.

pub mod catch_up;
pub mod feed_totals;

pub use catch_up::{apply_catch_up, plan_catch_up, CatchUpPlan};
pub use feed_totals::{module_feed_total, task_feed_total};
