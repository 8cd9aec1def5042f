//! # Graph Module
//!
//! Chart series for the dashboard. User graphs keep a sliding time window;
//! built-in subsystem charts keep a fixed number of recent samples. Every
//! series carries its [`RetentionPolicy`] explicitly.

pub mod series;
pub mod store;

pub use series::{GraphSample, RetentionPolicy, Series};
pub use store::{GraphConfig, GraphStore};
