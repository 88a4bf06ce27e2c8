//! RXN Orchestrator Library
//!
//! Client for a remote retrosynthesis and robotic-synthesis service:
//! project setup, retrosynthesis prediction, synthesis plans, node action
//! editing, execution and analysis reports.
//! The demo binary is in `src/bin/run_workflow.rs`.

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
/// Caller-side polling cadence and request budget
pub mod polling;
pub mod service;
pub mod tree;
pub mod workflow;

pub use client::RxnClient;
pub use config::Config;
pub use error::ClientError;
pub use service::SynthesisService;
