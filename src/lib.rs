//! Client-side viewer for a swarm security audit.
//!
//! Resolves the swarm's nodes from the audit server, polls each node until
//! its results are in, fetches and aggregates them, and classifies every node
//! as passing, failing or undetermined.

pub mod client;
pub mod config;
pub mod dashboard;
pub mod domain;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod poller;
pub mod swarm;
pub mod token;
pub mod transport;

pub use client::AuditClient;
pub use error::{Result, WatchError};
pub use swarm::{NodeEvent, Swarm, SwarmOptions};
pub use transport::AuditApi;
