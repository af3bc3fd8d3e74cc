//! Multi-cluster Kubernetes aggregation for Spinnaker.
//!
//! Each read fans out over every account that may hold an application,
//! rebuilds ownership and traffic relations between the listed objects, and
//! renders deterministically ordered entity views.

cfg_if::cfg_if! {
    if #[cfg(feature = "telemetry")] {
        pub use clouddriver_telemetry as log;
    } else {
        pub mod log;
    }
}

pub mod aggregator;
pub mod annotations;
pub mod builders;
pub mod client;
pub mod collector;
pub mod config;
pub mod document;
pub mod error;
pub mod kinds;
pub mod model;
pub mod resolver;
pub mod resource;
pub mod sort;

#[cfg(test)]
mod testing;

pub use aggregator::Aggregator;
pub use config::Config;
pub use error::{Error, Result};
