//! Operator tooling for a metro fleet backend.
//!
//! The roster flows (load, edit, save, model assignment, unassign) live in
//! [`reconcile`] on top of the pure [`roster`] store. Every backend call goes
//! through the [`api::FleetApi`] trait; [`api::HttpFleetApi`] is the reqwest
//! implementation. Intake flows ([`add_train`], [`ingest`]) and read-only
//! views ([`stabling`], [`reports`]) share the same error and config types.

pub mod add_train;
pub mod api;
pub mod config;
pub mod error;
pub mod ingest;
pub mod model;
pub mod notice;
pub mod reconcile;
pub mod render;
pub mod reports;
pub mod roster;
pub mod stabling;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::{FleetApi, HttpFleetApi};
pub use config::FleetConfig;
pub use error::{ErrorCode, FleetError};
pub use model::{Train, TrainStatus};
pub use reconcile::Reconciler;
