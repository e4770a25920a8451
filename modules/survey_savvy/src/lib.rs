//! Survey Savvy module: accounts and roles, surveys with votes, comments and
//! reports, payment intents and payment records.
//!
//! Layout follows the DDD-light split used across the workspace:
//! `contract` holds transport-agnostic models, `domain` the services and
//! ports, `infra` the SeaORM and payment-provider adapters, `api::rest` the
//! HTTP surface. `module` wires them together.

pub mod api;
pub mod config;
pub mod contract;
pub mod domain;
pub mod infra;
pub mod module;

pub use config::SurveySavvyConfig;
pub use module::SurveySavvy;
