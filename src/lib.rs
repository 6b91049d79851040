//! EVE Industry Production Planner
//!
//! Computes the purchase list, manufacturing/reaction jobs and production
//! time needed to build a set of end products.

pub mod calculator;
pub mod catalog;
pub mod category;
pub mod config;
pub mod db;
pub mod demand;
pub mod error;
pub mod expander;
pub mod extract;
pub mod logging;
pub mod materials;
pub mod models;
pub mod scheduler;
pub mod splitter;

pub use calculator::Planner;
pub use catalog::Catalog;
pub use category::{Category, SlotPool};
pub use config::{Blacklist, PlanConfig, PlanRequest};
pub use models::{JobDescriptor, JobRequest, ProductionPlan};
