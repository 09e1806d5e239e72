//! Périmap journey cache library
//!
//! Exposes the journey cache, its data model and the search flow so the
//! binary and the integration tests share one implementation.

pub mod cache;
pub mod config;
pub mod journey;
pub mod logging;
pub mod planner;
