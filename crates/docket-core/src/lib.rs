//! Core types, the store trait, and the incident resolution workflow for
//! Docket.
//!
//! This crate has no HTTP or database dependencies. The
//! workflow engine ([`Workflow`]) is stateless: every operation re-reads the
//! facts it needs from an [`store::IncidentStore`] and derives the current
//! status from them.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod catalog;
pub mod error;
pub mod group;
pub mod linkage;
pub mod sanction;
pub mod statement;
pub mod status;
pub mod store;
pub mod workflow;

mod coordinator;
mod correction;
mod validate;

pub use error::{Error, ErrorKind, Result};
pub use workflow::Workflow;
