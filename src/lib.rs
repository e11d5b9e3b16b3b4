//! Role-gated lifecycle tracking for pharmaceutical supply chain assets.
//!
//! A drug is registered by the manufacturer, shipped hop by hop between
//! organizations, confirmed on receipt, and may be recalled by the regulator
//! at any point. Every transition appends to an immutable audit trail stored
//! inside the record itself.

pub mod clock;
pub mod config;
pub mod drug;
pub mod engine;
pub mod error;
pub mod events;
pub mod history;
pub mod identity;
pub mod policy;
pub mod service;
pub mod store;
pub mod utils;
