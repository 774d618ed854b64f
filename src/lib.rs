//! PropBazaar - Property Marketplace Billing Backend
//!
//! This crate implements the subscription billing core: pricing, payment
//! gateway integration, idempotent payment reconciliation, and subscription
//! activation.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
