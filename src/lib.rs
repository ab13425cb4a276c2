//! Flutterwave Gateway - hardened API client and webhook admission pipeline.
//!
//! The outbound side (`adapters::flutterwave`) authenticates every call,
//! sanitizes endpoints and redacts what it logs. The inbound side
//! (`application::handlers::webhook`) admits gateway callbacks through a
//! staged gate before dispatching them by event.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
