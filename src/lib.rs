//! Geo-aware failover egress resolver for delegated browser-automation tasks.
//!
//! A resolution tries the managed home-country proxy first, then walks an
//! ordered list of fallback candidates (explicit URL, router hostname,
//! discovery directory), validating each candidate's observed egress country
//! before handing it to the automation session provider. The first candidate
//! whose session succeeds wins; exhaustion is reported with one recorded
//! reason per candidate.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
