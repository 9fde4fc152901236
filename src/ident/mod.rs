//! Identifiers and secrets
//!
//! UUID prefixes and secret generation shared across packages.

#![allow(dead_code)]

pub mod secret;
pub mod uid;
