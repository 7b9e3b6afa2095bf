//! # courier-core
//!
//! Core types, traits, configuration, and error handling for Courier.

pub mod config;
pub mod error;
pub mod message;
pub mod phone;
pub mod traits;
