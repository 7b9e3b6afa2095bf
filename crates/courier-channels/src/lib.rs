//! # courier-channels
//!
//! Messaging transport adapters for Courier.

pub mod whatsapp;
