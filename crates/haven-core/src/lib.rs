//! Core types and trait definitions for the Haven safety backend.
//!
//! This crate is deliberately free of HTTP, database and transport
//! dependencies. Every other crate depends on it.

pub mod alert;
pub mod contact;
pub mod error;
pub mod location;
pub mod store;
pub mod user;

pub use error::{Error, Result};
