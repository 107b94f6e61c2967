//! # GraphQL Schema Module
//!
//! GraphQL type system for the fleet API.

pub mod objects;

pub use objects::*;
