//! TechShack Core - Shared types library.
//!
//! This crate provides the types used across the point-of-sale workspace:
//! - `client` - Cart and table controllers plus the backend collaborator
//! - `cli` - Terminal front-end for the register and user administration
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. The optional
//! `postgres` feature adds the row mapping for the backend's `sale` table
//! (see `migrations/`).
//!
//! # Modules
//!
//! - [`types`] - Typed ids, decimal prices, catalog, user and sale records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
