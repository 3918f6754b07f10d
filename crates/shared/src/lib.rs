//! Shared utilities and common types for the Calshare backend.
//!
//! This crate provides functionality used across the other crates:
//! - JWT access-token issue and verification
//! - Email normalisation and validation

pub mod jwt;
pub mod validation;
