//! Domain layer for the Calshare backend.
//!
//! This crate contains:
//! - Domain models (Invitation, Subject, Participant, Notification, Resource)
//! - The ports the invitation core consumes (repositories, stores, sinks)
//! - The invitation lifecycle service and the participant view builder
//! - Domain error types

pub mod error;
pub mod models;
pub mod services;

pub use error::{DomainError, StoreError};
