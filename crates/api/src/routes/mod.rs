//! Route handlers.

pub mod health;
pub mod invitations;
pub mod notifications;
pub mod participants;
