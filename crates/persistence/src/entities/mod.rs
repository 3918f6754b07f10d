//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod event;
pub mod invitation;
pub mod notification;
pub mod task;
pub mod user;

pub use event::EventEntity;
pub use invitation::{InvitationEntity, InvitationStatusDb};
pub use notification::NotificationEntity;
pub use task::{TaskEntity, TaskPriorityDb, TaskStatusDb};
pub use user::UserEntity;
