//! Domain models for Calshare.

pub mod invitation;
pub mod notification;
pub mod participant;
pub mod resource;
pub mod user;

pub use invitation::{Decision, Invitation, InvitationStatus, NewInvitation, Subject, SubjectKind};
pub use notification::{NewNotification, Notification, NotificationType};
pub use participant::{Participant, ParticipantRole};
pub use resource::{EventFields, Resource, ResourceFields, TaskFields, TaskPriority, TaskStatus};
pub use user::{Identity, UserProfile};
