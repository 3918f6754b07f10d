//! Domain services and the ports they depend on.

pub mod invitation;
pub mod memory;
pub mod participants;
pub mod ports;

pub use invitation::{InvitationService, TransitionOutcome};
pub use memory::{
    InMemoryInvitationRepository, InMemoryNotificationStore, InMemoryResourceStore,
    InMemoryUserDirectory,
};
pub use participants::ParticipantViewBuilder;
pub use ports::{
    InvitationRepository, NotificationFeed, NotificationSink, ResourceStore, UserDirectory,
};
