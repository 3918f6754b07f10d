//! Repository implementations of the domain ports.

pub mod invitation;
pub mod notification;
pub mod resource;
pub mod user;

pub use invitation::InvitationRepository;
pub use notification::NotificationRepository;
pub use resource::ResourceRepository;
pub use user::UserRepository;
