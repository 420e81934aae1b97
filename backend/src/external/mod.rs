//! Ports to external collaborators
//!
//! The core never talks to mail gateways or key stores directly; it
//! calls these traits, and deployments plug in concrete adapters.

pub mod encryption;
pub mod notification;

pub use encryption::{Base64Codec, EncryptionPort};
pub use notification::{dispatch, LoggingNotifier, NotificationError, NotificationPort, TemplateKind};
