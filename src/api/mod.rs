//! The library's public API: wiring a replica together, the handle to a running replica, and the
//! application side client.
mod client;
mod options;
mod registry;
mod wiring;

pub use client::ClientError;
pub use client::MemberStream;
pub use client::RegisterSession;
pub use client::RegistryClient;
pub use client::RejectionCode;
pub use options::RegistryOptions;
pub use registry::Registry;
pub use wiring::try_create_registry;
pub use wiring::RegistryConfig;
pub use wiring::RegistryCreationError;
