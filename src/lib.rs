mod api;
mod registry;
mod replication;
mod server;
mod timers;
mod grpc {
    include!("../generated/registry.rs");
}

pub use api::try_create_registry;
pub use api::ClientError;
pub use api::MemberStream;
pub use api::RegisterSession;
pub use api::Registry;
pub use api::RegistryClient;
pub use api::RegistryConfig;
pub use api::RegistryCreationError;
pub use api::RegistryOptions;
pub use api::RejectionCode;
pub use registry::Delivery;
pub use registry::KnownVersions;
pub use registry::Liveness;
pub use registry::Locality;
pub use registry::MemberState;
pub use registry::ReplicaId;
pub use registry::Subscription;
pub use registry::SubscriptionHandle;
pub use registry::UpdateCallback;
pub use registry::Version;
pub use registry::VersionTimestamp;
pub use registry::VersionedMember;
pub use replication::ConnectError;
pub use replication::PeerInfo;
pub use server::ProtoConvertError;

// `crate::{root_mod}` holds no code, only `mod` and `pub use` statements. No `mod` is `pub`;
// everything public is exported through an individual `pub use`.
