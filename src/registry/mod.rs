mod anti_entropy;
mod failure_detector;
mod member;
mod registry_api;
mod store;
mod subscribers;

pub use member::Liveness;
pub use member::Locality;
pub use member::MemberState;
pub use member::ReplicaId;
pub use member::Version;
pub use member::VersionTimestamp;
pub use member::VersionedMember;
pub use registry_api::DeltaOutcome;
pub use registry_api::Delivery;
pub use registry_api::Digest;
pub use registry_api::KnownVersions;
pub use registry_api::LocalUpdateError;
pub use registry_api::RemoteUpdateError;
pub use registry_api::UpdateCallback;
pub(crate) use registry_api::LivenessTimeouts;
pub(crate) use registry_api::StoreConfig;
pub use store::MemberStore;
pub use subscribers::Subscription;
pub use subscribers::SubscriptionHandle;

#[cfg(test)]
pub(crate) use store::test_utils;
