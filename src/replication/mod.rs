mod anti_entropy_task;
mod forwarder;
mod peer_client;
mod peers;
mod replication_api;

pub(crate) use anti_entropy_task::AntiEntropyTimer;
pub(crate) use forwarder::ForwarderConfig;
pub(crate) use peer_client::GrpcPeerConnector;
pub use peer_client::ConnectError;
pub(crate) use peers::PeerTracker;
pub use replication_api::PeerInfo;
pub(crate) use replication_api::PeerConnector;
pub(crate) use replication_api::PeerTransport;

#[cfg(test)]
pub(crate) mod test_utils;
