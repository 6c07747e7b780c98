use crate::grpc::grpc_registry_server::{GrpcRegistry, GrpcRegistryServer};
use crate::grpc::grpc_replica_server::{GrpcReplica, GrpcReplicaServer};
use crate::grpc::{
    ProtoClientAck, ProtoClientUpdate, ProtoDigestRequest, ProtoDigestResponse, ProtoMember, ProtoMemberRequest,
    ProtoMemberResponse, ProtoMembersRequest, ProtoMembersResponse, ProtoSubscribeRequest, ProtoUpdateRequest,
    ProtoUpdateResponse,
};
use crate::registry::{MemberStore, VersionedMember};
use crate::server::convert;
use crate::server::intake::{self, ClientSession};
use crate::server::subscription;
use crate::timers::{Clock, RealClock};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::convert::TryFrom;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_stream::wrappers::{ReceiverStream, TcpListenerStream};
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;
use tonic::{Request, Response, Status, Streaming};

/// RpcServer implements both the client facing `GrpcRegistry` service and the replica to replica
/// `GrpcReplica` service on top of the local `MemberStore`.
#[derive(Clone)]
pub(crate) struct RpcServer<C: Clock = RealClock> {
    logger: slog::Logger,
    store: Arc<MemberStore>,
    clock: C,
    subscriber_queue_size: usize,
    cancel: CancellationToken,
}

impl RpcServer {
    pub(crate) fn new(
        logger: slog::Logger,
        store: Arc<MemberStore>,
        subscriber_queue_size: usize,
        cancel: CancellationToken,
    ) -> Self {
        RpcServer {
            logger,
            store,
            clock: RealClock,
            subscriber_queue_size,
            cancel,
        }
    }
}

impl<C: Clock> RpcServer<C> {
    pub(crate) async fn run(self, listener: TcpListener) {
        let logger = self.logger.clone();
        let cancel = self.cancel.clone();
        slog::info!(logger, "Listening on '{:?}'", listener.local_addr());

        let result = Server::builder()
            .add_service(GrpcRegistryServer::new(self.clone()))
            .add_service(GrpcReplicaServer::new(self))
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), cancel.cancelled())
            .await;

        slog::info!(logger, "Server run() has exited: {:?}", result);
    }

    async fn handle_register(
        &self,
        mut inbound: Streaming<ProtoClientUpdate>,
    ) -> Result<ReceiverStream<Result<ProtoClientAck, Status>>, Status> {
        let first = match inbound.message().await? {
            Some(first) => first,
            None => return Err(Status::invalid_argument("Stream closed before REGISTER")),
        };
        slog::debug!(self.logger, "ServerWire - {:?}", first);
        let (seq_id, client_id, update) = intake::accept_first_update(first)?;

        let (acks_tx, acks_rx) = mpsc::channel(16);
        let mut session = ClientSession::new(
            self.logger.clone(),
            self.store.clone(),
            self.clock.clone(),
            client_id,
            acks_tx,
            self.cancel.child_token(),
        );
        if session.process(seq_id, Ok(update)).await {
            tokio::task::spawn(session.run(inbound));
        }

        Ok(ReceiverStream::new(acks_rx))
    }

    fn handle_subscribe(
        &self,
        rpc_request: ProtoSubscribeRequest,
    ) -> Result<ReceiverStream<Result<ProtoMember, Status>>, Status> {
        let known = convert::known_versions_from_proto(rpc_request.known_members)?;

        Ok(subscription::spawn_subscription(
            self.logger.clone(),
            &self.store,
            &known,
            rpc_request.owner_only,
            self.subscriber_queue_size,
            self.cancel.child_token(),
        ))
    }

    fn handle_member(&self, rpc_request: ProtoMemberRequest) -> Result<ProtoMemberResponse, Status> {
        match self.store.lookup(&rpc_request.id) {
            Some(member) => Ok(ProtoMemberResponse {
                member: Some(member.into()),
            }),
            None => Err(Status::not_found(format!("Member {:?} not found", rpc_request.id))),
        }
    }

    fn handle_members(&self, _rpc_request: ProtoMembersRequest) -> ProtoMembersResponse {
        ProtoMembersResponse {
            members: self.store.list().into_iter().map(ProtoMember::from).collect(),
        }
    }

    fn handle_update(&self, rpc_request: ProtoUpdateRequest) -> Result<ProtoUpdateResponse, Status> {
        let proto_member = rpc_request
            .member
            .ok_or_else(|| Status::invalid_argument("Missing member"))?;
        let member = VersionedMember::try_from(proto_member)?;

        self.store
            .apply_remote(member)
            .map_err(convert::remote_update_error_to_status)?;

        Ok(ProtoUpdateResponse {
            // Empty
        })
    }

    fn handle_digest(&self, rpc_request: ProtoDigestRequest) -> ProtoDigestResponse {
        let digest = convert::digest_from_proto(rpc_request.entries);
        let delta = self.store.handle_digest(&digest, &mut StdRng::from_entropy());

        ProtoDigestResponse {
            delta: delta.into_iter().map(ProtoMember::from).collect(),
        }
    }
}

#[async_trait::async_trait]
impl<C: Clock> GrpcRegistry for RpcServer<C> {
    type RegisterStream = ReceiverStream<Result<ProtoClientAck, Status>>;

    async fn register(
        &self,
        rpc_request_wrapped: Request<Streaming<ProtoClientUpdate>>,
    ) -> Result<Response<Self::RegisterStream>, Status> {
        let rpc_result = self.handle_register(rpc_request_wrapped.into_inner()).await;
        if let Err(status) = &rpc_result {
            slog::debug!(self.logger, "ServerWire - {:?}", status);
        }

        rpc_result.map(Response::new)
    }

    type SubscribeStream = ReceiverStream<Result<ProtoMember, Status>>;

    async fn subscribe(
        &self,
        rpc_request_wrapped: Request<ProtoSubscribeRequest>,
    ) -> Result<Response<Self::SubscribeStream>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - {:?}", rpc_request);
        self.handle_subscribe(rpc_request).map(Response::new)
    }

    async fn member(
        &self,
        rpc_request_wrapped: Request<ProtoMemberRequest>,
    ) -> Result<Response<ProtoMemberResponse>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - {:?}", rpc_request);
        let rpc_result = self.handle_member(rpc_request);
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_result);

        rpc_result.map(Response::new)
    }

    async fn members(
        &self,
        rpc_request_wrapped: Request<ProtoMembersRequest>,
    ) -> Result<Response<ProtoMembersResponse>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - {:?}", rpc_request);
        let rpc_reply = self.handle_members(rpc_request);
        slog::debug!(self.logger, "ServerWire - {} members", rpc_reply.members.len());

        Ok(Response::new(rpc_reply))
    }
}

#[async_trait::async_trait]
impl<C: Clock> GrpcReplica for RpcServer<C> {
    async fn update(
        &self,
        rpc_request_wrapped: Request<ProtoUpdateRequest>,
    ) -> Result<Response<ProtoUpdateResponse>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - {:?}", rpc_request);
        let rpc_result = self.handle_update(rpc_request);
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_result);

        rpc_result.map(Response::new)
    }

    async fn digest(
        &self,
        rpc_request_wrapped: Request<ProtoDigestRequest>,
    ) -> Result<Response<ProtoDigestResponse>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(
            self.logger,
            "ServerWire - Digest from {:?} with {} entries",
            rpc_request.source_node_id,
            rpc_request.entries.len()
        );
        let rpc_reply = self.handle_digest(rpc_request);
        slog::debug!(self.logger, "ServerWire - Delta with {} members", rpc_reply.delta.len());

        Ok(Response::new(rpc_reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grpc::ProtoVersion;
    use crate::registry::test_utils::{member_state, new_store, remote_member, test_logger};
    use crate::registry::{Liveness, ReplicaId, Version};
    use crate::timers::{mocked_clock, MockClock};
    use std::collections::HashMap;
    use tokio_stream::StreamExt;

    fn server() -> RpcServer<MockClock> {
        let (clock, _controller) = mocked_clock();
        RpcServer {
            logger: test_logger(),
            store: Arc::new(new_store("local")),
            clock,
            subscriber_queue_size: 8,
            cancel: CancellationToken::new(),
        }
    }

    #[test]
    fn member_lookup() {
        let server = server();
        server.store.register("c1", member_state("m"), 100).unwrap();

        let reply = server
            .handle_member(ProtoMemberRequest { id: "m".to_string() })
            .unwrap();
        let member = VersionedMember::try_from(reply.member.unwrap()).unwrap();
        assert_eq!(Some(member), server.store.lookup("m"));

        let status = server
            .handle_member(ProtoMemberRequest {
                id: "unknown".to_string(),
            })
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::NotFound);

        let reply = server.handle_members(ProtoMembersRequest {});
        assert_eq!(reply.members.len(), 2);
    }

    #[test]
    fn update_maps_rejections_to_failed_precondition() {
        let server = server();

        let ok = server.handle_update(ProtoUpdateRequest {
            member: Some(remote_member("m", "peer", 100, 0).into()),
            source_node_id: "peer".to_string(),
        });
        assert!(ok.is_ok());
        assert_eq!(server.store.lookup("m"), Some(remote_member("m", "peer", 100, 0)));

        let outdated = server
            .handle_update(ProtoUpdateRequest {
                member: Some(remote_member("m", "peer", 50, 0).into()),
                source_node_id: "peer".to_string(),
            })
            .unwrap_err();
        assert_eq!(outdated.code(), tonic::Code::FailedPrecondition);

        let overwrite_self = server
            .handle_update(ProtoUpdateRequest {
                member: Some(remote_member("local", "peer", 5_000, 0).into()),
                source_node_id: "peer".to_string(),
            })
            .unwrap_err();
        assert_eq!(overwrite_self.code(), tonic::Code::FailedPrecondition);

        let missing = server
            .handle_update(ProtoUpdateRequest {
                member: None,
                source_node_id: "peer".to_string(),
            })
            .unwrap_err();
        assert_eq!(missing.code(), tonic::Code::InvalidArgument);
    }

    #[test]
    fn digest_returns_newer_members() {
        let server = server();
        server.store.apply_remote(remote_member("m", "peer", 100, 0)).unwrap();
        let mut entries = HashMap::new();
        entries.insert("m".to_string(), crate::grpc::ProtoVersionTimestamp { timestamp: 50, counter: 0 });
        entries.insert("local".to_string(), crate::grpc::ProtoVersionTimestamp { timestamp: 0, counter: 0 });

        let reply = server.handle_digest(ProtoDigestRequest {
            entries,
            source_node_id: "peer".to_string(),
        });

        let mut ids: Vec<String> = reply.delta.into_iter().map(|m| m.state.unwrap().id).collect();
        ids.sort();
        assert_eq!(ids, vec!["m".to_string()]);
    }

    #[tokio::test]
    async fn subscribe_streams_catch_up() {
        let server = server();
        server.store.apply_remote(remote_member("m", "peer", 100, 0)).unwrap();
        let mut known_members = HashMap::new();
        known_members.insert(
            "m".to_string(),
            ProtoVersion::from(Version::new(ReplicaId::new("peer"), 100, 0)),
        );

        let mut stream = server
            .handle_subscribe(ProtoSubscribeRequest {
                known_members,
                owner_only: false,
            })
            .unwrap();

        let first = VersionedMember::try_from(stream.next().await.unwrap().unwrap()).unwrap();
        assert_eq!(first.id(), "local");
        assert_eq!(first.liveness, Liveness::Up);
    }

    #[test]
    fn subscribe_rejects_malformed_versions() {
        let server = server();
        let mut known_members = HashMap::new();
        known_members.insert(
            "m".to_string(),
            ProtoVersion {
                owner_id: "peer".to_string(),
                timestamp: None,
            },
        );

        let status = server
            .handle_subscribe(ProtoSubscribeRequest {
                known_members,
                owner_only: false,
            })
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
    }
}
