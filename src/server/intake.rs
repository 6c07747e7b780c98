use crate::grpc::{ProtoClientAck, ProtoClientErrorCode, ProtoClientUpdate};
use crate::registry::{LocalUpdateError, MemberStore};
use crate::server::convert::{self, ClientUpdate};
use crate::timers::Clock;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tonic::Status;

pub(crate) type AckSender = mpsc::Sender<Result<ProtoClientAck, Status>>;

/// Validates the first message of a client stream. It must be a well formed REGISTER, otherwise
/// the stream is rejected as a whole.
pub(crate) fn accept_first_update(proto: ProtoClientUpdate) -> Result<(u64, String, ClientUpdate), Status> {
    let (seq_id, parsed) = convert::client_update_from_proto(proto);
    match parsed {
        Ok(update @ ClientUpdate::Register { .. }) => Ok((seq_id, update.client_id().to_string(), update)),
        Ok(_) => Err(Status::invalid_argument("First message must be a REGISTER")),
        Err(e) => Err(Status::invalid_argument(e.to_string())),
    }
}

pub(crate) fn ack(seq_id: u64, result: &Result<(), LocalUpdateError>) -> ProtoClientAck {
    match result {
        Ok(()) => ProtoClientAck {
            seq_id,
            error: ProtoClientErrorCode::NoError as i32,
            message: String::new(),
        },
        Err(e) => ProtoClientAck {
            seq_id,
            error: convert::ack_error_code(e) as i32,
            message: e.to_string(),
        },
    }
}

/// Processes one client's update stream after its first REGISTER was accepted. Every message is
/// acked. The session ends on UNREGISTER, when the client goes away, or on shutdown.
pub(crate) struct ClientSession<C: Clock> {
    logger: slog::Logger,
    store: Arc<MemberStore>,
    clock: C,
    client_id: String,
    acks: AckSender,
    cancel: CancellationToken,
}

impl<C: Clock> ClientSession<C> {
    pub(crate) fn new(
        logger: slog::Logger,
        store: Arc<MemberStore>,
        clock: C,
        client_id: String,
        acks: AckSender,
        cancel: CancellationToken,
    ) -> Self {
        ClientSession {
            logger: logger.new(slog::o!("ClientId" => client_id.clone())),
            store,
            clock,
            client_id,
            acks,
            cancel,
        }
    }

    /// Applies `update` and acks it. Returns false when the session is over.
    pub(crate) async fn process(&mut self, seq_id: u64, update: Result<ClientUpdate, LocalUpdateError>) -> bool {
        let now = self.clock.now_ms();
        let (result, done) = match update {
            Ok(update) => self.apply(update, now),
            Err(e) => (Err(e), false),
        };

        if let Err(e) = &result {
            slog::info!(self.logger, "Update {} failed: {}", seq_id, e);
        }
        if self.acks.send(Ok(ack(seq_id, &result))).await.is_err() {
            slog::debug!(self.logger, "Client dropped its ack stream");
            return false;
        }

        !done
    }

    fn apply(&self, update: ClientUpdate, now: i64) -> (Result<(), LocalUpdateError>, bool) {
        if update.client_id() != self.client_id {
            let e = LocalUpdateError::InvalidUpdate(format!(
                "client id {:?} doesn't match the stream's {:?}",
                update.client_id(),
                self.client_id
            ));
            return (Err(e), false);
        }

        match update {
            ClientUpdate::Register { client_id, state } => {
                (self.store.register(&client_id, state, now).map(|_| ()), false)
            }
            ClientUpdate::Heartbeat { client_id, state } => (self.store.heartbeat(&client_id, state, now), false),
            ClientUpdate::ClientHeartbeat { client_id } => (self.store.heartbeat_client(&client_id, now), false),
            ClientUpdate::UpdateMetadata {
                client_id,
                member_id,
                patch,
            } => (
                self.store.update_metadata(&client_id, &member_id, patch, now).map(|_| ()),
                false,
            ),
            ClientUpdate::Unregister { client_id } => {
                slog::info!(self.logger, "Client unregistered");
                (self.store.unregister_client(&client_id, now).map(|_| ()), true)
            }
        }
    }

    pub(crate) async fn run<S>(mut self, mut inbound: S)
    where
        S: Stream<Item = Result<ProtoClientUpdate, Status>> + Unpin + Send,
    {
        loop {
            let message = tokio::select! {
                _ = self.cancel.cancelled() => return,
                message = inbound.next() => message,
            };

            let rpc_request = match message {
                Some(Ok(rpc_request)) => rpc_request,
                Some(Err(status)) => {
                    slog::info!(self.logger, "Client stream failed: {}", status);
                    return;
                }
                None => {
                    // Members go DOWN once heartbeats stop.
                    slog::info!(self.logger, "Client stream closed without unregistering");
                    return;
                }
            };
            slog::debug!(self.logger, "ServerWire - {:?}", rpc_request);

            let (seq_id, update) = convert::client_update_from_proto(rpc_request);
            if !self.process(seq_id, update).await {
                return;
            }
        }
    }
}
