use crate::grpc::ProtoMember;
use crate::registry::{Delivery, KnownVersions, MemberStore, VersionedMember};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tonic::Status;

/// Opens a subscription on the store and returns the stream of members to send to the subscriber:
/// the catch-up members first, then every live update.
///
/// Live updates go through a bounded queue. If the subscriber can't keep up the store drops the
/// subscription, and the stream ends with `RESOURCE_EXHAUSTED` so the subscriber reconnects and
/// catches up.
pub(crate) fn spawn_subscription(
    logger: slog::Logger,
    store: &Arc<MemberStore>,
    known: &KnownVersions,
    owner_only: bool,
    queue_size: usize,
    cancel: CancellationToken,
) -> ReceiverStream<Result<ProtoMember, Status>> {
    let (queue_tx, queue_rx) = mpsc::channel(queue_size);
    let subscription = store.subscribe(
        known,
        owner_only,
        Box::new(move |member: &VersionedMember| match queue_tx.try_send(member.clone()) {
            Ok(()) => Delivery::Delivered,
            Err(TrySendError::Full(_)) | Err(TrySendError::Closed(_)) => Delivery::Lagging,
        }),
    );
    slog::debug!(logger, "Subscribed with {} catch-up members", subscription.catch_up.len());

    let (out_tx, out_rx) = mpsc::channel(queue_size);
    tokio::task::spawn(async move {
        // Unsubscribes when this task exits.
        let _handle = subscription.handle;

        for member in subscription.catch_up {
            if out_tx.send(Ok(ProtoMember::from(member))).await.is_err() {
                return;
            }
        }

        let mut queue_rx = queue_rx;
        loop {
            let update = tokio::select! {
                _ = cancel.cancelled() => return,
                _ = out_tx.closed() => {
                    slog::debug!(logger, "Subscriber went away");
                    return;
                }
                update = queue_rx.recv() => update,
            };

            let item = match update {
                Some(member) => Ok(ProtoMember::from(member)),
                None => {
                    slog::warn!(logger, "Subscriber is lagging, closing its stream");
                    Err(Status::resource_exhausted("Subscriber lagging, resubscribe to catch up"))
                }
            };
            let is_end = item.is_err();
            if out_tx.send(item).await.is_err() || is_end {
                return;
            }
        }
    });

    ReceiverStream::new(out_rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::test_utils::{member_state, new_store, test_logger};
    use crate::registry::{ReplicaId, Version};
    use tokio::time::Duration;
    use tokio_stream::StreamExt;

    async fn next_id(stream: &mut ReceiverStream<Result<ProtoMember, Status>>) -> String {
        let member = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("Unexpected timeout")
            .expect("Stream ended")
            .expect("Stream failed");
        member.state.map(|s| s.id).unwrap_or_default()
    }

    #[tokio::test]
    async fn catch_up_then_live_updates() {
        let store = Arc::new(new_store("local"));
        store.register("c1", member_state("a"), 100).unwrap();
        let mut known = KnownVersions::new();
        known.insert("gone".into(), Version::new(ReplicaId::new("local"), 10, 0));

        let mut stream = spawn_subscription(test_logger(), &store, &known, false, 8, CancellationToken::new());
        store.register("c1", member_state("b"), 200).unwrap();

        assert_eq!(next_id(&mut stream).await, "a");
        assert_eq!(next_id(&mut stream).await, "gone");
        assert_eq!(next_id(&mut stream).await, "local");
        assert_eq!(next_id(&mut stream).await, "b");
    }

    #[tokio::test]
    async fn lagging_subscriber_stream_ends() {
        let store = Arc::new(new_store("local"));
        let mut stream = spawn_subscription(
            test_logger(),
            &store,
            &KnownVersions::new(),
            false,
            1,
            CancellationToken::new(),
        );
        assert_eq!(next_id(&mut stream).await, "local");

        // Nobody reads, so the queue fills up.
        for i in 0..10 {
            store.register("c1", member_state(&format!("m-{}", i)), 100 + i).unwrap();
        }
        assert_eq!(store.subscriber_count(), 0);

        let mut last = None;
        while let Some(item) = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("Unexpected timeout")
        {
            last = Some(item);
        }
        let status = last.unwrap().unwrap_err();
        assert_eq!(status.code(), tonic::Code::ResourceExhausted);
    }

    #[tokio::test]
    async fn dropped_stream_unsubscribes() {
        let store = Arc::new(new_store("local"));
        let stream = spawn_subscription(
            test_logger(),
            &store,
            &KnownVersions::new(),
            false,
            8,
            CancellationToken::new(),
        );
        assert_eq!(store.subscriber_count(), 1);

        drop(stream);

        tokio::time::timeout(Duration::from_secs(5), async {
            while store.subscriber_count() > 0 {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("Unexpected timeout");
    }
}
