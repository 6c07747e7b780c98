use std::convert::TryFrom;
use tokio::time::Duration;

#[derive(Clone, Default)]
pub struct RegistryOptions {
    /// A member owned by this replica goes DOWN after not heartbeating for this long.
    pub heartbeat_timeout: Option<Duration>,
    /// A DOWN member goes LEFT after this long.
    pub reconnect_timeout: Option<Duration>,
    /// A LEFT member is removed after this long.
    pub tombstone_timeout: Option<Duration>,
    pub liveness_check_interval: Option<Duration>,
    pub anti_entropy_interval: Option<Duration>,
    pub digest_size: Option<usize>,
    pub subscriber_queue_size: Option<usize>,
    pub forwarder_queue_size: Option<usize>,
    pub forwarder_initial_backoff: Option<Duration>,
    pub forwarder_max_backoff: Option<Duration>,
    pub rpc_timeout: Option<Duration>,
}

pub(super) struct RegistryOptionsValidated {
    pub heartbeat_timeout: Duration,
    pub reconnect_timeout: Duration,
    pub tombstone_timeout: Duration,
    pub liveness_check_interval: Duration,
    pub anti_entropy_interval: Duration,
    pub digest_size: usize,
    pub subscriber_queue_size: usize,
    pub forwarder_queue_size: usize,
    pub forwarder_initial_backoff: Duration,
    pub forwarder_max_backoff: Duration,
    pub rpc_timeout: Duration,
}

impl RegistryOptionsValidated {
    fn validate(&self) -> Result<(), &'static str> {
        if self.heartbeat_timeout.as_millis() == 0 {
            return Err("Heartbeat timeout must be non-zero");
        }
        if self.liveness_check_interval.as_millis() == 0 {
            return Err("Liveness check interval must be non-zero");
        }
        if self.liveness_check_interval >= self.heartbeat_timeout {
            return Err("Liveness check interval must be less than the heartbeat timeout");
        }
        if self.anti_entropy_interval.as_millis() == 0 {
            return Err("Anti-entropy interval must be non-zero");
        }
        if self.digest_size == 0 {
            return Err("Digest size must be greater than 0");
        }
        if self.subscriber_queue_size == 0 || self.forwarder_queue_size == 0 {
            return Err("Queue sizes must be greater than 0");
        }
        if self.forwarder_initial_backoff.as_millis() == 0 {
            return Err("Forwarder initial backoff must be non-zero");
        }
        if self.forwarder_initial_backoff > self.forwarder_max_backoff {
            return Err("Forwarder initial backoff must not exceed the max backoff");
        }

        Ok(())
    }
}

impl TryFrom<RegistryOptions> for RegistryOptionsValidated {
    type Error = &'static str;

    fn try_from(options: RegistryOptions) -> Result<Self, Self::Error> {
        let heartbeat_timeout = options.heartbeat_timeout.unwrap_or(Duration::from_secs(20));
        let values = RegistryOptionsValidated {
            heartbeat_timeout,
            reconnect_timeout: options.reconnect_timeout.unwrap_or(Duration::from_secs(5 * 60)),
            tombstone_timeout: options.tombstone_timeout.unwrap_or(Duration::from_secs(30 * 60)),
            liveness_check_interval: options.liveness_check_interval.unwrap_or(heartbeat_timeout / 4),
            anti_entropy_interval: options.anti_entropy_interval.unwrap_or(Duration::from_secs(10)),
            digest_size: options.digest_size.unwrap_or(50),
            subscriber_queue_size: options.subscriber_queue_size.unwrap_or(1024),
            forwarder_queue_size: options.forwarder_queue_size.unwrap_or(1024),
            forwarder_initial_backoff: options
                .forwarder_initial_backoff
                .unwrap_or(Duration::from_millis(100)),
            forwarder_max_backoff: options.forwarder_max_backoff.unwrap_or(Duration::from_secs(5)),
            rpc_timeout: options.rpc_timeout.unwrap_or(Duration::from_secs(3)),
        };

        values.validate()?;
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = RegistryOptionsValidated::try_from(RegistryOptions::default()).unwrap();

        assert_eq!(options.heartbeat_timeout, Duration::from_secs(20));
        assert_eq!(options.reconnect_timeout, Duration::from_secs(300));
        assert_eq!(options.tombstone_timeout, Duration::from_secs(1800));
        assert_eq!(options.liveness_check_interval, Duration::from_secs(5));
        assert_eq!(options.anti_entropy_interval, Duration::from_secs(10));
        assert_eq!(options.digest_size, 50);
        assert_eq!(options.subscriber_queue_size, 1024);
        assert_eq!(options.forwarder_queue_size, 1024);
        assert_eq!(options.forwarder_max_backoff, Duration::from_secs(5));
        assert_eq!(options.rpc_timeout, Duration::from_secs(3));
    }

    #[test]
    fn liveness_interval_follows_heartbeat_timeout() {
        let options = RegistryOptionsValidated::try_from(RegistryOptions {
            heartbeat_timeout: Some(Duration::from_millis(400)),
            ..RegistryOptions::default()
        })
        .unwrap();

        assert_eq!(options.liveness_check_interval, Duration::from_millis(100));
    }

    #[test]
    fn invalid_options() {
        let invalid = vec![
            RegistryOptions {
                liveness_check_interval: Some(Duration::from_secs(30)),
                ..RegistryOptions::default()
            },
            RegistryOptions {
                digest_size: Some(0),
                ..RegistryOptions::default()
            },
            RegistryOptions {
                subscriber_queue_size: Some(0),
                ..RegistryOptions::default()
            },
            RegistryOptions {
                forwarder_initial_backoff: Some(Duration::from_secs(10)),
                ..RegistryOptions::default()
            },
            RegistryOptions {
                heartbeat_timeout: Some(Duration::from_millis(0)),
                ..RegistryOptions::default()
            },
        ];

        for options in invalid {
            assert!(RegistryOptionsValidated::try_from(options).is_err());
        }
    }
}
