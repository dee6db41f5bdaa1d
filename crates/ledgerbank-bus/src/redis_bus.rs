//! Redis Streams implementation of the event bus.
//!
//! Each topic maps to a stream key; consumers join a consumer group and
//! acknowledge processed entries with XACK, giving at-least-once delivery
//! with per-stream ordering.

use async_trait::async_trait;
use redis::streams::{StreamReadOptions, StreamReadReply};
use redis::{AsyncCommands, Client, aio::MultiplexedConnection};

use ledgerbank_core::bus::{DeliveredEvent, EventBus, EventSubscription};
use ledgerbank_core::error::DomainError;
use ledgerbank_core::repository::StoredEvent;

const BLOCK_MILLIS: usize = 5_000;

fn infrastructure(err: redis::RedisError) -> DomainError {
    DomainError::Infrastructure(err.to_string())
}

/// Redis-backed event bus.
#[derive(Clone)]
pub struct RedisBus {
    client: Client,
}

impl RedisBus {
    /// Creates a bus for the Redis instance at `redis_url`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Infrastructure`] when the URL is invalid.
    pub fn connect(redis_url: &str) -> Result<Self, DomainError> {
        let client = Client::open(redis_url).map_err(infrastructure)?;
        Ok(Self { client })
    }

    /// Joins `group` as `consumer` on the given topics, creating the group
    /// (and its streams) when missing.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Infrastructure`] when the connection or group
    /// creation fails.
    pub async fn subscribe(
        &self,
        group: &str,
        consumer: &str,
        topics: Vec<String>,
    ) -> Result<RedisSubscription, DomainError> {
        let mut connection = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(infrastructure)?;

        for topic in &topics {
            let created: Result<String, redis::RedisError> = connection
                .xgroup_create_mkstream(topic, group, "0")
                .await;
            if let Err(err) = created {
                // The group surviving a previous run is fine.
                if err.code() != Some("BUSYGROUP") {
                    return Err(infrastructure(err));
                }
            }
        }

        Ok(RedisSubscription {
            connection,
            group: group.to_owned(),
            consumer: consumer.to_owned(),
            topics,
        })
    }
}

#[async_trait]
impl EventBus for RedisBus {
    async fn publish(&self, topic: &str, event: &StoredEvent) -> Result<(), DomainError> {
        let publish_failed = |reason: String| DomainError::PublishFailed {
            topic: topic.to_owned(),
            reason,
        };

        let mut connection = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|err| publish_failed(err.to_string()))?;

        let payload =
            serde_json::to_string(event).map_err(|err| publish_failed(err.to_string()))?;

        let _: String = connection
            .xadd(topic, "*", &[("event", payload.as_str())])
            .await
            .map_err(|err| publish_failed(err.to_string()))?;

        Ok(())
    }
}

/// Consumer-group subscription over a set of Redis streams.
pub struct RedisSubscription {
    connection: MultiplexedConnection,
    group: String,
    consumer: String,
    topics: Vec<String>,
}

#[async_trait]
impl EventSubscription for RedisSubscription {
    async fn next(&mut self) -> Result<Option<DeliveredEvent>, DomainError> {
        loop {
            let options = StreamReadOptions::default()
                .group(&self.group, &self.consumer)
                .count(1)
                .block(BLOCK_MILLIS);
            let ids: Vec<&str> = self.topics.iter().map(|_| ">").collect();

            let reply: StreamReadReply = self
                .connection
                .xread_options(&self.topics, &ids, &options)
                .await
                .map_err(infrastructure)?;

            for stream in reply.keys {
                if let Some(entry) = stream.ids.into_iter().next() {
                    let payload: String = entry.get("event").ok_or_else(|| {
                        DomainError::Infrastructure(format!(
                            "stream entry {} on {} is missing the event field",
                            entry.id, stream.key
                        ))
                    })?;
                    let event: StoredEvent = serde_json::from_str(&payload)
                        .map_err(|err| DomainError::Infrastructure(err.to_string()))?;
                    return Ok(Some(DeliveredEvent {
                        topic: stream.key,
                        event,
                        delivery_tag: entry.id,
                    }));
                }
            }
            // Block timed out with nothing to deliver; poll again.
        }
    }

    async fn ack(&mut self, delivery: &DeliveredEvent) -> Result<(), DomainError> {
        let _: i64 = self
            .connection
            .xack(&delivery.topic, &self.group, &[&delivery.delivery_tag])
            .await
            .map_err(infrastructure)?;
        Ok(())
    }
}
