//! Message Bus
//!
//! Thin wrapper around a pooled AMQP connection: durable queue
//! declaration, JSON publish with the persistent delivery mode, and a
//! bounded-prefetch consumer stream that hands each delivery's ack/nack
//! decision back to the caller (§5, §7 — acks happen in the worker's
//! guaranteed-exit block, not here).

mod messages;

pub use messages::*;

use deadpool_lapin::{Config as PoolConfig, Pool, Runtime};
use futures_util::StreamExt;
use lapin::{
    options::{BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicPublishOptions,
              BasicQosOptions, QueueDeclareOptions},
    types::FieldTable,
    BasicProperties,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use crate::infrastructure::config::MessageBusConfig;
use crate::infrastructure::error::PipelineError;

/// A delivery received from a queue, carrying the decoded payload and the
/// means to acknowledge it.
pub struct Delivery<T> {
    pub payload: T,
    inner: lapin::message::Delivery,
}

impl<T> Delivery<T> {
    pub async fn ack(self) -> Result<(), PipelineError> {
        self.inner
            .ack(BasicAckOptions::default())
            .await
            .map_err(PipelineError::from)
    }

    /// Nacks without requeue: the poison-message path (§7).
    pub async fn nack_no_requeue(self) -> Result<(), PipelineError> {
        self.inner
            .nack(BasicNackOptions {
                requeue: false,
                ..Default::default()
            })
            .await
            .map_err(PipelineError::from)
    }
}

/// Pooled connection to the message bus, with durable declaration for
/// the three named queues and bounded prefetch.
#[derive(Clone)]
pub struct MessageBus {
    pool: Pool,
    prefetch_count: u16,
}

impl MessageBus {
    pub async fn connect(config: &MessageBusConfig) -> Result<Self, PipelineError> {
        let addr = format!("amqp://{}", config.host);
        let mut pool_config = PoolConfig::default();
        pool_config.url = Some(addr);
        let pool = pool_config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| PipelineError::Transient(e.into()))?;

        let bus = Self {
            pool,
            prefetch_count: config.prefetch_count,
        };

        for queue in [
            &config.frames_queue,
            &config.detections_queue,
            &config.recognitions_queue,
        ] {
            bus.declare_queue(queue).await?;
        }

        Ok(bus)
    }

    async fn channel(&self) -> Result<lapin::Channel, PipelineError> {
        let conn = self
            .pool
            .get()
            .await
            .map_err(|e| PipelineError::Transient(anyhow::anyhow!(e.to_string())))?;
        conn.create_channel()
            .await
            .map_err(PipelineError::from)
    }

    async fn declare_queue(&self, name: &str) -> Result<(), PipelineError> {
        let channel = self.channel().await?;
        channel
            .queue_declare(
                name,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(PipelineError::from)?;
        Ok(())
    }

    /// Publishes `payload` as persistent JSON onto `queue`.
    pub async fn publish<T: Serialize>(&self, queue: &str, payload: &T) -> Result<(), PipelineError> {
        let body = serde_json::to_vec(payload)?;
        let channel = self.channel().await?;
        channel
            .basic_publish(
                "",
                queue,
                BasicPublishOptions::default(),
                &body,
                BasicProperties::default().with_delivery_mode(2),
            )
            .await
            .map_err(PipelineError::from)?
            .await
            .map_err(PipelineError::from)?;
        Ok(())
    }

    /// Opens a bounded-prefetch consumer over `queue`, yielding one
    /// decoded `Delivery<T>` per message. A message that fails to
    /// deserialize is nacked without requeue immediately and skipped.
    pub async fn consume<T>(
        &self,
        queue: &str,
        consumer_tag: &str,
    ) -> Result<impl futures_util::Stream<Item = Delivery<T>>, PipelineError>
    where
        T: DeserializeOwned,
    {
        let channel = self.channel().await?;
        channel
            .basic_qos(self.prefetch_count, BasicQosOptions::default())
            .await
            .map_err(PipelineError::from)?;

        let consumer = channel
            .basic_consume(
                queue,
                consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(PipelineError::from)?;

        let stream = consumer.filter_map(|delivery| async move {
            let delivery = match delivery {
                Ok(d) => d,
                Err(e) => {
                    warn!(error = %e, "failed to receive delivery");
                    return None;
                }
            };

            match serde_json::from_slice::<T>(&delivery.data) {
                Ok(payload) => Some(Delivery {
                    payload,
                    inner: delivery,
                }),
                Err(e) => {
                    warn!(error = %e, "poison message: could not decode payload");
                    let _ = delivery.nack(BasicNackOptions {
                        requeue: false,
                        ..Default::default()
                    }).await;
                    None
                }
            }
        });

        Ok(stream)
    }
}
