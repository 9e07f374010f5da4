//! Queue publisher backed by RabbitMQ (AMQP 0-9-1).

use async_trait::async_trait;
use lapin::options::{BasicPublishOptions, QueueDeclareOptions};
use lapin::types::{FieldTable, ShortString};
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};

use super::QueuePublisher;
use crate::error::{Error, Result};
use crate::model::{ConnectionState, QueuePayload};

/// AMQP delivery mode for messages that survive a broker restart.
const PERSISTENT: u8 = 2;

/// Publishes to one durable queue through the default exchange.
///
/// lapin channels are safe to share; concurrent publishes go through the
/// same channel.
pub struct AmqpPublisher {
    connection: Connection,
    channel: Channel,
    queue: String,
}

impl AmqpPublisher {
    /// Connect, open a channel and declare the durable queue.
    ///
    /// The declare doubles as the liveness check for bootstrap.
    pub async fn connect(uri: &str, queue: &str) -> Result<Self> {
        let connection = Connection::connect(uri, ConnectionProperties::default()).await?;
        let channel = connection.create_channel().await?;
        channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await?;
        Ok(Self {
            connection,
            channel,
            queue: queue.to_string(),
        })
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }
}

#[async_trait]
impl QueuePublisher for AmqpPublisher {
    async fn enqueue(&self, payload: &QueuePayload) -> Result<()> {
        let properties = BasicProperties::default()
            .with_content_type(ShortString::from(payload.content_type.to_string()))
            .with_delivery_mode(PERSISTENT);

        let confirm = self
            .channel
            .basic_publish(
                "",
                &self.queue,
                BasicPublishOptions::default(),
                &payload.body,
                properties,
            )
            .await?;

        // Without publisher confirms enabled this resolves to NotRequested.
        if confirm.await?.is_nack() {
            return Err(Error::PublishRejected(format!(
                "broker nacked message for queue {}",
                self.queue
            )));
        }
        Ok(())
    }

    fn connection_state(&self) -> ConnectionState {
        let status = self.connection.status();
        if status.connected() {
            ConnectionState::Ready
        } else if status.errored() {
            ConnectionState::Failed
        } else {
            ConnectionState::Disconnected
        }
    }
}
