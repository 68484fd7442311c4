//! RabbitMQ 发布服务 - 业务能力层
//!
//! 日志和通知以 JSON 发布到同一个交换机，用不同的 routing key 区分。
//! 连接在第一次发布时建立，出错后丢弃，下次发布重新连接；不做重试。

use async_trait::async_trait;
use lapin::{
    options::{BasicPublishOptions, ExchangeDeclareOptions},
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind,
};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::ActivityError;
use crate::models::{LogEntry, Notification};
use crate::services::ActivitySink;

/// 持久化消息
const PERSISTENT_DELIVERY_MODE: u8 = 2;

struct Session {
    // 连接需要和 channel 一起存活
    _connection: Connection,
    channel: Channel,
}

/// RabbitMQ 发布服务
pub struct AmqpPublisher {
    uri: String,
    exchange: String,
    exchange_kind: ExchangeKind,
    log_routing_key: String,
    notif_routing_key: String,
    session: Mutex<Option<Session>>,
}

impl AmqpPublisher {
    pub fn new(config: &Config) -> Self {
        Self {
            uri: config.amqp_uri(),
            exchange: config.exchange_name.clone(),
            exchange_kind: exchange_kind(&config.exchange_type),
            log_routing_key: config.log_routing_key.clone(),
            notif_routing_key: config.notif_routing_key.clone(),
            session: Mutex::new(None),
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// 取可用的 channel，没有就新建连接并声明交换机
    async fn channel(&self) -> Result<Channel, ActivityError> {
        let mut session = self.session.lock().await;

        if let Some(current) = session.as_ref() {
            if current.channel.status().connected() {
                return Ok(current.channel.clone());
            }
            warn!("RabbitMQ channel 已断开，重新连接");
        }

        let connection = Connection::connect(&self.uri, ConnectionProperties::default()).await?;
        let channel = connection.create_channel().await?;
        channel
            .exchange_declare(
                &self.exchange,
                self.exchange_kind.clone(),
                ExchangeDeclareOptions {
                    durable: true,
                    ..ExchangeDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await?;

        info!("✓ 已连接 RabbitMQ: {} (exchange: {})", self.uri, self.exchange);

        *session = Some(Session {
            _connection: connection,
            channel: channel.clone(),
        });
        Ok(channel)
    }

    /// 以 JSON 发布一条持久化消息
    ///
    /// # 参数
    /// - `routing_key`: 日志或通知的 routing key
    /// - `message`: 消息内容
    async fn publish<T: Serialize>(
        &self,
        routing_key: &str,
        message: &T,
    ) -> Result<(), ActivityError> {
        let payload = serde_json::to_vec(message)?;

        let result = async {
            let channel = self.channel().await?;
            channel
                .basic_publish(
                    &self.exchange,
                    routing_key,
                    BasicPublishOptions::default(),
                    &payload,
                    BasicProperties::default()
                        .with_content_type("application/json".into())
                        .with_delivery_mode(PERSISTENT_DELIVERY_MODE),
                )
                .await?
                .await?;
            Ok::<(), ActivityError>(())
        }
        .await;

        match result {
            Ok(()) => {
                debug!(
                    "消息已发布到交换机 '{}' (routing key: '{}')",
                    self.exchange, routing_key
                );
                Ok(())
            }
            Err(e) => {
                *self.session.lock().await = None;
                Err(e)
            }
        }
    }
}

#[async_trait]
impl ActivitySink for AmqpPublisher {
    async fn send_log(&self, entry: &LogEntry) -> Result<(), ActivityError> {
        info!(
            target: "activity",
            sub_group_id = %entry.sub_group_id,
            user_id = entry.user_id.as_deref().unwrap_or("-"),
            action = %entry.action,
            routing_key = %self.log_routing_key,
            "{}",
            entry.message
        );
        self.publish(&self.log_routing_key, entry).await
    }

    async fn send_notification(&self, notification: &Notification) -> Result<(), ActivityError> {
        info!(
            target: "activity",
            email = %notification.email,
            subject = %notification.subject,
            routing_key = %self.notif_routing_key,
            "发送通知"
        );
        self.publish(&self.notif_routing_key, notification).await
    }
}

/// 交换机类型，未知名称按自定义类型声明
fn exchange_kind(name: &str) -> ExchangeKind {
    match name.trim().to_ascii_lowercase().as_str() {
        "direct" => ExchangeKind::Direct,
        "fanout" => ExchangeKind::Fanout,
        "headers" => ExchangeKind::Headers,
        "topic" | "" => ExchangeKind::Topic,
        _ => ExchangeKind::Custom(name.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_config() -> Config {
        Config {
            rabbitmq_host: "127.0.0.1".into(),
            rabbitmq_port: 1,
            exchange_name: "activity".into(),
            log_routing_key: "log".into(),
            notif_routing_key: "notif".into(),
            ..Config::default()
        }
    }

    #[test]
    fn test_exchange_kind_from_config() {
        assert!(matches!(exchange_kind("topic"), ExchangeKind::Topic));
        assert!(matches!(exchange_kind("Direct"), ExchangeKind::Direct));
        assert!(matches!(exchange_kind("fanout"), ExchangeKind::Fanout));
        assert!(matches!(exchange_kind(""), ExchangeKind::Topic));
        assert!(matches!(
            exchange_kind("x-delayed-message"),
            ExchangeKind::Custom(name) if name == "x-delayed-message"
        ));
    }

    #[test]
    fn test_uri_from_config() {
        let publisher = AmqpPublisher::new(&unreachable_config());
        assert_eq!(publisher.uri(), "amqp://127.0.0.1:1");
    }

    #[tokio::test]
    async fn test_unreachable_broker_is_an_error() {
        let publisher = AmqpPublisher::new(&unreachable_config());

        let err = tokio_test::assert_err!(
            publisher
                .send_log(&LogEntry::generate_ideas("G1", Some("U7")))
                .await
        );
        assert!(matches!(err, ActivityError::Broker(_)), "got {err:?}");

        let err = tokio_test::assert_err!(
            publisher
                .send_notification(&Notification::ideas_generated("a@example.com"))
                .await
        );
        assert!(matches!(err, ActivityError::Broker(_)), "got {err:?}");
    }

    /// 需要本地 RabbitMQ（RABBITMQ_HOST 等环境变量）
    #[tokio::test]
    #[ignore]
    async fn test_live_publish() {
        let config = Config::from_env().unwrap();
        let publisher = AmqpPublisher::new(&config);

        tokio_test::assert_ok!(
            publisher
                .send_log(&LogEntry::generate_ideas("1", Some("1")))
                .await
        );
    }
}
