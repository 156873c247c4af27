use crate::config::Config;
use crate::error::Result;
use crate::telemetry::device_state_cache::DeviceStateCache;
use crate::telemetry::state_update::StateUpdate;
use crate::telemetry::update_feed::UpdateFeed;
use crate::yolink_api::YoLinkApiTrait;
use crate::yolink_api::models::device_state::state_from_slice;
use chrono::Utc;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

const TOPIC_PREFIX: &str = "yl-home";
const REPORT_EVENT: &str = "report";

/// Wildcard subscription covering every device report of one home.
pub fn report_topic(home_id: &str) -> String {
    format!("{}/{}/+/{}", TOPIC_PREFIX, home_id, REPORT_EVENT)
}

/// `yl-home/{homeId}/{deviceId}/report` -> `deviceId`. Anything but four segments is rejected.
pub fn device_id_from_topic(topic: &str) -> Option<&str> {
    let parts: Vec<&str> = topic.split('/').collect();
    match parts.as_slice() {
        [_, _, device_id, _] if !device_id.is_empty() => Some(*device_id),
        _ => None,
    }
}

/// Queues the report subscription without waiting on the event loop that is calling us.
pub fn subscribe(client: &AsyncClient, topic: &str) -> Result<()> {
    client.try_subscribe(topic, QoS::AtMostOnce)?;
    Ok(())
}

/// Feeds broker reports into the device state cache and the update feed.
#[derive(Clone)]
pub struct TelemetrySubscriber {
    states: DeviceStateCache,
    feed: UpdateFeed,
    broker_host: String,
    broker_port: u16,
    keep_alive: Duration,
    reconnect_delay: Duration,
    queue_size: usize,
}

impl TelemetrySubscriber {
    pub fn new(config: &Config, states: DeviceStateCache, feed: UpdateFeed) -> Self {
        Self {
            states,
            feed,
            broker_host: config.yolink.broker_host.clone(),
            broker_port: config.yolink.broker_port,
            keep_alive: Duration::from_secs(config.intervals.mqtt_keep_alive_seconds),
            reconnect_delay: Duration::from_secs(config.intervals.reconnect_delay_seconds),
            queue_size: config.limits.mqtt_queue_size,
        }
    }

    /// Applies one broker message. Returns the update that was cached and published, or
    /// `None` when the message was dropped.
    pub fn handle_message(&self, topic: &str, payload: &[u8]) -> Option<StateUpdate> {
        trace!("Received MQTT message on topic: {}", topic);

        let Some(device_id) = device_id_from_topic(topic) else {
            warn!("Could not extract device ID from topic: {}", topic);
            return None;
        };

        let state = match state_from_slice(payload) {
            Ok(state) => state,
            Err(e) => {
                warn!(
                    "Could not parse state payload for device {}: {}. Body was: \"{}\"",
                    device_id,
                    e,
                    String::from_utf8_lossy(payload)
                );
                return None;
            }
        };

        self.states.insert(device_id, state.clone());
        debug!("Updated state for device {}", device_id);

        let update = StateUpdate {
            device_id: device_id.to_string(),
            state,
        };
        self.feed.publish(update.clone());
        Some(update)
    }

    /// Keeps the subscription alive for the life of the process. Startup failures (no
    /// credentials, vendor down) are retried after the reconnect delay.
    pub async fn run<T>(self, api: T)
    where
        T: YoLinkApiTrait + Send + Sync,
    {
        loop {
            match self.connect(&api).await {
                Ok((client, event_loop, topic)) => {
                    self.drive(&api, client, event_loop, topic).await;
                }
                Err(e) => {
                    error!("Telemetry subscriber failed to start: {}", e);
                    tokio::time::sleep(self.reconnect_delay).await;
                }
            }
        }
    }

    async fn connect<T>(&self, api: &T) -> Result<(AsyncClient, EventLoop, String)>
    where
        T: YoLinkApiTrait + Send + Sync,
    {
        let access_token = api.access_token().await?;
        let home_id = api.get_home_id().await?;

        let client_id = format!("yolink-bridge-{}", Utc::now().timestamp());
        info!(
            "Connecting to YoLink MQTT broker at {}:{} as {} for home {}",
            self.broker_host, self.broker_port, client_id, home_id
        );

        // The broker identifies us by the access token alone.
        let mut options = MqttOptions::new(client_id, &self.broker_host, self.broker_port);
        options.set_clean_session(true);
        options.set_credentials(access_token, "");
        options.set_keep_alive(self.keep_alive);

        let (client, event_loop) = AsyncClient::new(options, self.queue_size);
        Ok((client, event_loop, report_topic(&home_id)))
    }

    async fn drive<T>(&self, api: &T, client: AsyncClient, mut event_loop: EventLoop, topic: String)
    where
        T: YoLinkApiTrait + Send + Sync,
    {
        loop {
            match event_loop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    info!("Successfully connected to MQTT broker ({:?})", ack.code);
                    // Clean sessions forget subscriptions, so every connect subscribes again.
                    match subscribe(&client, &topic) {
                        Ok(()) => info!("Subscribing to topic: {}", topic),
                        Err(e) => error!("Failed to subscribe to topic {}: {}", topic, e),
                    }
                }
                Ok(Event::Incoming(Packet::SubAck(ack))) => {
                    info!("Subscription acknowledged: {:?}", ack.return_codes);
                }
                Ok(Event::Incoming(Packet::Publish(p))) => {
                    self.handle_message(&p.topic, &p.payload);
                }
                Ok(e) => {
                    trace!("{:?}", e);
                }
                Err(e) => {
                    warn!("Connection to MQTT broker lost: {:?}", e);
                    // The next poll reconnects; make sure it presents a live token.
                    match api.access_token().await {
                        Ok(token) => {
                            event_loop.mqtt_options.set_credentials(token, "");
                        }
                        Err(e) => error!("Unable to refresh broker credentials: {}", e),
                    }
                    tokio::time::sleep(self.reconnect_delay).await;
                }
            }
        }
    }
}
