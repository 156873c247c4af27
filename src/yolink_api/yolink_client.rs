use crate::config::YoLinkConfig;
use crate::error::{Error, Result};
use crate::yolink_api::models::device::Device;
use crate::yolink_api::models::device_state::DeviceState;
use crate::yolink_api::models::request::api_request::{ApiRequest, GET_DEVICE_LIST, GET_GENERAL_INFO};
use crate::yolink_api::models::response::device_list_response::DeviceListData;
use crate::yolink_api::models::response::envelope::Envelope;
use crate::yolink_api::models::response::general_info_response::GeneralInfoData;
use crate::yolink_api::token_cache::TokenCache;
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct YoLinkClient {
    client: reqwest::Client,
    api_url: String,
    tokens: TokenCache,
}

impl YoLinkClient {
    pub fn new(config: &YoLinkConfig, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: reqwest::Client, config: &YoLinkConfig) -> Self {
        Self {
            tokens: TokenCache::new(client.clone(), config),
            client,
            api_url: config.api_url.clone(),
        }
    }

    pub fn tokens(&self) -> &TokenCache {
        &self.tokens
    }

    async fn bearer(&self) -> Result<String> {
        match self.tokens.get_token().await {
            Ok(credential) => Ok(credential.access_token),
            Err(Error::Auth(message)) => Err(Error::Auth(format!("token exchange: {}", message))),
            Err(e) => Err(e),
        }
    }

    /// Posts one request and returns the decoded envelope. A vendor 401 drops the cached
    /// credential before the envelope is handed back.
    async fn call(&self, request: &ApiRequest) -> Result<Envelope> {
        let token = self.bearer().await?;

        debug!("Making {} request to: {}", request.method, self.api_url);
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(token)
            .header(ACCEPT, "application/json")
            .json(request)
            .send()
            .await?;
        let status = response.status();
        debug!("{} response status: {}", request.method, status);
        if status == StatusCode::UNAUTHORIZED {
            self.tokens.invalidate().await;
        }

        let contents = response.text().await?;
        let envelope = Envelope::from_body(&format!("{} response", request.method), &contents)?;

        if envelope.is_unauthorized() {
            warn!("{} rejected our token, forcing re-authentication", request.method);
            self.tokens.invalidate().await;
        }
        Ok(envelope)
    }
}

impl YoLinkApiTrait for YoLinkClient {
    async fn access_token(&self) -> Result<String> {
        self.bearer().await
    }

    async fn list_devices(&self) -> Result<Vec<Device>> {
        let envelope = self.call(&ApiRequest::new(GET_DEVICE_LIST)).await?;
        let data: DeviceListData = envelope.into_data("devices response")?;
        Ok(data.devices)
    }

    async fn get_device_state(&self, device_id: &str, device_type: &str) -> Result<DeviceState> {
        // The state call needs the device's own token, which only the device list carries.
        let devices = self.list_devices().await?;
        let device_token = devices
            .iter()
            .find(|d| d.device_id == device_id)
            .map(|d| d.token.as_str())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "device {} not found or device token not available",
                    device_id
                ))
            })?;

        let request = ApiRequest::get_state(device_type, device_id, device_token);
        self.call(&request)
            .await?
            .into_data("device state response")
    }

    async fn get_home_id(&self) -> Result<String> {
        let envelope = self.call(&ApiRequest::new(GET_GENERAL_INFO)).await?;
        let data: GeneralInfoData = envelope.into_data("general info response")?;
        data.id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::NotFound("home id missing from general info".to_string()))
    }
}

/// The vendor operations the rest of the bridge depends on.
pub trait YoLinkApiTrait {
    fn access_token(&self) -> impl Future<Output = Result<String>> + Send;
    fn list_devices(&self) -> impl Future<Output = Result<Vec<Device>>> + Send;
    fn get_device_state(
        &self,
        device_id: &str,
        device_type: &str,
    ) -> impl Future<Output = Result<DeviceState>> + Send;
    fn get_home_id(&self) -> impl Future<Output = Result<String>> + Send;
}

impl<T> YoLinkApiTrait for Arc<T>
where
    T: YoLinkApiTrait + Send + Sync,
{
    async fn access_token(&self) -> Result<String> {
        self.as_ref().access_token().await
    }

    async fn list_devices(&self) -> Result<Vec<Device>> {
        self.as_ref().list_devices().await
    }

    async fn get_device_state(&self, device_id: &str, device_type: &str) -> Result<DeviceState> {
        self.as_ref().get_device_state(device_id, device_type).await
    }

    async fn get_home_id(&self) -> Result<String> {
        self.as_ref().get_home_id().await
    }
}
