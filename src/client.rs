use reqwest::Client as ReqwestClient;
use reqwest::Method;
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;

use crate::Result;
use crate::error::Error;
use crate::auth::{self, SignedHeaders};
use crate::config::{Config, DEFAULT_HOST, Device};
use crate::endpoints::{
    ARTICLE_LIST, COLLECTION_LIST, DEVICE_BIND_LIST, DEVICE_BIND_LIST_REFRESH, DEVICE_MODEL_LIST,
    DICT_LIST, FAVORITE_PAGE, HISTORY_PAGE, LOGIN, MQTT_CERT_APPLY, NOTIFICATION_HAS_NEW,
    OTA_VERSION_CHECK, PRESET_PAGE, USER_GET, USER_SETTING_GET,
};
use crate::types::{HeaderOverrides, LoginRequest, Page, Payload, Response, to_payload};

/// Session with the Typhur cloud API.
///
/// Holds the device identity, the access token once logged in, and the HTTP
/// client every request goes through.
#[derive(Clone, Debug)]
pub struct Client {
    host: Url,
    config: Config,
    device: Device,
    access_token: Option<SecretString>,
    client: ReqwestClient,
}

impl Client {
    /// Creates a client for the production API with default settings.
    pub fn new(device: Device) -> Result<Self> {
        Self::with_config(DEFAULT_HOST, Config::default(), device)
    }

    pub fn with_config(host: &str, config: Config, device: Device) -> Result<Self> {
        Self::with_client(host, config, device, ReqwestClient::new())
    }

    /// Creates a client on top of a caller-provided HTTP client.
    pub fn with_client(
        host: &str,
        config: Config,
        device: Device,
        client: ReqwestClient,
    ) -> Result<Self> {
        config.validate()?;

        let mut host = Url::parse(host)?;
        if !host.path().ends_with('/') {
            let path = format!("{}/", host.path());
            host.set_path(&path);
        }

        Ok(Self {
            host,
            config,
            device,
            access_token: None,
            client,
        })
    }

    #[must_use]
    pub fn host(&self) -> &Url {
        &self.host
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn device(&self) -> &Device {
        &self.device
    }

    #[must_use]
    pub fn access_token(&self) -> Option<&SecretString> {
        self.access_token.as_ref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// Builds the signed headers a request with `payload` would carry right now.
    pub fn build_headers(&self, payload: &Payload) -> Result<SignedHeaders> {
        let body = serde_json::to_string(payload)?;
        Ok(self.create_headers(&body, &HeaderOverrides::default()))
    }

    /// Logs in and keeps the returned access token for later requests.
    ///
    /// A rejected login is not an error: the token stays as it was and the
    /// response is handed back for inspection.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<Response> {
        #[cfg(feature = "tracing")]
        tracing::debug!(email, "logging in");

        let payload = to_payload(&LoginRequest {
            account_name: email,
            account_password: auth::hash_password(password),
            device_info: &self.device.info,
        })?;

        let response = self.request(LOGIN, Some(payload)).await?;

        let token = response
            .data()
            .and_then(|data| data.get("token"))
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty());

        match token {
            Some(token) => {
                self.access_token = Some(SecretString::from(token.to_owned()));

                #[cfg(feature = "tracing")]
                tracing::info!("logged in successfully");
            }
            None => {
                #[cfg(feature = "tracing")]
                tracing::error!(response = %response.body(), "login failed");
            }
        }

        Ok(response)
    }

    /// POSTs `payload` (an empty object when `None`) to `path`.
    pub async fn request(&self, path: &str, payload: Option<Payload>) -> Result<Response> {
        self.request_with_overrides(path, payload, &HeaderOverrides::default())
            .await
    }

    /// Like [`Client::request`], with a pinned nonce and/or timestamp.
    pub async fn request_with_overrides(
        &self,
        path: &str,
        payload: Option<Payload>,
        overrides: &HeaderOverrides,
    ) -> Result<Response> {
        let payload = payload.unwrap_or_default();
        let body = serde_json::to_string(&payload)?;

        let headers = self
            .create_headers(&body, overrides)
            .into_header_map(&self.config.user_agent)?;

        let request = self
            .client
            .request(Method::POST, self.endpoint(path)?)
            .body(body.clone())
            .build()?;

        let response = crate::request(&self.client, request, headers, path).await?;

        #[cfg(feature = "tracing")]
        log_outcome(&response, &body);

        Ok(response)
    }

    /// Devices bound to the account.
    pub async fn device_bind_list(&self) -> Result<Response> {
        self.request(DEVICE_BIND_LIST, None).await
    }

    /// Asks the server to refresh the bound device list in the background.
    pub async fn device_bind_list_refresh(&self) -> Result<Response> {
        self.request(DEVICE_BIND_LIST_REFRESH, None).await
    }

    /// Every device model the vendor offers.
    pub async fn device_model_list(&self) -> Result<Response> {
        self.request(DEVICE_MODEL_LIST, None).await
    }

    /// Cooking history.
    pub async fn history_page(&self, page: Page) -> Result<Response> {
        self.request(HISTORY_PAGE, Some(to_payload(&page)?)).await
    }

    /// Client certificate for the MQTT broker.
    pub async fn mqtt_cert_apply(&self) -> Result<Response> {
        self.request(MQTT_CERT_APPLY, None).await
    }

    /// Server dictionary; includes `mqtt_conn_param`.
    pub async fn dict_list(&self) -> Result<Response> {
        self.request(DICT_LIST, None).await
    }

    pub async fn article_list(&self, collection_id: u64) -> Result<Response> {
        let mut payload = Payload::new();
        payload.insert("collectionId".to_owned(), json!(collection_id));
        self.request(ARTICLE_LIST, Some(payload)).await
    }

    pub async fn collection_list(&self) -> Result<Response> {
        self.request(COLLECTION_LIST, None).await
    }

    pub async fn favorite_page(&self, page: Page) -> Result<Response> {
        self.request(FAVORITE_PAGE, Some(to_payload(&page)?)).await
    }

    pub async fn notification_has_new(&self) -> Result<Response> {
        self.request(NOTIFICATION_HAS_NEW, None).await
    }

    /// Firmware update check.
    pub async fn ota_version_check(&self) -> Result<Response> {
        self.request(OTA_VERSION_CHECK, None).await
    }

    pub async fn preset_page(&self, page: Page) -> Result<Response> {
        self.request(PRESET_PAGE, Some(to_payload(&page)?)).await
    }

    pub async fn user_get(&self) -> Result<Response> {
        self.request(USER_GET, None).await
    }

    pub async fn user_setting_get(&self) -> Result<Response> {
        self.request(USER_SETTING_GET, None).await
    }

    fn create_headers(&self, body: &str, overrides: &HeaderOverrides) -> SignedHeaders {
        auth::create_headers(
            &self.config,
            &self.device.serial,
            self.access_token.as_ref(),
            body,
            overrides,
        )
    }

    /// Appends `path` to the host's path. `path` never replaces the host or climbs above it.
    fn endpoint(&self, path: &str) -> Result<Url> {
        if Url::parse(path).is_ok_and(|url| url.has_host()) {
            return Err(Error::validation(format!(
                "path `{path}` is an absolute URL, expected a relative API path"
            )));
        }

        let path = path.trim_start_matches('/');
        if path.split('/').any(|segment| matches!(segment, "." | "..")) {
            return Err(Error::validation(format!(
                "path `{path}` must not contain `.` or `..` segments"
            )));
        }

        let mut url = self.host.clone();
        url.path_segments_mut()
            .map_err(|()| Error::validation(format!("host `{}` cannot be a base", self.host)))?
            .pop_if_empty()
            .extend(path.split('/'));
        Ok(url)
    }
}

#[cfg(feature = "tracing")]
fn log_outcome(response: &Response, payload: &str) {
    use crate::types::Outcome;

    let path = response.path();
    let status = response.status();
    let body = response.body();

    match response.outcome() {
        Outcome::Success => {
            tracing::debug!(path, %status, payload, response = %body, "request succeeded");
        }
        Outcome::Failed => {
            tracing::error!(path, %status, payload, response = %body, "request failed");
        }
        Outcome::Malformed => {
            tracing::error!(path, %status, payload, response = %body, "request was malformed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Kind;

    fn device() -> Device {
        Device::new("google sdk_gphone64_x86_64 15", "cc4d64f391f84fd8851714222dd200cd")
            .expect("valid device")
    }

    #[test]
    fn host_gets_trailing_slash() {
        let client = Client::with_config("https://example.com/api", Config::default(), device())
            .expect("client");

        assert_eq!(client.host().as_str(), "https://example.com/api/");
        assert_eq!(
            client.endpoint("app/dict/list").expect("endpoint").as_str(),
            "https://example.com/api/app/dict/list"
        );
        assert_eq!(
            client.endpoint("/app/dict/list").expect("endpoint").as_str(),
            "https://example.com/api/app/dict/list"
        );
    }

    #[test]
    fn path_cannot_leave_the_host() {
        let client = Client::new(device()).expect("client");

        let err = client
            .endpoint("https://evil.example/steal")
            .expect_err("absolute url");
        assert_eq!(err.kind(), Kind::Validation);

        let err = client.endpoint("../../x").expect_err("parent segments");
        assert_eq!(err.kind(), Kind::Validation);

        let err = client.endpoint("app/./dict/list").expect_err("dot segment");
        assert_eq!(err.kind(), Kind::Validation);

        assert_eq!(
            client.endpoint("v2:thing/list").expect("colon segment").as_str(),
            "https://api.iot.typhur.com/v2:thing/list"
        );
    }

    #[test]
    fn parent_segments_do_not_escape_base_path() {
        let client = Client::with_config("https://example.com/api/", Config::default(), device())
            .expect("client");

        let err = client.endpoint("../admin").expect_err("parent segment");
        assert_eq!(err.kind(), Kind::Validation);
        assert_eq!(
            client.endpoint("app/user/get").expect("endpoint").as_str(),
            "https://example.com/api/app/user/get"
        );
    }

    #[test]
    fn default_client_targets_production() {
        let client = Client::new(device()).expect("client");

        assert_eq!(
            client.endpoint(LOGIN).expect("endpoint").as_str(),
            "https://api.iot.typhur.com/app/account/login"
        );
        assert!(!client.is_authenticated());
    }

    #[test]
    fn invalid_host_is_rejected() {
        let err = Client::with_config("not a url", Config::default(), device()).expect_err("bad host");

        assert_eq!(err.kind(), Kind::Validation);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = Config::builder().user_agent("").build();
        let err = Client::with_config(DEFAULT_HOST, config, device()).expect_err("bad config");

        assert_eq!(err.kind(), Kind::Validation);
    }

    #[test]
    fn build_headers_are_fresh_each_time() {
        let client = Client::new(device()).expect("client");

        let first = client.build_headers(&Payload::new()).expect("headers");
        let second = client.build_headers(&Payload::new()).expect("headers");

        assert_eq!(first.token(), auth::NO_TOKEN);
        assert_eq!(first.get(auth::X_DEVICE_SN), Some("cc4d64f391f84fd8851714222dd200cd"));
        assert_ne!(first.nonce(), second.nonce());
        assert_ne!(first.signature(), second.signature());
    }
}
