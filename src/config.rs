use bon::Builder;
use reqwest::header::HeaderValue;
use secrecy::{ExposeSecret as _, SecretString};

use crate::Result;
use crate::error::Error;

pub const DEFAULT_HOST: &str = "https://api.iot.typhur.com/";
pub const APP_ID: &str = "ap196c116818d9b452";
/// Shared signing key baked into the vendor's mobile app.
pub const APP_KEY: &str = "90cd114bed613d81dafca2aa3ce1b7a8";
pub const APP_VERSION: &str = "2812";
/// The vendor app talks through OkHttp; requests carry the same agent.
pub const USER_AGENT: &str = "okhttp/4.12.0";
pub const DEFAULT_LANG: &str = "en_US";
pub const DEFAULT_REGION: &str = "US";

/// Static application identity and locale sent with every request.
#[non_exhaustive]
#[derive(Clone, Debug, Builder)]
pub struct Config {
    #[builder(into, default = APP_ID.to_owned())]
    pub app_id: String,
    #[builder(default = SecretString::from(APP_KEY.to_owned()))]
    pub app_key: SecretString,
    #[builder(into, default = APP_VERSION.to_owned())]
    pub app_version: String,
    #[builder(into, default = DEFAULT_LANG.to_owned())]
    pub lang: String,
    #[builder(into, default = DEFAULT_REGION.to_owned())]
    pub region: String,
    #[builder(into, default = USER_AGENT.to_owned())]
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Config::builder().build()
    }
}

impl Config {
    /// Checks that every value can travel as an HTTP header.
    pub fn validate(&self) -> Result<()> {
        ensure_header_safe("app_id", &self.app_id)?;
        ensure_header_safe("app_version", &self.app_version)?;
        ensure_header_safe("lang", &self.lang)?;
        ensure_header_safe("region", &self.region)?;
        ensure_header_safe("user_agent", &self.user_agent)?;
        if self.app_key.expose_secret().is_empty() {
            return Err(Error::validation("app_key must not be empty"));
        }
        Ok(())
    }
}

/// Identity of the host the client pretends to run on.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Device {
    /// Free-form description, conventionally `"<brand> <model> <os release>"`.
    pub info: String,
    pub serial: String,
}

impl Device {
    pub fn new<I: Into<String>, S: Into<String>>(info: I, serial: S) -> Result<Self> {
        let info = info.into();
        let serial = serial.into();

        ensure_header_safe("device serial", &serial)?;

        Ok(Self { info, serial })
    }

    /// Creates a device with a random 32-hex-char serial.
    #[must_use]
    pub fn generate<I: Into<String>>(info: I) -> Self {
        Self {
            info: info.into(),
            serial: uuid::Uuid::new_v4().simple().to_string(),
        }
    }
}

fn ensure_header_safe(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::validation(format!("{field} must not be empty")));
    }
    HeaderValue::from_str(value).map_err(|e| {
        Error::validation(format!("{field} is not a valid header value: {e}"))
    })?;
    Ok(())
}
