//! Request signing.
//!
//! Every request carries a fresh set of `x-*` headers. The headers (minus
//! `x-sign`), sorted by key, and the compact JSON body are joined with the
//! application key and hashed with MD5; the hex digest becomes `x-sign`.
//!
//! ```text
//! <app key>|<k1>=<v1>;<k2>=<v2>;...|<json body>
//! ```

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};

use chrono::Utc;
use md5::{Digest as _, Md5};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use secrecy::{ExposeSecret as _, SecretString};
use serde_json::Value;

use crate::config::Config;
use crate::types::HeaderOverrides;
use crate::{Result, Timestamp};

pub const X_APP_ID: &str = "x-appId";
pub const X_APP_VERSION: &str = "x-appVersion";
pub const X_DEVICE_SN: &str = "x-deviceSn";
pub const X_NONCE: &str = "x-nonce";
pub const X_TIMESTAMP: &str = "x-timestamp";
pub const X_LANG: &str = "x-lang";
pub const X_REGION: &str = "x-region";
pub const X_TOKEN: &str = "x-token";
pub const X_SIGN: &str = "x-sign";

/// `x-token` value sent before login.
pub const NO_TOKEN: &str = "none";

const SEPARATOR: char = '|';

/// Signs `headers` and `payload` with `app_key`.
///
/// Header order does not matter; keys are sorted byte-wise before joining.
/// The payload is serialized compactly in its own key order.
pub fn sign<I, K, V>(app_key: &str, headers: I, payload: &Value) -> Result<String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let payload = serde_json::to_string(payload)?;
    Ok(sign_serialized(app_key, headers, &payload))
}

/// Same as [`sign`], over an already serialized body.
pub fn sign_serialized<I, K, V>(app_key: &str, headers: I, payload: &str) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut pairs: Vec<(K, V)> = headers.into_iter().collect();
    pairs.sort_by(|(a, _), (b, _)| a.as_ref().as_bytes().cmp(b.as_ref().as_bytes()));

    let joined = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k.as_ref(), v.as_ref()))
        .collect::<Vec<_>>()
        .join(";");

    let mut to_hash = String::with_capacity(app_key.len() + joined.len() + payload.len() + 2);
    to_hash.push_str(app_key);
    to_hash.push(SEPARATOR);
    to_hash.push_str(&joined);
    to_hash.push(SEPARATOR);
    to_hash.push_str(payload);
    let to_hash = to_hash.replace('\n', "");

    #[cfg(feature = "tracing")]
    tracing::trace!(string_to_sign = %to_hash, "computing request signature");

    md5_hex(to_hash.as_bytes())
}

/// Lowercase hex MD5 of a password, as the login endpoint expects it.
#[must_use]
pub fn hash_password(password: &str) -> String {
    md5_hex(password.as_bytes())
}

/// UUID v4 as 32 lowercase hex chars.
#[must_use]
pub fn nonce() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn md5_hex(bytes: &[u8]) -> String {
    let digest = Md5::digest(bytes);
    digest.iter().fold(String::with_capacity(32), |mut out, byte| {
        let _: fmt::Result = write!(out, "{byte:02x}");
        out
    })
}

/// Signed header set for one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedHeaders {
    entries: BTreeMap<&'static str, String>,
}

impl SignedHeaders {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn signature(&self) -> &str {
        self.get(X_SIGN).unwrap_or_default()
    }

    #[must_use]
    pub fn nonce(&self) -> &str {
        self.get(X_NONCE).unwrap_or_default()
    }

    #[must_use]
    pub fn token(&self) -> &str {
        self.get(X_TOKEN).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Wire headers: the signed set plus `User-Agent` and `Content-Type`.
    pub(crate) fn into_header_map(self, user_agent: &str) -> Result<HeaderMap> {
        let mut map = HeaderMap::with_capacity(self.entries.len() + 2);
        for (name, value) in self.entries {
            map.insert(
                HeaderName::from_static(lowercase_static(name)),
                HeaderValue::from_str(&value)?,
            );
        }
        map.insert(USER_AGENT, HeaderValue::from_str(user_agent)?);
        map.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(map)
    }
}

// `HeaderName::from_static` only takes lowercase names; HTTP names are case-insensitive.
fn lowercase_static(name: &'static str) -> &'static str {
    match name {
        X_APP_ID => "x-appid",
        X_APP_VERSION => "x-appversion",
        X_DEVICE_SN => "x-devicesn",
        other => other,
    }
}

/// Builds and signs the `x-*` headers for a request whose body is `payload`.
pub(crate) fn create_headers(
    config: &Config,
    device_serial: &str,
    token: Option<&SecretString>,
    payload: &str,
    overrides: &HeaderOverrides,
) -> SignedHeaders {
    let nonce = overrides.nonce.clone().unwrap_or_else(nonce);
    let timestamp: Timestamp = overrides
        .timestamp
        .unwrap_or_else(|| Utc::now().timestamp_millis());
    let token = token
        .map(|t| t.expose_secret())
        .filter(|t| !t.is_empty())
        .unwrap_or(NO_TOKEN);

    let mut entries = BTreeMap::new();
    entries.insert(X_APP_ID, config.app_id.clone());
    entries.insert(X_APP_VERSION, config.app_version.clone());
    entries.insert(X_DEVICE_SN, device_serial.to_owned());
    entries.insert(X_NONCE, nonce);
    entries.insert(X_TIMESTAMP, timestamp.to_string());
    entries.insert(X_LANG, config.lang.clone());
    entries.insert(X_REGION, config.region.clone());
    entries.insert(X_TOKEN, token.to_owned());

    let signature = sign_serialized(config.app_key.expose_secret(), &entries, payload);
    entries.insert(X_SIGN, signature);

    SignedHeaders { entries }
}
