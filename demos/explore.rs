//! Logs in with `TYPHUR_USERNAME` / `TYPHUR_PASSWORD` and dumps a few endpoints.
//!
//! ```sh
//! RUST_LOG=info,typhur_client=debug cargo run --example explore
//! ```

use std::env;

use tracing::info;
use tracing_subscriber::EnvFilter;
use typhur_client::{Client, Device, Page};

const DEVICE_INFO: &str = "google sdk_gphone64_x86_64 15";
const DEVICE_SN: &str = "cc4d64f391f84fd8851714222dd200cd";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let username = env::var("TYPHUR_USERNAME")?;
    let password = env::var("TYPHUR_PASSWORD")?;

    let mut client = Client::new(Device::new(DEVICE_INFO, DEVICE_SN)?)?;

    let response = client.login(&username, &password).await?;
    info!(outcome = %response.outcome(), "login");
    if !client.is_authenticated() {
        return Ok(());
    }

    let response = client.device_bind_list().await?;
    info!(body = %response.body(), "bound devices");

    let response = client.history_page(Page::default()).await?;
    info!(body = %response.body(), "cooking history");

    let response = client.mqtt_cert_apply().await?;
    info!(body = %response.body(), "mqtt certificate");

    let response = client.dict_list().await?;
    info!(body = %response.body(), "dictionary");

    Ok(())
}
