#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use httpmock::MockServer;
use tracing_subscriber::fmt::MakeWriter;
use typhur_client::{Client, Config, Device};

pub const DEVICE_INFO: &str = "google sdk_gphone64_x86_64 15";
pub const DEVICE_SN: &str = "cc4d64f391f84fd8851714222dd200cd";

pub fn device() -> Device {
    Device::new(DEVICE_INFO, DEVICE_SN).expect("valid device")
}

pub fn client(server: &MockServer) -> anyhow::Result<Client> {
    Ok(Client::with_config(
        &server.base_url(),
        Config::default(),
        device(),
    )?)
}

/// In-memory log output for asserting on emitted events.
#[derive(Clone, Default)]
pub struct LogSink(Arc<Mutex<Vec<u8>>>);

impl LogSink {
    pub fn contents(&self) -> String {
        let buf = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl io::Write for LogSink {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'writer> MakeWriter<'writer> for LogSink {
    type Writer = LogSink;

    fn make_writer(&'writer self) -> Self::Writer {
        self.clone()
    }
}
