use crate::settings::SETTINGS;

/// Construction values for one device, as handed over by the host application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZidooConfig {
    pub host: String,
    pub port: u16,
    /// Pre-shared key sent as `X-Auth-PSK`. When set, cookies are not attached.
    pub psk: Option<String>,
    /// Wake-on-LAN target. Adopted from the device at connect when absent.
    pub mac: Option<String>,
}

impl ZidooConfig {
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
            port: SETTINGS.port,
            psk: None,
            mac: None,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_psk(mut self, psk: &str) -> Self {
        self.psk = Some(psk.to_string());
        self
    }

    pub fn with_mac(mut self, mac: &str) -> Self {
        self.mac = Some(mac.to_string());
        self
    }

    /// `host:port` authority used for every request and generated image URL.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
