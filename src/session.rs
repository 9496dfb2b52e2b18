use crate::config::ZidooConfig;

/// Connection state for one physical device.
///
/// The auth token is the only connectivity signal: `is_connected()` never
/// pings, so it goes stale between polls until the next request either
/// refreshes or clears it. Only the request executor (on a 200 response or
/// on retry exhaustion) and explicit connect/disconnect write it.
#[derive(Debug, Clone)]
pub struct DeviceSession {
    config: ZidooConfig,
    auth_token: Option<String>,
    power_observed: bool,
}

impl DeviceSession {
    pub fn new(config: ZidooConfig) -> Self {
        Self {
            config,
            auth_token: None,
            power_observed: false,
        }
    }

    pub fn config(&self) -> &ZidooConfig {
        &self.config
    }

    pub fn host(&self) -> &str {
        &self.config.host
    }

    pub fn port(&self) -> u16 {
        self.config.port
    }

    pub fn authority(&self) -> String {
        self.config.authority()
    }

    pub fn psk(&self) -> Option<&str> {
        self.config.psk.as_deref()
    }

    pub fn mac(&self) -> Option<&str> {
        self.config.mac.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.auth_token.is_some()
    }

    /// Whether the device answered the most recent power probe or connect.
    pub fn power_observed(&self) -> bool {
        self.power_observed
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    /// Cookie header to attach, if any. A PSK replaces cookie auth entirely.
    pub(crate) fn cookie_header(&self) -> Option<&str> {
        if self.config.psk.is_some() {
            return None;
        }
        self.auth_token.as_deref().filter(|token| !token.is_empty())
    }

    /// Records the cookies of a 200 response. A response without cookies keeps
    /// the current token, or records an empty one so the session reads as live.
    pub(crate) fn store_cookies(&mut self, set_cookies: &[String]) {
        let pairs: Vec<&str> = set_cookies
            .iter()
            .filter_map(|raw| raw.split(';').next())
            .map(str::trim)
            .filter(|pair| !pair.is_empty())
            .collect();

        if !pairs.is_empty() {
            self.auth_token = Some(pairs.join("; "));
        } else if self.auth_token.is_none() {
            self.auth_token = Some(String::new());
        }
    }

    /// Drops the token. Returns true if the session was live before.
    pub(crate) fn clear_token(&mut self) -> bool {
        self.auth_token.take().is_some()
    }

    pub(crate) fn set_power_observed(&mut self, on: bool) {
        self.power_observed = on;
    }

    /// Adopts the device-reported MAC unless one was configured.
    pub(crate) fn adopt_mac(&mut self, mac: Option<&str>) {
        if self.config.mac.is_none() {
            if let Some(mac) = mac.filter(|m| !m.is_empty()) {
                self.config.mac = Some(mac.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> DeviceSession {
        DeviceSession::new(ZidooConfig::new("192.168.1.20").with_port(9529))
    }

    #[test]
    fn cookies_keep_name_value_pairs_only() {
        let mut s = session();
        assert!(!s.is_connected());
        s.store_cookies(&["JSESSIONID=abc; Path=/; HttpOnly".to_string()]);
        assert_eq!(s.auth_token(), Some("JSESSIONID=abc"));
        assert_eq!(s.cookie_header(), Some("JSESSIONID=abc"));
    }

    #[test]
    fn response_without_cookie_still_connects() {
        let mut s = session();
        s.store_cookies(&[]);
        assert!(s.is_connected());
        assert_eq!(s.cookie_header(), None);

        s.store_cookies(&["a=1".to_string()]);
        s.store_cookies(&[]);
        assert_eq!(s.auth_token(), Some("a=1"));
    }

    #[test]
    fn psk_suppresses_cookie() {
        let mut s = DeviceSession::new(ZidooConfig::new("10.0.0.2").with_psk("secret"));
        s.store_cookies(&["a=1".to_string()]);
        assert!(s.is_connected());
        assert_eq!(s.cookie_header(), None);
        assert_eq!(s.psk(), Some("secret"));
    }

    #[test]
    fn configured_mac_wins() {
        let mut s = DeviceSession::new(ZidooConfig::new("h").with_mac("00:11:22:33:44:55"));
        s.adopt_mac(Some("aa:bb:cc:dd:ee:ff"));
        assert_eq!(s.mac(), Some("00:11:22:33:44:55"));

        let mut s = session();
        s.adopt_mac(Some("aa:bb:cc:dd:ee:ff"));
        assert_eq!(s.mac(), Some("aa:bb:cc:dd:ee:ff"));
    }

    #[test]
    fn clear_reports_previous_state() {
        let mut s = session();
        assert!(!s.clear_token());
        s.store_cookies(&[]);
        assert!(s.clear_token());
        assert!(!s.is_connected());
    }
}
