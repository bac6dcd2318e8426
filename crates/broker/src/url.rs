//! Minimal `mqtt://` / `mqtts://` URL parsing. `rumqttc` takes a bare host
//! and port, not a URL, so the scheme and default port have to be peeled
//! off here before building `MqttOptions`.

use crate::error::BrokerError;

pub struct BrokerAddress {
    pub host: String,
    pub port: u16,
    pub tls: bool,
}

pub fn parse_broker_url(url: &str) -> Result<BrokerAddress, BrokerError> {
    let (scheme, rest) = url.split_once("://").ok_or(BrokerError::InvalidUrl(
        url.to_string(),
        "missing scheme, expected mqtt:// or mqtts://",
    ))?;

    let tls = match scheme {
        "mqtt" => false,
        "mqtts" => true,
        _ => {
            return Err(BrokerError::InvalidUrl(
                url.to_string(),
                "unsupported scheme, expected mqtt:// or mqtts://",
            ))
        }
    };

    let default_port: u16 = if tls { 8883 } else { 1883 };
    let host_port = rest.trim_end_matches('/');
    if host_port.is_empty() {
        return Err(BrokerError::InvalidUrl(url.to_string(), "missing host"));
    }

    let (host, port) = match host_port.rsplit_once(':') {
        Some((host, port_str)) => {
            let port = port_str
                .parse::<u16>()
                .map_err(|_| BrokerError::InvalidUrl(url.to_string(), "invalid port"))?;
            (host.to_string(), port)
        }
        None => (host_port.to_string(), default_port),
    };

    if host.is_empty() {
        return Err(BrokerError::InvalidUrl(url.to_string(), "missing host"));
    }

    Ok(BrokerAddress { host, port, tls })
}
