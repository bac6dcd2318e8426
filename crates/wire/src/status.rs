//! The retained liveness payload published on the status topic.

use serde::{Deserialize, Serialize};

/// Retained on the status topic so a device connecting late still learns
/// whether the bridge is currently online.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Liveness {
    pub server: String,
    pub online: bool,
    pub timestamp: u64,
}

impl Liveness {
    pub fn online(server: impl Into<String>, timestamp: u64) -> Self {
        Self {
            server: server.into(),
            online: true,
            timestamp,
        }
    }

    pub fn offline(server: impl Into<String>, timestamp: u64) -> Self {
        Self {
            server: server.into(),
            online: false,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn online_and_offline_round_trip_through_json() {
        let up = Liveness::online("bridge-1", 10);
        let raw = serde_json::to_string(&up).unwrap();
        let back: Liveness = serde_json::from_str(&raw).unwrap();
        assert_eq!(up, back);
        assert!(back.online);

        let down = Liveness::offline("bridge-1", 20);
        assert!(!down.online);
    }
}
