use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Channel a sync round ran over. Labels only; framing is the transport
/// layer's problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncTransport {
    Bluetooth,
    WifiDirect,
    Internet,
}

impl fmt::Display for SyncTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncTransport::Bluetooth => write!(f, "bluetooth"),
            SyncTransport::WifiDirect => write!(f, "wifi_direct"),
            SyncTransport::Internet => write!(f, "internet"),
        }
    }
}

impl FromStr for SyncTransport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bluetooth" => Ok(SyncTransport::Bluetooth),
            "wifi_direct" => Ok(SyncTransport::WifiDirect),
            "internet" => Ok(SyncTransport::Internet),
            _ => Err(format!(
                "Invalid sync transport '{}'. Valid options: bluetooth, wifi_direct, internet",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

/// Record of one sync round with a peer device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncLog {
    pub id: Uuid,
    pub user_id: String,
    pub device_id: String,
    pub transport: SyncTransport,
    /// Kinds of data exchanged, e.g. `["progress", "chat"]`.
    pub data_types: Vec<String>,
    pub records_count: u32,
    pub status: SyncStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl SyncLog {
    pub fn new(
        user_id: impl Into<String>,
        device_id: impl Into<String>,
        transport: SyncTransport,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            device_id: device_id.into(),
            transport,
            data_types: Vec::new(),
            records_count: 0,
            status: SyncStatus::Pending,
            started_at: Utc::now(),
            completed_at: None,
            error: None,
        }
    }

    pub fn with_data_types(mut self, data_types: Vec<String>) -> Self {
        self.data_types = data_types;
        self
    }

    pub fn complete(&mut self, records_count: u32) {
        self.records_count = records_count;
        self.status = SyncStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = SyncStatus::Failed;
        self.error = Some(error.into());
        self.completed_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_transport_from_str() {
        assert_eq!(
            SyncTransport::from_str("bluetooth").unwrap(),
            SyncTransport::Bluetooth
        );
        assert_eq!(
            SyncTransport::from_str("WIFI_DIRECT").unwrap(),
            SyncTransport::WifiDirect
        );
        assert!(SyncTransport::from_str("carrier_pigeon").is_err());
    }

    #[test]
    fn test_sync_log_complete() {
        let mut log = SyncLog::new("user1", "device-a", SyncTransport::Internet);
        assert_eq!(log.status, SyncStatus::Pending);

        log.complete(7);

        assert_eq!(log.status, SyncStatus::Completed);
        assert_eq!(log.records_count, 7);
        assert!(log.completed_at.is_some());
        assert!(log.error.is_none());
    }

    #[test]
    fn test_sync_log_fail() {
        let mut log = SyncLog::new("user1", "device-a", SyncTransport::Bluetooth);

        log.fail("peer went away");

        assert_eq!(log.status, SyncStatus::Failed);
        assert_eq!(log.error.as_deref(), Some("peer went away"));
        assert!(log.completed_at.is_some());
    }

    #[test]
    fn test_sync_log_json_roundtrip() {
        let log = SyncLog::new("user1", "device-a", SyncTransport::WifiDirect)
            .with_data_types(vec!["progress".to_string(), "chat".to_string()]);

        let json = serde_json::to_string(&log).unwrap();
        let parsed: SyncLog = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.id, log.id);
        assert_eq!(parsed.transport, log.transport);
        assert_eq!(parsed.data_types, log.data_types);
    }
}
