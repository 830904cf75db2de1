use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A contract as reported by the device's REST server.
/// Timestamps are unix seconds, with 0 meaning the event has not happened yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractRecord {
    pub name: String,
    pub contract_address: String,
    pub agreement_id: String,
    pub creation_time: u64,
    pub accepted_time: u64,
    pub finalized_time: u64,
    pub execution_start_time: u64,
    pub terminated_time: u64,
    pub services: BTreeSet<String>,
    pub explicit_status: Option<String>,
}

impl ContractRecord {
    /// Stand-in record for a submission the server has not echoed back yet.
    pub fn pending(name: &str) -> ContractRecord {
        ContractRecord {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn has_agreement(&self) -> bool {
        !self.agreement_id.is_empty()
    }

    /// Text shown next to the stage: contract address and running workloads.
    pub fn detail(&self) -> String {
        let mut parts = Vec::new();
        if !self.contract_address.is_empty() {
            parts.push(self.contract_address.clone());
        }
        if !self.services.is_empty() {
            let services = self
                .services
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            parts.push(format!("workloads: {}", services));
        }
        if let Some(since) = to_datetime(self.latest_event_time()) {
            parts.push(format!("since {}", since.format("%Y-%m-%d %H:%M:%S UTC")));
        }
        parts.join(" | ")
    }

    fn latest_event_time(&self) -> u64 {
        [
            self.creation_time,
            self.accepted_time,
            self.finalized_time,
            self.execution_start_time,
            self.terminated_time,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

fn to_datetime(secs: u64) -> Option<DateTime<Utc>> {
    if secs == 0 {
        return None;
    }
    DateTime::<Utc>::from_timestamp(i64::try_from(secs).ok()?, 0)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_pending_record_is_blank() {
        let record = ContractRecord::pending("X");
        assert_eq!(record.name, "X");
        assert!(!record.has_agreement());
        assert_eq!(record.latest_event_time(), 0);
        assert_eq!(record.detail(), "");
    }

    #[test]
    fn test_detail() {
        let record = ContractRecord {
            name: "SDR".to_string(),
            contract_address: "0xabc".to_string(),
            accepted_time: 1_500_000_000,
            creation_time: 1_400_000_000,
            services: ["sdr".to_string(), "gps".to_string()].into_iter().collect(),
            ..Default::default()
        };
        assert_eq!(
            record.detail(),
            "0xabc | workloads: gps, sdr | since 2017-07-14 02:40:00 UTC"
        );
    }
}
