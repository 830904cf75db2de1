//! Wire shapes of the device's REST server

use crate::models::ContractRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ContractList {
    #[serde(default)]
    pub contracts: Vec<ContractEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ContractEntry {
    pub name: String,
    pub contract_address: Option<String>,
    pub current_agreement_id: Option<String>,
    pub agreement_creation_time: u64,
    pub agreement_accepted_time: u64,
    pub agreement_finalized_time: u64,
    pub agreement_execution_start_time: u64,
    pub agreement_terminated_time: u64,
    // service name -> container config, only the keys are used
    pub current_deployment: Option<BTreeMap<String, serde_json::Value>>,
    pub status: Option<String>,
}

impl From<ContractEntry> for ContractRecord {
    fn from(entry: ContractEntry) -> Self {
        ContractRecord {
            name: entry.name,
            contract_address: entry.contract_address.unwrap_or_default(),
            agreement_id: entry.current_agreement_id.unwrap_or_default(),
            creation_time: entry.agreement_creation_time,
            accepted_time: entry.agreement_accepted_time,
            finalized_time: entry.agreement_finalized_time,
            execution_start_time: entry.agreement_execution_start_time,
            terminated_time: entry.agreement_terminated_time,
            services: entry
                .current_deployment
                .map(|d| d.into_keys().collect())
                .unwrap_or_default(),
            explicit_status: entry.status.filter(|s| !s.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Info {
    #[serde(default)]
    pub geth: Option<Geth>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Geth {
    #[serde(default)]
    pub eth_accounts: Option<Vec<String>>,
}

impl Info {
    /// Comma-joined account list, `None` while geth has no accounts.
    pub fn account(&self) -> Option<String> {
        let accounts = self.geth.as_ref()?.eth_accounts.as_ref()?;
        if accounts.is_empty() {
            return None;
        }
        Some(accounts.join(","))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LatestMicropayment {
    pub agreement_id: String,
    pub payment_time: i64,
    pub payment_value: u64,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_deserialise_contract_list() {
        let json = r#"{"contracts":[
            {"name":"SDR","contract_address":"0x1","current_agreement_id":"a1",
             "agreement_creation_time":10,"agreement_accepted_time":20,
             "agreement_execution_start_time":0,
             "current_deployment":{"sdr":{"config":{}},"gps":{}},
             "configure_nonce":"abc"},
            {"name":"IPFS","current_agreement_id":null,"current_deployment":null}
        ]}"#;
        let list: ContractList = serde_json::from_str(json).unwrap();
        let records: Vec<ContractRecord> = list.contracts.into_iter().map(Into::into).collect();
        assert_eq!(records.len(), 2);

        let sdr = &records[0];
        assert_eq!(sdr.agreement_id, "a1");
        assert_eq!(sdr.accepted_time, 20);
        assert_eq!(sdr.finalized_time, 0);
        assert_eq!(
            sdr.services.iter().cloned().collect::<Vec<_>>(),
            vec!["gps".to_string(), "sdr".to_string()]
        );

        let ipfs = &records[1];
        assert_eq!(ipfs.agreement_id, "");
        assert!(ipfs.services.is_empty());
        assert_eq!(ipfs.explicit_status, None);
    }

    #[test]
    fn test_empty_status_is_absent() {
        let entry: ContractEntry = serde_json::from_str(r#"{"name":"A","status":""}"#).unwrap();
        let record = ContractRecord::from(entry);
        assert_eq!(record.explicit_status, None);
    }

    #[test]
    fn test_info_account() {
        let info: Info =
            serde_json::from_str(r#"{"geth":{"eth_accounts":["0xa","0xb"],"net_peer_count":3}}"#)
                .unwrap();
        assert_eq!(info.account(), Some("0xa,0xb".to_string()));

        let info: Info = serde_json::from_str(r#"{"geth":{"eth_accounts":[]}}"#).unwrap();
        assert_eq!(info.account(), None);

        let info: Info = serde_json::from_str(r#"{"geth":null}"#).unwrap();
        assert_eq!(info.account(), None);
    }
}
