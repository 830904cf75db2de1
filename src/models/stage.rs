use super::ContractRecord;
use serde::{Serialize, Serializer};
use std::str::FromStr as _;
use strum::EnumString;

/// Lifecycle stage of a contract, as shown on the status table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString)]
pub enum Stage {
    /// Submitted on this client, not yet reported by the server.
    #[strum(serialize = "Waiting to advertise")]
    WaitingToAdvertise,
    #[strum(serialize = "Advertised")]
    Advertised,
    #[strum(serialize = "Negotiating")]
    Negotiating,
    #[strum(serialize = "Downloading workload")]
    DownloadingWorkload,
    #[strum(serialize = "Running workload")]
    RunningWorkload,
    #[strum(serialize = "In contract")]
    InContract,
    #[strum(serialize = "Ended")]
    Ended,
    /// Server-dictated status that is not one of the known labels.
    #[strum(default)]
    Explicit(String),
}

/// Stages that get a progress bar, in order.
pub const PROGRESS_ORDER: [Stage; 6] = [
    Stage::WaitingToAdvertise,
    Stage::Advertised,
    Stage::Negotiating,
    Stage::DownloadingWorkload,
    Stage::RunningWorkload,
    Stage::InContract,
];

impl Stage {
    pub fn label(&self) -> &str {
        match self {
            Stage::WaitingToAdvertise => "Waiting to advertise",
            Stage::Advertised => "Advertised",
            Stage::Negotiating => "Negotiating",
            Stage::DownloadingWorkload => "Downloading workload",
            Stage::RunningWorkload => "Running workload",
            Stage::InContract => "In contract",
            Stage::Ended => "Ended",
            Stage::Explicit(status) => status,
        }
    }

    /// Position in the progress order, `None` for stages rendered as plain text.
    pub fn progress_index(&self) -> Option<usize> {
        PROGRESS_ORDER.iter().position(|s| s == self)
    }

    /// floor(index / (count - 1) * 100)
    pub fn progress_percent(&self) -> Option<u8> {
        let last = PROGRESS_ORDER.len() - 1;
        self.progress_index().map(|index| (index * 100 / last) as u8)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Serialize for Stage {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.label())
    }
}

/// Derive the lifecycle stage of a server-reported contract.
/// The latest event wins; earlier timestamps are not required to be set.
pub fn classify(record: &ContractRecord) -> Stage {
    if let Some(status) = record.explicit_status.as_deref() {
        if !status.is_empty() {
            // parsing never fails, unknown labels land in Stage::Explicit.
            // WaitingToAdvertise is reserved for names only known client-side.
            return match Stage::from_str(status) {
                Ok(Stage::WaitingToAdvertise) | Err(_) => Stage::Explicit(status.to_string()),
                Ok(stage) => stage,
            };
        }
    }
    if record.terminated_time != 0 {
        Stage::Ended
    } else if record.finalized_time != 0 {
        Stage::InContract
    } else if record.execution_start_time != 0 {
        Stage::RunningWorkload
    } else if record.accepted_time != 0 {
        Stage::DownloadingWorkload
    } else if record.creation_time != 0 {
        Stage::Negotiating
    } else {
        Stage::Advertised
    }
}
