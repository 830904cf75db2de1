use crate::error::StoreError;
use crate::session::SessionStore;
use std::collections::HashSet;
use tracing::*;

/// Session key holding the comma-joined names of submitted contracts.
pub const CONTRACT_SUBMITTED_KEY: &str = "contract_submitted";

/// Drop every pending name the server already knows about, keeping the order of the rest.
pub fn reconcile(server_names: &HashSet<String>, pending: &[String]) -> Vec<String> {
    pending
        .iter()
        .filter(|name| !server_names.contains(*name))
        .cloned()
        .collect()
}

fn split_names(value: &str) -> Vec<String> {
    value
        .split(',')
        .filter(|name| !name.is_empty())
        .map(|name| name.to_string())
        .collect()
}

/// Contracts submitted from this client that the server has not reported yet.
pub struct PendingSubmissions {
    store: Box<dyn SessionStore>,
}

impl PendingSubmissions {
    pub fn new(store: Box<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub fn load(&self) -> Vec<String> {
        match self.store.get(CONTRACT_SUBMITTED_KEY) {
            Some(value) => split_names(&value),
            None => vec![],
        }
    }

    /// Replace the pending list, as done right after a successful submission.
    pub fn record(&mut self, names: &[String]) -> Result<(), StoreError> {
        self.store.set(CONTRACT_SUBMITTED_KEY, &names.join(","))
    }

    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.store.set(CONTRACT_SUBMITTED_KEY, "")
    }

    /// Remove names confirmed by the server and return the ones still pending.
    /// The store is only written when something was removed.
    pub fn reconcile_with(
        &mut self,
        server_names: &HashSet<String>,
    ) -> Result<Vec<String>, StoreError> {
        let pending = self.load();
        let remaining = reconcile(server_names, &pending);
        if remaining.len() != pending.len() {
            debug!(
                "{} pending submission(s) confirmed by server, {} remaining",
                pending.len() - remaining.len(),
                remaining.len()
            );
            self.store.set(CONTRACT_SUBMITTED_KEY, &remaining.join(","))?;
        }
        Ok(remaining)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::session::MemorySessionStore;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn set(v: &[&str]) -> HashSet<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_reconcile_preserves_order() {
        assert_eq!(
            reconcile(&set(&["A", "B"]), &names(&["A", "C", "B"])),
            names(&["C"])
        );
        assert_eq!(
            reconcile(&set(&[]), &names(&["Z", "Y"])),
            names(&["Z", "Y"])
        );
        assert!(reconcile(&set(&["A"]), &[]).is_empty());
    }

    #[test]
    fn test_reconcile_with_persists() {
        let mut pending = PendingSubmissions::new(Box::new(MemorySessionStore::new()));
        pending.record(&names(&["A", "C", "B"])).unwrap();
        assert_eq!(pending.load(), names(&["A", "C", "B"]));

        let remaining = pending.reconcile_with(&set(&["A", "B"])).unwrap();
        assert_eq!(remaining, names(&["C"]));
        assert_eq!(pending.load(), names(&["C"]));

        let remaining = pending.reconcile_with(&set(&["C"])).unwrap();
        assert!(remaining.is_empty());
        assert!(pending.load().is_empty());
    }

    #[test]
    fn test_empty_value_means_none_pending() {
        let mut pending = PendingSubmissions::new(Box::new(MemorySessionStore::new()));
        assert!(pending.load().is_empty());
        pending.record(&names(&["X"])).unwrap();
        pending.clear().unwrap();
        assert!(pending.load().is_empty());
    }
}
