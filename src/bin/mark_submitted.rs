//! Record contract names as submitted, so the poller shows them until the server reports them.
use clap::Parser;
use regwatch::config::CONFIG;
use regwatch::pending::PendingSubmissions;
use regwatch::session::{FileSessionStore, SessionStore as _};
use std::process::ExitCode;
use tracing::*;
use tracing_subscriber::EnvFilter;

/// Manage the pending submission list in the session file.
#[derive(Debug, Parser)]
#[command(name = "mark_submitted", version)]
struct Args {
    /// Empty the pending submission list
    #[arg(long, conflicts_with_all = ["reset", "names"])]
    clear: bool,

    /// Drop every session value, not only the pending list
    #[arg(long, conflicts_with = "names")]
    reset: bool,

    /// Contract names, separate arguments or comma-joined. Replaces the pending list.
    #[arg(required_unless_present_any = ["clear", "reset"])]
    names: Vec<String>,
}

impl Args {
    fn contract_names(&self) -> Vec<String> {
        self.names
            .iter()
            .flat_map(|arg| arg.split(','))
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect()
    }
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut store = match FileSessionStore::open(&CONFIG.session_file) {
        Ok(store) => store,
        Err(e) => {
            error!("Unable to open {}: {}", CONFIG.session_file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let result = if args.reset {
        store.clear()
    } else if args.clear {
        PendingSubmissions::new(Box::new(store)).clear()
    } else {
        let names = args.contract_names();
        info!("Marking {} contract(s) as submitted", names.len());
        PendingSubmissions::new(Box::new(store)).record(&names)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_names_split_on_commas() {
        let args = Args::try_parse_from(["mark_submitted", "SDR,citygram", " IPFS ", ","]).unwrap();
        assert!(!args.clear && !args.reset);
        assert_eq!(args.contract_names(), vec!["SDR", "citygram", "IPFS"]);
    }

    #[test]
    fn test_flags_are_not_names() {
        assert!(Args::try_parse_from(["mark_submitted", "-c"]).is_err());
        assert!(Args::try_parse_from(["mark_submitted", "--bogus"]).is_err());
        let help = Args::try_parse_from(["mark_submitted", "--help"]).unwrap_err();
        assert_eq!(help.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_clear_and_reset_are_exclusive() {
        let args = Args::try_parse_from(["mark_submitted", "--clear"]).unwrap();
        assert!(args.clear && args.names.is_empty());
        assert!(Args::try_parse_from(["mark_submitted", "--reset"]).unwrap().reset);
        assert!(Args::try_parse_from(["mark_submitted", "--clear", "--reset"]).is_err());
        assert!(Args::try_parse_from(["mark_submitted", "--clear", "SDR"]).is_err());
        assert!(Args::try_parse_from(["mark_submitted"]).is_err());
    }
}
