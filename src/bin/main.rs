use clap::Parser;
use regwatch::api_client::ApiClient;
use regwatch::config::CONFIG;
use regwatch::pending::PendingSubmissions;
use regwatch::poller::Poller;
use regwatch::render::SharedTable;
use regwatch::session::FileSessionStore;
use regwatch::web_api_server::WebApiServer;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::*;
use tracing_subscriber::EnvFilter;

/// Poll the device's registration status.
#[derive(Debug, Parser)]
#[command(name = "regwatch", version)]
struct Args {
    /// Run a single poll cycle, print the table and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    info!("Loaded config: {:?}", *CONFIG);

    let api_client = match ApiClient::new() {
        Ok(client) => client,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let store = match FileSessionStore::open(&CONFIG.session_file) {
        Ok(store) => store,
        Err(e) => {
            error!("Unable to open {}: {}", CONFIG.session_file.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let pending = PendingSubmissions::new(Box::new(store));
    let table = SharedTable::new();
    let mut poller = Poller::new(Arc::new(api_client), pending, Box::new(table.clone()));

    if args.once {
        poller.tick();
        poller.settle().await;
        print!("{}", table.read(|t| t.render_text()));
        return ExitCode::SUCCESS;
    }

    if let Some(addr) = CONFIG.listen_addr {
        let server = WebApiServer::new(&table);
        tokio::spawn(async move {
            if let Err(e) = server.run(addr).await {
                error!("Status view stopped: {}", e);
            }
        });
    }

    tokio::select! {
        _ = poller.run(CONFIG.poll_interval) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
        }
    }
    ExitCode::SUCCESS
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_args() {
        assert!(Args::try_parse_from(["main", "--once"]).unwrap().once);
        assert!(!Args::try_parse_from(["main"]).unwrap().once);
        assert!(Args::try_parse_from(["main", "--onec"]).is_err());
    }
}
