use lazy_static::lazy_static;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub session_file: PathBuf,
    pub listen_addr: Option<SocketAddr>,
}

fn env_non_empty(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(val) if val.trim().is_empty() => None,
        Ok(val) => Some(val.trim().to_string()),
        Err(_) => None,
    }
}

fn env_secs(key: &str, default: u64) -> Duration {
    let secs = match env_non_empty(key) {
        Some(val) => val
            .parse::<u64>()
            .unwrap_or_else(|_| panic!("Invalid {} value: {}", key, val)),
        None => default,
    };
    assert!(secs > 0, "{} must be greater than zero", key);
    Duration::from_secs(secs)
}

lazy_static! {
    pub static ref CONFIG: Config = {
        let api_base_url = env_non_empty("REGWATCH_API_URL")
            .unwrap_or_else(|| "http://localhost".to_string())
            .trim_end_matches('/')
            .to_string();
        let poll_interval = env_secs("REGWATCH_POLL_INTERVAL_SECS", 15);
        let request_timeout = env_secs("REGWATCH_REQUEST_TIMEOUT_SECS", 10);
        let session_file = env_non_empty("REGWATCH_SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".regwatch_session.json"));
        let listen_addr = env_non_empty("REGWATCH_LISTEN_ADDR").map(|val| {
            val.parse::<SocketAddr>()
                .expect("Invalid REGWATCH_LISTEN_ADDR socket address")
        });
        Config {
            api_base_url,
            poll_interval,
            request_timeout,
            session_file,
            listen_addr,
        }
    };
}
