use crate::render::{SharedTable, TableView};
use axum::{extract::State, routing::get, Json, Router};
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::*;

/// Read-only http view of the status table.
pub struct WebApiServer {
    table: SharedTable,
}

impl WebApiServer {
    pub fn new(table: &SharedTable) -> Self {
        Self {
            table: table.clone(),
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(status_text))
            .route("/status", get(status_json))
            .with_state(self.table.clone())
            .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
    }

    pub async fn run(&self, addr: SocketAddr) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Serving status view on http://{}", listener.local_addr()?);
        axum::serve(listener, self.router()).await
    }
}

async fn status_json(State(table): State<SharedTable>) -> Json<TableView> {
    Json(table.read(|t| t.snapshot()))
}

async fn status_text(State(table): State<SharedTable>) -> String {
    table.read(|t| t.render_text())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::models::Stage;
    use crate::render::RenderSink as _;

    #[tokio::test]
    async fn test_status_routes() {
        let mut table = SharedTable::new();
        table.upsert_row("SDR", "SDR", Stage::RunningWorkload, Some(80), "0x1");
        let server = WebApiServer::new(&table);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = server.router();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let view: serde_json::Value = reqwest::get(format!("http://{}/status", addr))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(view["rows"][0]["name"], "SDR");
        assert_eq!(view["rows"][0]["status"], "Running workload");
        assert_eq!(view["rows"][0]["percent"], 80);

        let text = reqwest::get(format!("http://{}/", addr))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(text.contains("Running workload"));
    }
}
