use std::time::Duration;
use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;

use crate::models::chart::ChartResponse;
use crate::models::position::Position;
use crate::models::ranking::TopRanker;
use crate::services::error::ApiError;
use crate::services::logger::{log_error, log_info};

const POPUP_STATUS_PATH: &str = "/apiEsc/popup-status";
const STOCK_CHART_PATH: &str = "/apiEsc/stock-chart-data";
const RANK_TOP1_PATH: &str = "/apiEsc/total-rank-top1";

/// Backend the report reads from.
#[async_trait]
pub trait ReportSource: Send + Sync {
    /// Positions held by `user_id`.
    async fn fetch_positions(&self, user_id: &str) -> Result<Vec<Position>, ApiError>;

    /// Historical closes for one ticker. Error-flagged payloads are returned
    /// as-is; the caller decides what to drop.
    async fn fetch_chart(&self, code: &str) -> Result<ChartResponse, ApiError>;

    /// Global profit leader for the banner.
    async fn fetch_top_ranker(&self) -> Result<TopRanker, ApiError>;
}

pub struct EscClient {
    client: reqwest::Client,
    base_url: String,
}

impl EscClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<EscClient, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(EscClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            log_error("HTTP Status", &format!("{} -> {}", path, status)).unwrap_or(());
            return Err(ApiError::Status(status.as_u16()));
        }

        let response_text = response.text().await?;
        match serde_json::from_str::<T>(&response_text) {
            Ok(parsed) => Ok(parsed),
            Err(e) => {
                log_error("Parse Error", &format!("{}: {}", path, e)).unwrap_or(());
                Err(e.into())
            }
        }
    }
}

/// Millisecond timestamp appended as `t` so intermediaries never serve a cached body.
fn cache_buster() -> String {
    Utc::now().timestamp_millis().to_string()
}

#[async_trait]
impl ReportSource for EscClient {
    async fn fetch_positions(&self, user_id: &str) -> Result<Vec<Position>, ApiError> {
        log_info("Positions", &format!("Fetching positions for {}", user_id)).unwrap_or(());
        let positions: Vec<Position> = self
            .get_json(POPUP_STATUS_PATH, &[("in_userId", user_id)])
            .await?;
        log_info("Positions", &format!("Received {} positions", positions.len())).unwrap_or(());
        Ok(positions)
    }

    async fn fetch_chart(&self, code: &str) -> Result<ChartResponse, ApiError> {
        let t = cache_buster();
        self.get_json(STOCK_CHART_PATH, &[("in_code", code), ("t", t.as_str())])
            .await
    }

    async fn fetch_top_ranker(&self) -> Result<TopRanker, ApiError> {
        let t = cache_buster();
        let ranker: TopRanker = self.get_json(RANK_TOP1_PATH, &[("t", t.as_str())]).await?;
        if ranker.is_error() {
            let message = ranker.message.clone().unwrap_or_default();
            log_error("Ranking API Error", &message).unwrap_or(());
            return Err(ApiError::Server(message));
        }
        Ok(ranker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serves a single canned HTTP response on a local port and hands back
    /// the request head the client sent.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        crate::services::logger::init(std::env::temp_dir().join("stock_report_test.log"));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap_or(());
            String::from_utf8_lossy(&head).into_owned()
        });

        (base_url, handle)
    }

    fn request_line(head: &str) -> &str {
        head.lines().next().unwrap_or("")
    }

    #[tokio::test]
    async fn fetch_positions_queries_popup_status_for_user() {
        let body = r#"[{"date":"2025-01-02","name":"삼성전자","ticker":"005930.KS","code":"005930.KS","buyPrice":70000.0,"quantity":10,"currentPrice":75000.0,"returnRate":7.1}]"#;
        let (base_url, server) = serve_once("200 OK", body).await;
        let client = EscClient::new(&base_url, 5).unwrap();

        let positions = client.fetch_positions("user1").await.unwrap();
        let head = server.await.unwrap();

        assert!(request_line(&head).starts_with("GET /apiEsc/popup-status?in_userId=user1 "));
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].code, "005930.KS");
        assert_eq!(positions[0].quantity, 10);
    }

    #[tokio::test]
    async fn fetch_chart_sends_code_and_cache_buster() {
        let body = r#"{"dates":["2025-01-02","2025-01-03"],"closes":[700000000,null]}"#;
        let (base_url, server) = serve_once("200 OK", body).await;
        let client = EscClient::new(&base_url, 5).unwrap();

        let chart = client.fetch_chart("005930.KS").await.unwrap();
        let line = request_line(&server.await.unwrap()).to_string();

        assert!(line.starts_with("GET /apiEsc/stock-chart-data?"));
        assert!(line.contains("in_code=005930.KS"));
        assert!(line.contains("&t="));
        assert_eq!(chart.dates.len(), 2);
        assert_eq!(chart.closes[1], None);
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let (base_url, server) = serve_once("500 Internal Server Error", "oops").await;
        let client = EscClient::new(&base_url, 5).unwrap();

        let result = client.fetch_chart("A").await;
        server.await.unwrap();

        assert!(matches!(result, Err(ApiError::Status(500))));
    }

    #[tokio::test]
    async fn unparsable_body_is_a_parse_error() {
        let (base_url, server) = serve_once("200 OK", "<html>not json</html>").await;
        let client = EscClient::new(&base_url, 5).unwrap();

        let result = client.fetch_positions("user1").await;
        server.await.unwrap();

        assert!(matches!(result, Err(ApiError::Parse(_))));
    }

    #[tokio::test]
    async fn ranking_error_flag_becomes_server_error() {
        let (base_url, server) = serve_once("200 OK", r#"{"error":true,"message":"es down"}"#).await;
        let client = EscClient::new(&base_url, 5).unwrap();

        let result = client.fetch_top_ranker().await;
        let line = request_line(&server.await.unwrap()).to_string();

        assert!(line.starts_with("GET /apiEsc/total-rank-top1?t="));
        match result {
            Err(ApiError::Server(message)) => assert_eq!(message, "es down"),
            other => panic!("expected server error, got {:?}", other),
        }
    }

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let client = EscClient::new("http://localhost:8000/", 5).unwrap();
        assert_eq!(client.base_url, "http://localhost:8000");
    }

    #[test]
    fn cache_buster_is_numeric() {
        assert!(cache_buster().parse::<i64>().is_ok());
    }
}
