use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;

use crate::control::error::{ControlError, ControlResult};
use crate::control::types::{
    ArchivedScan, ConfigSection, ConfigValue, HistoryEntry, SearchQuery, Source, Telemetry,
};
use crate::monitor::status::StatusReport;
use crate::scan::request::{ScanId, ScanRequest};
use crate::schedule::snapshot::ScheduleSnapshot;

/// Operations the station's control server offers to the console.
///
/// Implementors may write these as `async fn`; the returned futures must be `Send` so
/// the monitor and sidebar tasks can be spawned on the multi-threaded runtime.
pub trait ControlApi: Send + Sync + 'static {
    fn submit_scan(
        &self,
        request: &ScanRequest,
    ) -> impl Future<Output = ControlResult<ScheduleSnapshot>> + Send;

    fn schedule(&self) -> impl Future<Output = ControlResult<ScheduleSnapshot>> + Send;

    fn cancel_scan(
        &self,
        id: &ScanId,
    ) -> impl Future<Output = ControlResult<ScheduleSnapshot>> + Send;

    fn status(&self) -> impl Future<Output = ControlResult<StatusReport>> + Send;

    fn acknowledge(&self, report: &StatusReport) -> impl Future<Output = ControlResult<()>> + Send;

    fn station_status(&self) -> impl Future<Output = ControlResult<Telemetry>> + Send;

    fn sources(&self) -> impl Future<Output = ControlResult<Vec<Source>>> + Send;

    fn add_source(
        &self,
        source: &Source,
    ) -> impl Future<Output = ControlResult<Vec<Source>>> + Send;

    fn remove_source(&self, name: &str) -> impl Future<Output = ControlResult<Vec<Source>>> + Send;

    fn config_section(
        &self,
        section: ConfigSection,
    ) -> impl Future<Output = ControlResult<Vec<ConfigValue>>> + Send;

    fn update_config_section(
        &self,
        section: ConfigSection,
        values: &[String],
    ) -> impl Future<Output = ControlResult<Vec<ConfigValue>>> + Send;

    fn history(&self) -> impl Future<Output = ControlResult<Vec<HistoryEntry>>> + Send;

    fn search_scans(
        &self,
        query: &SearchQuery,
    ) -> impl Future<Output = ControlResult<Vec<ArchivedScan>>> + Send;

    /// Zip archive of the scans' data files.
    fn download_scans(&self, ids: &[ScanId]) -> impl Future<Output = ControlResult<Vec<u8>>> + Send;

    fn delete_scans(&self, ids: &[ScanId]) -> impl Future<Output = ControlResult<()>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpControlClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpControlClient {
    pub fn new(base_url: &str, timeout: Duration) -> ControlResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> ControlResult<T> {
        let response = checked(request.send().await?).await?;
        Ok(response.json().await?)
    }
}

async fn checked(response: reqwest::Response) -> ControlResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ControlError::Status {
        status: status.as_u16(),
        body,
    })
}

impl ControlApi for HttpControlClient {
    async fn submit_scan(&self, request: &ScanRequest) -> ControlResult<ScheduleSnapshot> {
        log::debug!("submitting scan '{}'", request.name);
        self.send(self.client.post(self.url("/submitscan")).json(request))
            .await
    }

    async fn schedule(&self) -> ControlResult<ScheduleSnapshot> {
        self.send(self.client.post(self.url("/schedule"))).await
    }

    async fn cancel_scan(&self, id: &ScanId) -> ControlResult<ScheduleSnapshot> {
        log::debug!("dequeueing scan {}", id);
        self.send(
            self.client
                .post(self.url("/deschedulescan"))
                .body(id.to_string()),
        )
        .await
    }

    async fn status(&self) -> ControlResult<StatusReport> {
        self.send(self.client.get(self.url("/scanstatus"))).await
    }

    async fn acknowledge(&self, report: &StatusReport) -> ControlResult<()> {
        let response = self
            .client
            .post(self.url("/scanstatus"))
            .json(&report.acknowledgement())
            .send()
            .await?;
        checked(response).await?;
        Ok(())
    }

    async fn station_status(&self) -> ControlResult<Telemetry> {
        self.send(self.client.post(self.url("/status"))).await
    }

    async fn sources(&self) -> ControlResult<Vec<Source>> {
        self.send(self.client.post(self.url("/sources"))).await
    }

    async fn add_source(&self, source: &Source) -> ControlResult<Vec<Source>> {
        self.send(self.client.post(self.url("/uploadsource")).json(source))
            .await
    }

    async fn remove_source(&self, name: &str) -> ControlResult<Vec<Source>> {
        self.send(
            self.client
                .post(self.url("/removesource"))
                .body(name.to_string()),
        )
        .await
    }

    async fn config_section(&self, section: ConfigSection) -> ControlResult<Vec<ConfigValue>> {
        self.send(
            self.client
                .post(self.url("/getconfig"))
                .body(section.to_string()),
        )
        .await
    }

    async fn update_config_section(
        &self,
        section: ConfigSection,
        values: &[String],
    ) -> ControlResult<Vec<ConfigValue>> {
        let mut body = vec![ConfigValue::String(section.to_string())];
        body.extend(values.iter().cloned().map(ConfigValue::String));
        self.send(self.client.post(self.url("/updateconfig")).json(&body))
            .await
    }

    async fn history(&self) -> ControlResult<Vec<HistoryEntry>> {
        self.send(self.client.post(self.url("/gethistory"))).await
    }

    async fn search_scans(&self, query: &SearchQuery) -> ControlResult<Vec<ArchivedScan>> {
        self.send(self.client.post(self.url("/searchscans")).json(query))
            .await
    }

    async fn download_scans(&self, ids: &[ScanId]) -> ControlResult<Vec<u8>> {
        let response = self
            .client
            .post(self.url("/downloadscans"))
            .json(ids)
            .send()
            .await?;
        let archive = checked(response).await?.bytes().await?;
        log::debug!("downloaded {} bytes for {} scans", archive.len(), ids.len());
        Ok(archive.to_vec())
    }

    async fn delete_scans(&self, ids: &[ScanId]) -> ControlResult<()> {
        let response = self
            .client
            .post(self.url("/deletescans"))
            .json(ids)
            .send()
            .await?;
        let reply = checked(response).await?.text().await?;
        match reply.trim() {
            "completed" => Ok(()),
            "notadmin" => Err(ControlError::NotAdmin),
            other => Err(ControlError::Unexpected(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::status::ReportCode;
    use axum::extract::State;
    use axum::http::{Method, StatusCode, Uri};
    use axum::response::{IntoResponse, Response};
    use axum::{Json, Router};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    type Seen = Arc<Mutex<Vec<(String, String, String)>>>;

    async fn control_stub(
        State(seen): State<Seen>,
        method: Method,
        uri: Uri,
        body: String,
    ) -> Response {
        seen.lock()
            .unwrap()
            .push((method.to_string(), uri.path().to_string(), body));
        match uri.path() {
            "/schedule" | "/submitscan" | "/deschedulescan" => Json(json!([{
                "id": 7, "name": "cygnus", "type": "track", "source": "Cygnus A",
                "ras": "19h59m28s", "dec": "40d44m02s",
                "starttime": "20:00:00", "endtime": "22:00:00",
                "freqlower": 1400.0, "frequpper": 1420.0, "current": true
            }]))
            .into_response(),
            "/scanstatus" if method == Method::GET => {
                Json(json!({"id": 42, "code": "timeout", "az": 12.5})).into_response()
            }
            "/scanstatus" => Json(json!({"id": 42, "code": "ok"})).into_response(),
            "/status" => {
                Json(json!({"az": 10.0, "al": 20.0, "status": "noactive"})).into_response()
            }
            "/getconfig" | "/updateconfig" => {
                Json(json!(["SRT", 42.5, -71.0, 100])).into_response()
            }
            "/gethistory" => Json(json!([
                {"name": "cygnus", "type": "track", "date": "4/2/2024", "status": "complete"},
                {"name": "sweep", "type": "drift", "date": "4/3/2024", "status": "timeout"}
            ]))
            .into_response(),
            "/searchscans" => Json(json!([{"id": 12, "name": "cygnus", "date": "4/2/2024"}]))
                .into_response(),
            "/downloadscans" => b"PK\x03\x04".to_vec().into_response(),
            "/deletescans" => "notadmin".into_response(),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        }
    }

    async fn start_stub() -> (HttpControlClient, Seen) {
        let seen: Seen = Arc::default();
        let app = Router::new().fallback(control_stub).with_state(seen.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        let client =
            HttpControlClient::new(&format!("http://{}/", addr), Duration::from_secs(5)).unwrap();
        (client, seen)
    }

    #[tokio::test]
    async fn schedule_round_trips_server_shape() {
        let (client, seen) = start_stub().await;
        let snapshot = client.schedule().await.unwrap();
        assert_eq!(snapshot.scans.len(), 1);
        assert_eq!(snapshot.scans[0].id, ScanId::Number(7));
        assert!(snapshot.scans[0].current);
        assert_eq!(snapshot.scans[0].freq_lower.as_deref(), Some("1400"));

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].0, "POST");
        assert_eq!(seen[0].1, "/schedule");
    }

    #[tokio::test]
    async fn cancel_sends_raw_id() {
        let (client, seen) = start_stub().await;
        client.cancel_scan(&ScanId::Number(42)).await.unwrap();
        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].1, "/deschedulescan");
        assert_eq!(seen[0].2, "42");
    }

    #[tokio::test]
    async fn status_is_fetched_and_acknowledged_on_same_path() {
        let (client, seen) = start_stub().await;
        let report = client.status().await.unwrap();
        assert_eq!(report.code, ReportCode::Timeout);
        assert_eq!(report.id, Some(ScanId::Number(42)));
        assert_eq!(report.telemetry.az, Some(12.5));

        client.acknowledge(&report).await.unwrap();
        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].0, "GET");
        assert_eq!(seen[1].0, "POST");
        assert_eq!(seen[1].1, "/scanstatus");
        let echoed: serde_json::Value = serde_json::from_str(&seen[1].2).unwrap();
        assert_eq!(echoed, json!({"id": 42, "code": "timeout"}));
    }

    #[tokio::test]
    async fn config_update_prefixes_section() {
        let (client, seen) = start_stub().await;
        let values = ["SRT".to_string(), "42.5".into(), "-71".into(), "100".into()];
        let echoed = client
            .update_config_section(ConfigSection::NameLoc, &values)
            .await
            .unwrap();
        assert_eq!(echoed.len(), 4);
        let seen = seen.lock().unwrap();
        let body: serde_json::Value = serde_json::from_str(&seen[0].2).unwrap();
        assert_eq!(body, json!(["nameloc", "SRT", "42.5", "-71", "100"]));
    }

    #[tokio::test]
    async fn history_and_search_use_station_shapes() {
        let (client, seen) = start_stub().await;
        let history = client.history().await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[0].completed());
        assert_eq!(history[1].status, "timeout");

        let query = SearchQuery {
            name: "cygnus".to_string(),
            month: "4".to_string(),
            year: "2024".to_string(),
        };
        let found = client.search_scans(&query).await.unwrap();
        assert_eq!(found[0].id, ScanId::Number(12));

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].1, "/gethistory");
        let body: serde_json::Value = serde_json::from_str(&seen[1].2).unwrap();
        assert_eq!(body, json!({"name": "cygnus", "month": "4", "year": "2024"}));
    }

    #[tokio::test]
    async fn download_returns_archive_bytes_and_delete_reports_refusal() {
        let (client, seen) = start_stub().await;
        let ids = [ScanId::Number(12), ScanId::Number(13)];
        let archive = client.download_scans(&ids).await.unwrap();
        assert!(archive.starts_with(b"PK"));

        assert!(matches!(client.delete_scans(&ids).await, Err(ControlError::NotAdmin)));
        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].1, "/downloadscans");
        assert_eq!(seen[0].2, "[12,13]");
        assert_eq!(seen[1].1, "/deletescans");
    }

    #[tokio::test]
    async fn non_success_becomes_status_error() {
        let (client, _) = start_stub().await;
        match client.sources().await {
            Err(ControlError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn unreachable_server_is_http_error() {
        let client =
            HttpControlClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        assert!(matches!(client.status().await, Err(ControlError::Http(_))));
    }
}
