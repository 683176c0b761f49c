//! REST backend for the data access collaborator.
//!
//! Talks JSON over HTTP via `reqwest`. A configured bearer token is
//! forwarded on every request; nothing here enforces authorization.
//! A `404` maps to [`DataAccessError::NotFound`], any other non-success
//! status to [`DataAccessError::Server`] with the `message` field of the
//! error body when present.

use lifeguard_core::config::ApiConfig;
use lifeguard_types::{
    Alert, AlertId, AlertStatus, CenterId, FlagDraft, FlagHistoryPage, FlagId, GeoPoint,
    Lifeguard, LifeguardId, NewShift, SafetyFlag, Shift, ShiftId, ShiftPatch, WeatherSnapshot,
    Zone,
};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::Endpoint;
use crate::error::DataAccessError;

/// Collaborator backed by the REST API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

/// Identifies the record a request targets, for `NotFound` errors.
struct Target {
    endpoint: Endpoint,
    resource: &'static str,
    id: String,
}

impl Target {
    fn new(endpoint: Endpoint, resource: &'static str, id: impl ToString) -> Self {
        Self {
            endpoint,
            resource,
            id: id.to_string(),
        }
    }

    const fn collection(endpoint: Endpoint, resource: &'static str) -> Self {
        Self {
            endpoint,
            resource,
            id: String::new(),
        }
    }
}

impl HttpBackend {
    /// Build a backend from the `api` config section.
    ///
    /// # Errors
    ///
    /// Returns [`DataAccessError::Transport`] if the HTTP client cannot be
    /// constructed (TLS backend initialization).
    pub fn new(config: &ApiConfig) -> Result<Self, DataAccessError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DataAccessError::Transport(format!("HTTP client build failed: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            token: config.token.clone(),
        })
    }

    /// Base URL requests are issued against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send and check the status, returning the successful response.
    async fn send(
        &self,
        builder: RequestBuilder,
        target: &Target,
    ) -> Result<reqwest::Response, DataAccessError> {
        let response = builder.send().await.map_err(|e| {
            DataAccessError::Transport(format!("{} request failed: {e}", target.endpoint))
        })?;

        let status = response.status();
        debug!(endpoint = %target.endpoint, status = status.as_u16(), "collaborator responded");

        if status == StatusCode::NOT_FOUND {
            return Err(DataAccessError::NotFound {
                resource: target.resource,
                id: target.id.clone(),
            });
        }
        if !status.is_success() {
            let message = match response.text().await {
                Ok(body) => extract_message(&body),
                Err(e) => {
                    warn!(
                        endpoint = %target.endpoint,
                        status = status.as_u16(),
                        error = %e,
                        "failed to read error body"
                    );
                    None
                }
            };
            return Err(DataAccessError::Server {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        target: &Target,
    ) -> Result<T, DataAccessError> {
        let response = self.send(builder, target).await?;
        response.json::<T>().await.map_err(|e| {
            DataAccessError::Decode(format!("{} response parse failed: {e}", target.endpoint))
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, target: Target) -> Result<T, DataAccessError> {
        self.fetch(self.request(Method::GET, path), &target).await
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        target: Target,
    ) -> Result<T, DataAccessError> {
        self.fetch(self.request(method, path).json(body), &target).await
    }

    async fn delete(&self, path: &str, target: Target) -> Result<(), DataAccessError> {
        self.send(self.request(Method::DELETE, path), &target)
            .await
            .map(|_| ())
    }

    pub(crate) async fn list_shifts(&self) -> Result<Vec<Shift>, DataAccessError> {
        self.get("/shifts", Target::collection(Endpoint::ListShifts, "shifts"))
            .await
    }

    pub(crate) async fn list_shifts_for_lifeguard(
        &self,
        id: LifeguardId,
    ) -> Result<Vec<Shift>, DataAccessError> {
        self.get(
            &format!("/shifts/lifeguard/{id}"),
            Target::new(Endpoint::ListShiftsForLifeguard, "lifeguard", id),
        )
        .await
    }

    pub(crate) async fn create_shift(&self, req: &NewShift) -> Result<Shift, DataAccessError> {
        self.send_json(
            Method::POST,
            "/shifts",
            req,
            Target::new(Endpoint::CreateShift, "lifeguard", req.lifeguard_id),
        )
        .await
    }

    pub(crate) async fn update_shift(
        &self,
        id: ShiftId,
        patch: &ShiftPatch,
    ) -> Result<Shift, DataAccessError> {
        self.send_json(
            Method::PUT,
            &format!("/shifts/{id}"),
            patch,
            Target::new(Endpoint::UpdateShift, "shift", id),
        )
        .await
    }

    pub(crate) async fn delete_shift(&self, id: ShiftId) -> Result<(), DataAccessError> {
        self.delete(
            &format!("/shifts/{id}"),
            Target::new(Endpoint::DeleteShift, "shift", id),
        )
        .await
    }

    pub(crate) async fn check_in(
        &self,
        id: ShiftId,
        location: GeoPoint,
    ) -> Result<Shift, DataAccessError> {
        let body = serde_json::json!({ "location": location });
        self.send_json(
            Method::POST,
            &format!("/shifts/{id}/check-in"),
            &body,
            Target::new(Endpoint::CheckIn, "shift", id),
        )
        .await
    }

    pub(crate) async fn check_out(&self, id: ShiftId) -> Result<Shift, DataAccessError> {
        self.fetch(
            self.request(Method::POST, &format!("/shifts/{id}/check-out")),
            &Target::new(Endpoint::CheckOut, "shift", id),
        )
        .await
    }

    pub(crate) async fn list_safety_flag_history(
        &self,
        center_id: CenterId,
        page: u32,
        page_size: u32,
    ) -> Result<FlagHistoryPage, DataAccessError> {
        self.get(
            &format!("/safety-flags/center/{center_id}/history?page={page}&limit={page_size}"),
            Target::new(Endpoint::FlagHistory, "center", center_id),
        )
        .await
    }

    pub(crate) async fn create_flag(
        &self,
        center_id: CenterId,
        draft: &FlagDraft,
    ) -> Result<SafetyFlag, DataAccessError> {
        self.send_json(
            Method::POST,
            &format!("/safety-flags/center/{center_id}"),
            draft,
            Target::new(Endpoint::CreateFlag, "center", center_id),
        )
        .await
    }

    pub(crate) async fn update_flag(
        &self,
        id: FlagId,
        draft: &FlagDraft,
    ) -> Result<SafetyFlag, DataAccessError> {
        self.send_json(
            Method::PUT,
            &format!("/safety-flags/{id}"),
            draft,
            Target::new(Endpoint::UpdateFlag, "flag", id),
        )
        .await
    }

    pub(crate) async fn delete_flag(&self, id: FlagId) -> Result<(), DataAccessError> {
        self.delete(
            &format!("/safety-flags/{id}"),
            Target::new(Endpoint::DeleteFlag, "flag", id),
        )
        .await
    }

    pub(crate) async fn list_alerts(&self) -> Result<Vec<Alert>, DataAccessError> {
        self.get("/alerts", Target::collection(Endpoint::ListAlerts, "alerts"))
            .await
    }

    pub(crate) async fn update_alert_status(
        &self,
        id: AlertId,
        status: AlertStatus,
    ) -> Result<Alert, DataAccessError> {
        let body = serde_json::json!({ "status": status });
        self.send_json(
            Method::PUT,
            &format!("/alerts/{id}/status"),
            &body,
            Target::new(Endpoint::UpdateAlertStatus, "alert", id),
        )
        .await
    }

    pub(crate) async fn get_current_weather(
        &self,
        center_id: CenterId,
    ) -> Result<WeatherSnapshot, DataAccessError> {
        self.get(
            &format!("/weather/center/{center_id}/current"),
            Target::new(Endpoint::CurrentWeather, "weather", center_id),
        )
        .await
    }

    pub(crate) async fn list_lifeguards(&self) -> Result<Vec<Lifeguard>, DataAccessError> {
        self.get(
            "/users?role=lifeguard",
            Target::collection(Endpoint::ListLifeguards, "users"),
        )
        .await
    }

    pub(crate) async fn list_zones(&self, center_id: CenterId) -> Result<Vec<Zone>, DataAccessError> {
        self.get(
            &format!("/zones/center/{center_id}"),
            Target::new(Endpoint::ListZones, "center", center_id),
        )
        .await
    }
}

/// Pull a user-facing message out of an error body.
///
/// Accepts `{"message": "..."}` or `{"error": "..."}`; anything else
/// (including a non-JSON body) yields `None`.
fn extract_message(body: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| json.get(key).and_then(serde_json::Value::as_str))
        .filter(|msg| !msg.trim().is_empty())
        .map(ToOwned::to_owned)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn error_body_message_is_extracted() {
        assert_eq!(
            extract_message(r#"{"message":"Shift not found"}"#).as_deref(),
            Some("Shift not found")
        );
        assert_eq!(
            extract_message(r#"{"error":"Check-in window closed"}"#).as_deref(),
            Some("Check-in window closed")
        );
        assert_eq!(extract_message(r#"{"message":"  "}"#), None);
        assert_eq!(extract_message("<html>Bad Gateway</html>"), None);
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let config = ApiConfig {
            base_url: "http://localhost:5000/api/".to_owned(),
            ..ApiConfig::default()
        };
        let backend = HttpBackend::new(&config);
        assert!(backend.is_ok());
        if let Ok(backend) = backend {
            assert_eq!(backend.base_url(), "http://localhost:5000/api");
        }
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        let config = ApiConfig {
            base_url: "http://127.0.0.1:9".to_owned(),
            timeout_ms: 500,
            ..ApiConfig::default()
        };
        let Ok(backend) = HttpBackend::new(&config) else {
            return;
        };
        let result = backend.list_alerts().await;
        assert!(matches!(result, Err(DataAccessError::Transport(_))));
    }

    /// Serve one canned response on a local port and return its base URL.
    async fn serve_once(response: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0_u8; 4096];
            let _ = socket.read(&mut buf).await;
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}")
    }

    fn backend_at(base_url: String) -> HttpBackend {
        HttpBackend::new(&ApiConfig {
            base_url,
            timeout_ms: 2_000,
            ..ApiConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn server_error_carries_body_message() {
        let url = serve_once(
            "HTTP/1.1 409 Conflict\r\ncontent-type: application/json\r\ncontent-length: 36\r\nconnection: close\r\n\r\n{\"message\":\"Shift overlaps another\"}",
        )
        .await;
        let err = backend_at(url).list_alerts().await.unwrap_err();
        assert_eq!(err.server_message(), Some("Shift overlaps another"));
    }

    #[tokio::test]
    async fn unreadable_error_body_falls_back_to_no_message() {
        // Declares more body than it sends, then closes.
        let url = serve_once(
            "HTTP/1.1 500 Internal Server Error\r\ncontent-length: 200\r\nconnection: close\r\n\r\n{\"message\":",
        )
        .await;
        let err = backend_at(url).list_alerts().await.unwrap_err();
        assert_eq!(
            err,
            DataAccessError::Server {
                status: 500,
                message: None,
            }
        );
    }
}
