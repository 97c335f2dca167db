use crate::api::{ActiveSettings, MetricsSnapshot, PipelineList};
use crate::client::stream::MjpegReader;
use crate::prelude::{ClientError, ClientResult};
use log::debug;
use reqwest::header::CONTENT_TYPE;
use reqwest::Response;
use std::collections::VecDeque;
use std::time::Duration;

/// HTTP client for the pipeline registry collaborator.
///
/// Every operation is a single request; the client keeps no state beyond its
/// connection pool.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    http: reqwest::Client,
    stream_http: reqwest::Client,
    base_url: String,
}

impl RegistryClient {
    pub fn new(base_url: &str, timeout: Duration) -> ClientResult<Self> {
        let base_url = base_url.trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let stream_http = reqwest::Client::builder().connect_timeout(timeout).build()?;
        Ok(Self {
            http,
            stream_http,
            base_url: base_url.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn stream_url(&self) -> String {
        self.endpoint("stream")
    }

    pub async fn list_pipelines(&self) -> ClientResult<PipelineList> {
        let response = self.http.get(self.endpoint("pipelines")).send().await?;
        Ok(checked(response).await?.json().await?)
    }

    pub async fn active_settings(&self) -> ClientResult<ActiveSettings> {
        let response = self.http.get(self.endpoint("pipelines/active")).send().await?;
        Ok(checked(response).await?.json().await?)
    }

    /// Makes `settings` the active configuration and returns what the
    /// registry applied.
    pub async fn apply_settings(&self, settings: &ActiveSettings) -> ClientResult<ActiveSettings> {
        debug!("posting settings for pipeline {}", settings.name);
        let response = self
            .http
            .post(self.endpoint("pipelines/active"))
            .json(settings)
            .send()
            .await?;
        Ok(checked(response).await?.json().await?)
    }

    pub async fn latest_metrics(&self) -> ClientResult<MetricsSnapshot> {
        let response = self.http.get(self.endpoint("metrics")).send().await?;
        Ok(checked(response).await?.json().await?)
    }

    /// Opens the live video stream.
    pub async fn open_stream(&self) -> ClientResult<FrameStream> {
        let response = checked(self.stream_http.get(self.stream_url()).send().await?).await?;
        let reader = MjpegReader::from_content_type(
            response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
        );
        Ok(FrameStream {
            response,
            reader,
            pending: VecDeque::new(),
        })
    }
}

async fn checked(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::Status { status, body })
    }
}

/// Image frames read from an open video stream.
pub struct FrameStream {
    response: Response,
    reader: MjpegReader,
    pending: VecDeque<Vec<u8>>,
}

impl FrameStream {
    /// Next complete frame, or `None` once the server closes the stream.
    pub async fn next_frame(&mut self) -> ClientResult<Option<Vec<u8>>> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                return Ok(Some(frame));
            }
            match self.response.chunk().await? {
                Some(chunk) => self.pending.extend(self.reader.push(&chunk)),
                None => return Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::net::SocketAddr;
    use warp::http::StatusCode;
    use warp::Filter;

    fn catalog() -> serde_json::Value {
        json!({"pipelines": [{
            "name": "cell_count",
            "display_name": "Cell Count Overlay",
            "description": "Detects and counts cells",
            "default_params": {"threshold": 128, "show_count": true},
            "param_descriptions": {}
        }]})
    }

    fn serve() -> SocketAddr {
        let list = warp::path!("api" / "pipelines")
            .and(warp::get())
            .map(|| warp::reply::json(&catalog()));
        let get_active = warp::path!("api" / "pipelines" / "active")
            .and(warp::get())
            .map(|| {
                warp::reply::json(&json!({
                    "name": "cell_count",
                    "params": {"threshold": 100, "show_count": false}
                }))
            });
        let post_active = warp::path!("api" / "pipelines" / "active")
            .and(warp::post())
            .and(warp::body::json())
            .map(|settings: ActiveSettings| {
                if settings.name == "cell_count" {
                    warp::reply::with_status(warp::reply::json(&settings), StatusCode::OK)
                } else {
                    warp::reply::with_status(
                        warp::reply::json(
                            &json!({"detail": format!("Pipeline '{}' not found", settings.name)}),
                        ),
                        StatusCode::NOT_FOUND,
                    )
                }
            });
        let metrics = warp::path!("api" / "metrics").and(warp::get()).map(|| {
            warp::reply::json(&json!({
                "timestamp": 12.5,
                "pipeline": "cell_count",
                "metrics": {"cell_count": 42}
            }))
        });
        let stream = warp::path!("api" / "stream").and(warp::get()).map(|| {
            let mut body = Vec::new();
            for frame in [&b"one"[..], &b"two"[..]] {
                body.extend_from_slice(b"--frame\r\nContent-Type: image/jpeg\r\n");
                let length = format!("Content-Length: {}\r\n\r\n", frame.len());
                body.extend_from_slice(length.as_bytes());
                body.extend_from_slice(frame);
                body.extend_from_slice(b"\r\n");
            }
            warp::http::Response::builder()
                .header("content-type", "multipart/x-mixed-replace; boundary=frame")
                .body(body)
        });

        let routes = list.or(get_active).or(post_active).or(metrics).or(stream);
        let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        addr
    }

    fn client(addr: SocketAddr) -> RegistryClient {
        RegistryClient::new(&format!("http://{addr}/api/"), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn rejects_non_http_base_url() {
        assert!(matches!(
            RegistryClient::new("localhost:8000/api", Duration::from_secs(1)),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[test]
    fn endpoints_join_base_path() {
        let client = RegistryClient::new("http://rig.local/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.stream_url(), "http://rig.local/api/stream");
        assert_eq!(client.endpoint("/metrics"), "http://rig.local/api/metrics");
    }

    #[tokio::test]
    async fn fetches_catalog_and_active_settings() {
        let client = client(serve());
        let catalog = client.list_pipelines().await.unwrap();
        assert_eq!(catalog.pipelines[0].name, "cell_count");
        let active = client.active_settings().await.unwrap();
        assert_eq!(active.params["threshold"], json!(100));
    }

    #[tokio::test]
    async fn apply_echoes_settings_and_surfaces_rejection() {
        let client = client(serve());
        let settings: ActiveSettings = serde_json::from_value(json!({
            "name": "cell_count",
            "params": {"threshold": 100, "show_count": true}
        }))
        .unwrap();
        assert_eq!(client.apply_settings(&settings).await.unwrap(), settings);

        let unknown = ActiveSettings::new("retired", Default::default());
        match client.apply_settings(&unknown).await {
            Err(ClientError::Status { status, body }) => {
                assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
                assert!(body.contains("retired"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn reads_metrics_snapshot() {
        let client = client(serve());
        let snapshot = client.latest_metrics().await.unwrap();
        assert_eq!(snapshot.timestamp, 12.5);
        assert_eq!(snapshot.metrics["cell_count"], json!(42));
    }

    #[tokio::test]
    async fn stream_yields_frames_until_close() {
        let client = client(serve());
        let mut stream = client.open_stream().await.unwrap();
        assert_eq!(stream.next_frame().await.unwrap(), Some(b"one".to_vec()));
        assert_eq!(stream.next_frame().await.unwrap(), Some(b"two".to_vec()));
        assert_eq!(stream.next_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn unreachable_registry_is_an_http_error() {
        let client = RegistryClient::new("http://127.0.0.1:9/api", Duration::from_secs(2)).unwrap();
        assert!(matches!(client.latest_metrics().await, Err(ClientError::Http(_))));
    }
}
