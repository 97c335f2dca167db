use crate::gui_bridge::model::{self, SharedModel};
use crate::workflow::runner::FrameFeed;
use log::{debug, info, warn};
use pathocore::api::ActiveSettings;
use serde_json::json;
use std::convert::Infallible;
use std::net::SocketAddr;
use warp::http::{header, HeaderValue, Response, StatusCode};
use warp::hyper::{body::Bytes, Body};
use warp::{Filter, Rejection, Reply};

/// Multipart boundary of the video stream.
pub const BOUNDARY: &str = "frame";

fn with_model(
    model: SharedModel,
) -> impl Filter<Extract = (SharedModel,), Error = Infallible> + Clone {
    warp::any().map(move || model.clone())
}

/// The registry API under `/api`.
pub fn routes(
    model: SharedModel,
    frames: FrameFeed,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let catalog_route = warp::path!("api" / "pipelines")
        .and(warp::get())
        .and(with_model(model.clone()))
        .map(|state: SharedModel| {
            let guard = model::read(&state);
            warp::reply::json(guard.catalog())
        });

    let active_route = warp::path!("api" / "pipelines" / "active")
        .and(warp::get())
        .and(with_model(model.clone()))
        .map(|state: SharedModel| {
            let guard = model::read(&state);
            warp::reply::json(guard.active())
        });

    let apply_route = warp::path!("api" / "pipelines" / "active")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_model(model.clone()))
        .map(|settings: ActiveSettings, state: SharedModel| {
            let outcome = model::write(&state).apply(settings);
            match outcome {
                Ok(applied) => {
                    info!(
                        "active pipeline set to {} with {} params",
                        applied.name,
                        applied.params.len()
                    );
                    warp::reply::with_status(warp::reply::json(&applied), StatusCode::OK)
                }
                Err(err) => {
                    warn!("rejected settings: {}", err);
                    warp::reply::with_status(
                        warp::reply::json(&json!({ "detail": err.to_string() })),
                        StatusCode::NOT_FOUND,
                    )
                }
            }
        });

    let metrics_route = warp::path!("api" / "metrics")
        .and(warp::get())
        .and(with_model(model))
        .map(|state: SharedModel| {
            let latest = model::read(&state).latest();
            warp::reply::json(&latest)
        });

    let stream_route = warp::path!("api" / "stream")
        .and(warp::get())
        .and(warp::any().map(move || frames.clone()))
        .map(mjpeg_response);

    catalog_route
        .or(active_route)
        .or(apply_route)
        .or(metrics_route)
        .or(stream_route)
}

/// One multipart part carrying a JPEG, with an explicit length.
pub fn multipart_part(jpeg: &[u8]) -> Vec<u8> {
    let mut part = format!(
        "--{BOUNDARY}\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n",
        jpeg.len()
    )
    .into_bytes();
    part.extend_from_slice(jpeg);
    part.extend_from_slice(b"\r\n");
    part
}

fn mjpeg_response(mut frames: FrameFeed) -> Response<Body> {
    let (mut sender, body) = Body::channel();
    tokio::spawn(async move {
        loop {
            let frame = frames.borrow_and_update().clone();
            if let Some(jpeg) = frame {
                if sender
                    .send_data(Bytes::from(multipart_part(&jpeg)))
                    .await
                    .is_err()
                {
                    debug!("stream client disconnected");
                    break;
                }
            }
            if frames.changed().await.is_err() {
                break;
            }
        }
    });

    let mut response = Response::new(body);
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("multipart/x-mixed-replace; boundary=frame"),
    );
    response
}

/// Serves the registry until the process exits.
pub async fn serve(addr: SocketAddr, model: SharedModel, frames: FrameFeed) {
    info!("registry listening on http://{}/api", addr);
    warp::serve(routes(model, frames)).run(addr).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gui_bridge::model::{shared, RegistryModel};
    use pathocore::api::{MetricsSnapshot, PipelineList};
    use pathocore::client::stream::MjpegReader;
    use serde_json::Value;
    use tokio::sync::watch;

    fn api() -> (
        SharedModel,
        impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone,
    ) {
        let state = shared(RegistryModel::new("cell_count"));
        let (_tx, frames) = watch::channel(None);
        (state.clone(), routes(state, frames))
    }

    #[tokio::test]
    async fn catalog_lists_five_pipelines() {
        let (_, filter) = api();
        let res = warp::test::request()
            .method("GET")
            .path("/api/pipelines")
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let list: PipelineList = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(list.pipelines.len(), 5);
    }

    #[tokio::test]
    async fn posting_unknown_pipeline_is_not_found() {
        let (state, filter) = api();
        let res = warp::test::request()
            .method("POST")
            .path("/api/pipelines/active")
            .json(&json!({"name": "edge_detect", "params": {}}))
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(model::read(&state).active().name, "cell_count");
    }

    #[tokio::test]
    async fn posted_settings_are_echoed_and_stored() {
        let (_, filter) = api();
        let body = json!({"name": "nottingham_tubule", "params": {"threshold": 0.7}});
        let res = warp::test::request()
            .method("POST")
            .path("/api/pipelines/active")
            .json(&body)
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(serde_json::from_slice::<Value>(res.body()).unwrap(), body);

        let res = warp::test::request()
            .method("GET")
            .path("/api/pipelines/active")
            .reply(&filter)
            .await;
        assert_eq!(serde_json::from_slice::<Value>(res.body()).unwrap(), body);
    }

    #[tokio::test]
    async fn metrics_start_empty() {
        let (_, filter) = api();
        let res = warp::test::request()
            .method("GET")
            .path("/api/metrics")
            .reply(&filter)
            .await;
        let snapshot: MetricsSnapshot = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(snapshot, MetricsSnapshot::default());
    }

    #[test]
    fn parts_split_back_into_frames() {
        let mut stream = multipart_part(b"\xFF\xD8first");
        stream.extend(multipart_part(b"--frame inside body"));
        let mut reader = MjpegReader::new(BOUNDARY);
        assert_eq!(
            reader.push(&stream),
            vec![b"\xFF\xD8first".to_vec(), b"--frame inside body".to_vec()]
        );
    }
}
