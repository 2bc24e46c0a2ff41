use super::*;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde_json::json;
use shared::error::ProtocolViolation;
use tokio::{
    net::TcpListener,
    sync::{oneshot, Mutex},
};

#[derive(Clone)]
struct CaptureState {
    tx: Arc<Mutex<Option<oneshot::Sender<PredictionRequest>>>>,
}

async fn handle_predict(
    State(state): State<CaptureState>,
    Json(request): Json<PredictionRequest>,
) -> Json<Value> {
    if let Some(tx) = state.tx.lock().await.take() {
        let _ = tx.send(request);
    }
    Json(json!({
        "genre": "Country",
        "probabilities": [
            { "genre": "Country", "value": 0.7 },
            { "genre": "Pop", "value": 0.3 }
        ]
    }))
}

async fn spawn_service(router: Router) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    Url::parse(&format!("http://{addr}")).expect("url")
}

async fn spawn_fixed_response(status: StatusCode, body: &'static str) -> Url {
    let router = Router::new().route(
        "/lyrics/predict",
        post(move || async move { (status, body).into_response() }),
    );
    spawn_service(router).await
}

fn client(server_url: &Url) -> HttpPredictionService {
    HttpPredictionService::new(server_url, Duration::from_secs(5)).expect("client")
}

fn request(lyrics: &str) -> PredictionRequest {
    PredictionRequest {
        lyrics: lyrics.to_string(),
    }
}

#[tokio::test]
async fn posts_lyrics_as_json_and_parses_prediction() {
    let (tx, rx) = oneshot::channel();
    let router = Router::new()
        .route("/lyrics/predict", post(handle_predict))
        .with_state(CaptureState {
            tx: Arc::new(Mutex::new(Some(tx))),
        });
    let server_url = spawn_service(router).await;

    let response = client(&server_url)
        .predict(&request("dirt road, pickup truck"))
        .await
        .expect("prediction");

    let received = rx.await.expect("request captured");
    assert_eq!(received.lyrics, "dirt road, pickup truck");
    assert_eq!(response.genre, "Country");
    assert_eq!(response.probabilities.len(), 2);
    assert_eq!(response.probabilities[1].genre, "Pop");
}

#[tokio::test]
async fn error_status_reports_service_message() {
    let server_url = spawn_fixed_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        r#"{"status":500,"error":"Internal Server Error","message":"pipeline not trained"}"#,
    )
    .await;

    let err = client(&server_url)
        .predict(&request("lyrics"))
        .await
        .expect_err("must fail");
    assert_eq!(
        err,
        PredictionError::Status {
            status: 500,
            detail: "pipeline not trained".to_string()
        }
    );
}

#[tokio::test]
async fn error_status_without_json_body_uses_reason_phrase() {
    let server_url = spawn_fixed_response(StatusCode::SERVICE_UNAVAILABLE, "down").await;

    let err = client(&server_url)
        .predict(&request("lyrics"))
        .await
        .expect_err("must fail");
    assert_eq!(
        err,
        PredictionError::Status {
            status: 503,
            detail: "Service Unavailable".to_string()
        }
    );
}

#[tokio::test]
async fn non_json_success_body_is_malformed() {
    let server_url = spawn_fixed_response(StatusCode::OK, "<html>oops</html>").await;

    let err = client(&server_url)
        .predict(&request("lyrics"))
        .await
        .expect_err("must fail");
    assert!(matches!(err, PredictionError::Malformed { .. }), "{err:?}");
}

#[tokio::test]
async fn probabilities_that_are_not_a_list_are_rejected() {
    let server_url = spawn_fixed_response(
        StatusCode::OK,
        r#"{"genre":"Rock","probabilities":"not an array"}"#,
    )
    .await;

    let err = client(&server_url)
        .predict(&request("lyrics"))
        .await
        .expect_err("must fail");
    assert_eq!(
        err,
        PredictionError::InvalidResponse(ProtocolViolation::ProbabilitiesNotAList)
    );
    assert_eq!(err.to_string(), "Invalid response from the server");
}

#[tokio::test]
async fn refused_connection_is_a_connect_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let server_url = Url::parse(&format!("http://{addr}")).expect("url");

    let err = client(&server_url)
        .predict(&request("lyrics"))
        .await
        .expect_err("must fail");
    assert!(
        matches!(
            err,
            PredictionError::Transport {
                cause: TransportCause::Connect,
                ..
            }
        ),
        "{err:?}"
    );
}

#[tokio::test]
async fn slow_service_times_out() {
    let router = Router::new().route(
        "/lyrics/predict",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            "{}"
        }),
    );
    let server_url = spawn_service(router).await;
    let client =
        HttpPredictionService::new(&server_url, Duration::from_millis(100)).expect("client");

    let err = client
        .predict(&request("lyrics"))
        .await
        .expect_err("must time out");
    assert!(
        matches!(
            err,
            PredictionError::Transport {
                cause: TransportCause::Timeout,
                ..
            }
        ),
        "{err:?}"
    );
}

#[test]
fn endpoint_keeps_mount_prefix() {
    let root = Url::parse("http://localhost:8080").expect("url");
    assert_eq!(
        endpoint_url(&root).expect("endpoint").as_str(),
        "http://localhost:8080/lyrics/predict"
    );

    let mounted = Url::parse("https://example.test/api").expect("url");
    assert_eq!(
        endpoint_url(&mounted).expect("endpoint").as_str(),
        "https://example.test/api/lyrics/predict"
    );
}

#[test]
fn endpoint_requires_http_scheme() {
    let url = Url::parse("ftp://example.test/").expect("url");
    let err = endpoint_url(&url).expect_err("must fail");
    assert!(err.to_string().contains("http or https"));
}
