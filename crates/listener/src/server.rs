//! HTTP server that feeds CloudEvents to one registered handler.
//!
//! Every `POST` (on any path) is one event delivery. The status code is the
//! invocation outcome the delivery runtime sees:
//!
//! | Outcome | Status |
//! |---------|--------|
//! | handler succeeded | `200 OK` |
//! | request is not a CloudEvent | `400 Bad Request` |
//! | handler failed | `500 Internal Server Error`, error text as body |

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{error, info, info_span, warn, Instrument};

use crate::{CloudEvent, CloudEventHandler};

/// Builds the router serving `handler`.
pub fn router(handler: Arc<dyn CloudEventHandler>) -> Router {
    Router::new()
        .route("/", post(receive))
        .route("/*path", post(receive))
        .with_state(handler)
}

async fn receive(
    State(handler): State<Arc<dyn CloudEventHandler>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let event = match CloudEvent::from_http(&headers, &body) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "Rejected request that is not a CloudEvent");
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    let span = info_span!(
        "cloud_event",
        event_id = %event.id,
        event_type = %event.event_type,
        source = %event.source,
    );

    async move {
        match handler.handle(event).await {
            Ok(()) => StatusCode::OK.into_response(),
            Err(e) => {
                error!(error = %e, "Event handling failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
            }
        }
    }
    .instrument(span)
    .await
}

/// Binds `addr` and serves `router` until Ctrl-C or SIGTERM.
pub async fn serve(addr: SocketAddr, router: Router) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Listening for CloudEvents");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::HandlerError;

    #[derive(Default)]
    struct Recorder {
        fail_with: Option<String>,
        seen: Mutex<Vec<CloudEvent>>,
    }

    #[async_trait]
    impl CloudEventHandler for Recorder {
        async fn handle(&self, event: CloudEvent) -> Result<(), HandlerError> {
            self.seen.lock().unwrap().push(event);
            match &self.fail_with {
                Some(message) => Err(message.clone().into()),
                None => Ok(()),
            }
        }
    }

    fn binary_event(uri: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("ce-id", "evt-1")
            .header("ce-source", "//pubsub.googleapis.com/projects/p/topics/t")
            .header("ce-type", "google.cloud.pubsub.topic.v1.messagePublished")
            .header("ce-specversion", "1.0")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn successful_handler_returns_ok() {
        let recorder = Arc::new(Recorder::default());
        let app = router(recorder.clone());

        let response = app.oneshot(binary_event("/", r#"{"message":{}}"#)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].id.as_str(), "evt-1");
        assert_eq!(seen[0].data, br#"{"message":{}}"#.to_vec());
    }

    #[tokio::test]
    async fn any_path_is_accepted() {
        let app = router(Arc::new(Recorder::default()));

        let response = app
            .oneshot(binary_event("/projects/p/functions/GoogleChatAlert", "{}"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn handler_error_is_a_server_error_with_its_text() {
        let recorder = Arc::new(Recorder {
            fail_with: Some("received an error response from Google Chat: code 400".to_string()),
            ..Recorder::default()
        });
        let app = router(recorder);

        let response = app.oneshot(binary_event("/", "{}")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(response).await.contains("code 400"));
    }

    #[tokio::test]
    async fn incomplete_cloud_event_is_a_bad_request() {
        let recorder = Arc::new(Recorder::default());
        let app = router(recorder.clone());
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header("ce-id", "evt-1")
            .body(Body::from("{}"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(recorder.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_is_not_an_event_delivery() {
        let app = router(Arc::new(Recorder::default()));
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
