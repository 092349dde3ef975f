use std::convert::Infallible;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse, Response,
    },
    Json,
};
use futures::{stream, Stream, StreamExt};
use tracing::{error, info};

use super::types::{ErrorResponse, HealthResponse, VerifyRequest, EMPTY_INPUT_MESSAGE};
use crate::state::AppState;
use crate::verify::Progress;

pub async fn index_handler() -> Html<&'static str> {
    Html(include_str!("index.html"))
}

pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

fn bad_request() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(EMPTY_INPUT_MESSAGE)),
    )
        .into_response()
}

/// Run the pipeline and answer with the whole report.
pub async fn verify_handler(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Response {
    let Some(statement) = request.statement() else {
        return bad_request();
    };

    let Ok(_permit) = state.run_gate.acquire().await else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::new("Server is shutting down")),
        )
            .into_response();
    };

    match state.pipeline.run(statement, &Progress::none()).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => {
            error!(statement, error = %format!("{:#}", e), "Verification run failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse::new(format!("{:#}", e))),
            )
                .into_response()
        }
    }
}

/// Same run as `verify_handler`, streamed as server-sent events: `progress`
/// for every pipeline event, then one `report` or `error`.
pub async fn verify_stream_handler(
    State(state): State<AppState>,
    Query(request): Query<VerifyRequest>,
) -> Response {
    let Some(statement) = request.statement().map(String::from) else {
        return bad_request();
    };

    info!(statement = %statement, "Streaming verification requested");
    Sse::new(run_stream(state, statement))
        .keep_alive(KeepAlive::default())
        .into_response()
}

fn run_stream(
    state: AppState,
    statement: String,
) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static {
    let (progress, rx) = Progress::channel();

    let run = tokio::spawn(async move {
        let _permit = state.run_gate.clone().acquire_owned().await?;
        state.pipeline.run(&statement, &progress).await
    });

    let events = stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|event| (event, rx))
    })
    .map(|event| json_event("progress", &event));

    // The progress sender lives inside the run task, so `events` ends when it does.
    let outcome = stream::once(async move {
        match run.await {
            Ok(Ok(report)) => json_event("report", &report),
            Ok(Err(e)) => {
                error!(error = %format!("{:#}", e), "Streaming verification run failed");
                json_event("error", &ErrorResponse::new(format!("{:#}", e)))
            }
            Err(e) => {
                error!(error = %e, "Verification task panicked");
                json_event("error", &ErrorResponse::new("Verification task failed"))
            }
        }
    });

    events.chain(outcome).map(Ok)
}

fn json_event<T: serde::Serialize>(name: &str, payload: &T) -> Event {
    match serde_json::to_string(payload) {
        Ok(data) => Event::default().event(name).data(data),
        Err(e) => Event::default()
            .event("error")
            .data(format!("{{\"error\":\"serialization failed: {}\"}}", e)),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{json, Value};

    use crate::llm::TextGenerator;
    use crate::search::EvidenceSearch;
    use crate::state::AppState;
    use crate::verify::types::Evidence;
    use crate::verify::Pipeline;
    use crate::web::create_router;

    struct CannedLlm {
        synthesis: Option<&'static str>,
    }

    #[async_trait]
    impl TextGenerator for CannedLlm {
        async fn generate(&self, prompt: &str, _system: Option<&str>) -> Result<String> {
            if prompt.contains("Make a bullet point list") {
                Ok("* Is the moon made of cheese?".to_string())
            } else if prompt.contains("Reasoning Steps:") {
                self.synthesis
                    .map(String::from)
                    .ok_or_else(|| anyhow!("quota exceeded"))
            } else {
                Ok("The claim is *FALSE*.".to_string())
            }
        }
    }

    struct CannedSearch;

    #[async_trait]
    impl EvidenceSearch for CannedSearch {
        async fn search(&self, _query: &str) -> Result<Vec<Evidence>> {
            Ok(vec![Evidence {
                title: Some("Moon".to_string()),
                url: Some("https://nasa.gov/moon".to_string()),
                content: Some("The moon is rock.".to_string()),
                score: None,
            }])
        }
    }

    fn server(synthesis: Option<&'static str>) -> TestServer {
        let pipeline = Pipeline::new(
            Arc::new(CannedLlm { synthesis }),
            Arc::new(CannedSearch),
            Duration::ZERO,
        );
        TestServer::new(create_router(AppState::new(pipeline, 1))).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = server(None).get("/health").await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "ok");
    }

    #[tokio::test]
    async fn test_index_page() {
        let response = server(None).get("/").await;
        response.assert_status_ok();
        assert!(response.text().contains("News Verification Assistant"));
    }

    #[tokio::test]
    async fn test_verify_rejects_blank_statement() {
        let response = server(None)
            .post("/api/verify")
            .json(&json!({ "statement": "   " }))
            .await;
        response.assert_status_bad_request();
        assert_eq!(
            response.json::<Value>()["error"],
            "Input cannot be empty. Please provide a valid statement."
        );
    }

    #[tokio::test]
    async fn test_verify_returns_report() {
        let response = server(Some("Final Result: FAKE\nOverall Reasoning: rock."))
            .post("/api/verify")
            .json(&json!({ "statement": "  The moon is made of cheese.  " }))
            .await;
        response.assert_status_ok();

        let body = response.json::<Value>();
        assert_eq!(body["statement"], "The moon is made of cheese.");
        assert_eq!(body["status"], "completed");
        assert_eq!(body["verdict"], "FAKE");
        assert_eq!(body["evidence"][0]["assumption"], "Is the moon made of cheese?");
        assert_eq!(body["judgments"][0]["source_url"], "https://nasa.gov/moon");
        assert_eq!(body["sources"][0]["title"], "Moon");
    }

    #[tokio::test]
    async fn test_verify_synthesis_failure_is_bad_gateway() {
        let response = server(None)
            .post("/api/verify")
            .json(&json!({ "statement": "The moon is made of cheese." }))
            .await;
        response.assert_status(StatusCode::BAD_GATEWAY);
        assert!(response.json::<Value>()["error"]
            .as_str()
            .unwrap()
            .contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_stream_emits_progress_then_report() {
        let response = server(Some("Final Result: REAL"))
            .get("/api/verify/stream")
            .add_query_param("statement", "The moon is made of cheese.")
            .await;
        response.assert_status_ok();

        let text = response.text();
        let first_progress = text.find("event: progress").unwrap();
        let report = text.find("event: report").unwrap();
        assert!(first_progress < report);
        assert!(text.contains("\"stage\":\"generating\""));
        assert!(text.contains("\"verdict\":\"REAL\""));
    }

    #[tokio::test]
    async fn test_stream_reports_synthesis_failure() {
        let response = server(None)
            .get("/api/verify/stream")
            .add_query_param("statement", "The moon is made of cheese.")
            .await;
        let text = response.text();
        assert!(text.contains("event: error"));
        assert!(!text.contains("event: report"));
    }

    #[tokio::test]
    async fn test_stream_rejects_blank_statement() {
        server(None)
            .get("/api/verify/stream")
            .add_query_param("statement", "")
            .await
            .assert_status_bad_request();
    }
}
