use std::convert::Infallible;
use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use http::{header, HeaderValue, Method, Request, Response, StatusCode};
use http_body_util::BodyExt;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as AutoBuilder;
use tokio::net::TcpListener;

const DEFAULT_BACKEND_PORT: u16 = 19_001;
const CHAT_PATH: &str = "/api/v1/ai/chat_completions";
const MODELS_PATH: &str = "/api/v1/ai/models";

#[derive(Copy, Clone)]
enum MockScenario {
    Text,
    Fallback,
    Noisy,
    Error,
}

struct MockStats {
    chat: AtomicU64,
    models: AtomicU64,
}

impl MockStats {
    const fn new() -> Self {
        Self {
            chat: AtomicU64::new(0),
            models: AtomicU64::new(0),
        }
    }

    fn reset(&self) {
        self.chat.store(0, Ordering::Relaxed);
        self.models.store(0, Ordering::Relaxed);
    }
}

struct MockState {
    scenario: MockScenario,
    stats: MockStats,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let port = env_u16("BACKEND_PORT", DEFAULT_BACKEND_PORT);
    let state = Arc::new(MockState {
        scenario: parse_scenario(),
        stats: MockStats::new(),
    });

    let listener = TcpListener::bind(("127.0.0.1", port))
        .await
        .unwrap_or_else(|err| panic!("failed to bind mock backend on 127.0.0.1:{port}: {err}"));
    let conn_builder = AutoBuilder::new(TokioExecutor::new());

    loop {
        let (stream, remote_addr) = match listener.accept().await {
            Ok((stream, remote_addr)) => (stream, remote_addr),
            Err(err) => {
                eprintln!("accept error: {err}");
                continue;
            }
        };
        let io = TokioIo::new(stream);
        let conn_builder = conn_builder.clone();
        let service_state = Arc::clone(&state);
        let service = service_fn(move |request: Request<Incoming>| {
            let state_ref = Arc::clone(&service_state);
            async move { Ok::<_, Infallible>(handle_request(request, &state_ref).await) }
        });

        tokio::spawn(async move {
            if let Err(err) = conn_builder.serve_connection(io, service).await {
                eprintln!("mock backend connection error from {remote_addr}: {err}");
            }
        });
    }
}

fn env_u16(name: &str, default: u16) -> u16 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(default)
}

fn parse_scenario() -> MockScenario {
    match env::var("MOCK_SCENARIO").as_deref() {
        Ok("fallback") => MockScenario::Fallback,
        Ok("noisy") => MockScenario::Noisy,
        Ok("error") => MockScenario::Error,
        Ok("text") | Err(_) => MockScenario::Text,
        Ok(other) => {
            eprintln!("unknown MOCK_SCENARIO '{other}', fallback to text");
            MockScenario::Text
        }
    }
}

async fn handle_request(request: Request<Incoming>, state: &Arc<MockState>) -> Response<Full<Bytes>> {
    let (parts, body) = request.into_parts();
    drain_request_body(body).await;

    match (parts.method, parts.uri.path()) {
        (Method::GET, "/_mock/stats") => stats_response(state),
        (Method::POST, "/_mock/reset") => {
            state.stats.reset();
            simple_response_static(StatusCode::OK, "application/json", br#"{"ok":true}"#)
        }
        (Method::GET, MODELS_PATH) => {
            state.stats.models.fetch_add(1, Ordering::Relaxed);
            simple_response_static(StatusCode::OK, "application/json", MODELS_BODY)
        }
        (Method::POST, CHAT_PATH) => {
            state.stats.chat.fetch_add(1, Ordering::Relaxed);
            chat_response(state.scenario)
        }
        (_, MODELS_PATH | CHAT_PATH) => simple_response_static(
            StatusCode::METHOD_NOT_ALLOWED,
            "application/json",
            br#"{"error":"method_not_allowed"}"#,
        ),
        _ => simple_response_static(
            StatusCode::NOT_FOUND,
            "application/json",
            br#"{"error":"not_found"}"#,
        ),
    }
}

async fn drain_request_body(mut body: Incoming) {
    while let Some(frame_result) = body.frame().await {
        if frame_result.is_err() {
            break;
        }
    }
}

fn stats_response(state: &MockState) -> Response<Full<Bytes>> {
    let chat = state.stats.chat.load(Ordering::Relaxed);
    let models = state.stats.models.load(Ordering::Relaxed);
    let scenario = match state.scenario {
        MockScenario::Text => "text",
        MockScenario::Fallback => "fallback",
        MockScenario::Noisy => "noisy",
        MockScenario::Error => "error",
    };
    let body = format!("{{\"scenario\":\"{scenario}\",\"chat\":{chat},\"models\":{models}}}");
    simple_response(
        StatusCode::OK,
        "application/json",
        Bytes::from(body.into_bytes()),
    )
}

fn chat_response(scenario: MockScenario) -> Response<Full<Bytes>> {
    let body = match scenario {
        MockScenario::Text => CHAT_STREAM_TEXT,
        MockScenario::Fallback => CHAT_STREAM_FALLBACK,
        MockScenario::Noisy => CHAT_STREAM_NOISY,
        MockScenario::Error => {
            return simple_response_static(
                StatusCode::SERVICE_UNAVAILABLE,
                "application/json",
                br#"{"error":"mock_injected_error"}"#,
            );
        }
    };
    let mut response = simple_response_static(StatusCode::OK, "text/event-stream", body);
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}

fn simple_response(
    status: StatusCode,
    content_type: &'static str,
    body: Bytes,
) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

fn simple_response_static(
    status: StatusCode,
    content_type: &'static str,
    body: &'static [u8],
) -> Response<Full<Bytes>> {
    simple_response(status, content_type, Bytes::from_static(body))
}

const CHAT_STREAM_TEXT: &[u8] = b"data: {\"text\":\"Hello\"}\n\ndata: {\"text\":\" there\"}\n\ndata: {\"text\":\"\",\"finish_reason\":\"stop\"}\n\n";
const CHAT_STREAM_FALLBACK: &[u8] = b"data: {\"content\":\"Hello\",\"id\":\"evt_1\"}\n\ndata: {\"message\":{\"content\":\" there\"}}\n\ndata: [DONE]\n\n";
const CHAT_STREAM_NOISY: &[u8] = b": keep-alive\r\n\r\nevent: message\r\ndata: {\"text\":\"caf\xc3\xa9\"}\r\n\r\ndata: not json\n\ndata: {\"text\":\" ok\"}";
const MODELS_BODY: &[u8] = br#"{"models":[{"id":"gpt-4o-mini","model":"gpt-4o-mini","provider":"openai"},{"id":"claude-3-5-sonnet","model":"claude-3-5-sonnet-latest","provider":"anthropic"},{"id":"gemini-2.0-flash","model":"gemini-2.0-flash","provider":"google"}]}"#;
