//! Scripted stand-in for the OpenAI REST API, served by axum on a loopback port.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::{Json, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct Reply {
    status: StatusCode,
    content_type: &'static str,
    body: Vec<u8>,
    delay: Option<Duration>,
}

impl Reply {
    pub fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string().into_bytes(),
            delay: None,
        }
    }

    pub fn chat(text: &str) -> Self {
        Self::json(
            StatusCode::OK,
            serde_json::json!({
                "id": "chatcmpl-test",
                "object": "chat.completion",
                "choices": [
                    { "index": 0, "message": { "role": "assistant", "content": text } }
                ]
            }),
        )
    }

    pub fn audio(bytes: &[u8]) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: "audio/mpeg",
            body: bytes.to_vec(),
            delay: None,
        }
    }

    pub fn raw(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: body.as_bytes().to_vec(),
            delay: None,
        }
    }

    /// Holds the response back for `delay`, long enough to trip a client timeout.
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Default)]
struct Script {
    replies: VecDeque<Reply>,
    requests: Vec<Value>,
    auth_headers: Vec<String>,
}

type SharedScript = Arc<Mutex<Script>>;

pub struct FakeOpenAi {
    pub base_url: String,
    script: SharedScript,
}

impl FakeOpenAi {
    /// Serves `replies` in order, one per request. Extra requests get a 500.
    pub async fn start(replies: Vec<Reply>) -> Self {
        let script: SharedScript = Arc::new(Mutex::new(Script {
            replies: replies.into(),
            ..Default::default()
        }));

        let app = Router::new()
            .route("/v1/chat/completions", post(handle))
            .route("/v1/audio/speech", post(handle))
            .with_state(script.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}/v1"),
            script,
        }
    }

    /// A base URL on a port nothing is listening on.
    pub async fn closed_base_url() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}/v1")
    }

    pub fn requests(&self) -> Vec<Value> {
        self.script.lock().unwrap().requests.clone()
    }

    pub fn auth_headers(&self) -> Vec<String> {
        self.script.lock().unwrap().auth_headers.clone()
    }
}

async fn handle(
    State(script): State<SharedScript>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let reply = {
        let mut script = script.lock().unwrap();
        script.requests.push(body);
        let auth = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        script.auth_headers.push(auth);
        script.replies.pop_front()
    };

    if let Some(delay) = reply.as_ref().and_then(|r| r.delay) {
        tokio::time::sleep(delay).await;
    }

    match reply {
        Some(reply) => (
            reply.status,
            [(header::CONTENT_TYPE, reply.content_type)],
            reply.body,
        )
            .into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}
