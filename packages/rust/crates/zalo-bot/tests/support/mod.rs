#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use anyhow::Result;
use axum::{
    Router,
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use zalo_bot::{BotConfig, RetryConfig};

pub const TEST_TOKEN: &str = "123456789:test_token-abc";

#[derive(Debug, Clone)]
pub struct MockReply {
    pub status: StatusCode,
    pub headers: Vec<(&'static str, String)>,
    pub body: String,
    pub delay: Duration,
}

impl MockReply {
    pub fn ok(result: serde_json::Value) -> Self {
        Self::json(200, &serde_json::json!({"ok": true, "result": result}))
    }

    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self::raw(status, &body.to_string())
    }

    pub fn raw(status: u16, body: &str) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            headers: Vec::new(),
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.push((name, value.to_string()));
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub received_at: Instant,
}

impl RecordedRequest {
    pub fn query_param(&self, key: &str) -> Option<String> {
        self.query.as_deref().and_then(|query| {
            query.split('&').find_map(|pair| {
                let (k, v) = pair.split_once('=')?;
                (k == key).then(|| v.to_string())
            })
        })
    }
}

/// Scripted Bot API: replies are consumed per API method in order, then the
/// method's fallback (or a 404 envelope) is served.
#[derive(Clone, Default)]
pub struct MockApi {
    scripts: Arc<Mutex<HashMap<String, VecDeque<MockReply>>>>,
    fallbacks: Arc<Mutex<HashMap<String, MockReply>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockApi {
    pub fn script(&self, api_method: &str, replies: impl IntoIterator<Item = MockReply>) {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(api_method.to_string())
            .or_default()
            .extend(replies);
    }

    pub fn fallback(&self, api_method: &str, reply: MockReply) {
        self.fallbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(api_method.to_string(), reply);
    }

    pub fn requests(&self, api_method: &str) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|request| request.path.ends_with(&format!("/{api_method}")))
            .cloned()
            .collect()
    }

    fn next_reply(&self, api_method: &str) -> Option<MockReply> {
        let scripted = self
            .scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(api_method)
            .and_then(VecDeque::pop_front);
        scripted.or_else(|| {
            self.fallbacks
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(api_method)
                .cloned()
        })
    }
}

async fn dispatch(State(api): State<MockApi>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX)
        .await
        .map(|bytes| bytes.to_vec())
        .unwrap_or_default();
    let path = parts.uri.path().to_string();
    let api_method = path.rsplit('/').next().unwrap_or_default().to_string();
    api.requests
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(RecordedRequest {
            method: parts.method.to_string(),
            path,
            query: parts.uri.query().map(str::to_string),
            headers: parts.headers,
            body,
            received_at: Instant::now(),
        });

    let Some(reply) = api.next_reply(&api_method) else {
        return (
            StatusCode::NOT_FOUND,
            serde_json::json!({"ok": false, "error_code": 404, "description": "no mock reply"})
                .to_string(),
        )
            .into_response();
    };
    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }
    let mut builder = Response::builder()
        .status(reply.status)
        .header("content-type", "application/json");
    for (name, value) in &reply.headers {
        builder = builder.header(*name, value.as_str());
    }
    builder
        .body(Body::from(reply.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

pub async fn spawn_mock_api(
    api: MockApi,
) -> Result<Option<(String, tokio::task::JoinHandle<()>)>> {
    let app = Router::new().fallback(dispatch).with_state(api);
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:0").await {
        Ok(listener) => listener,
        Err(err) if err.kind() == std::io::ErrorKind::PermissionDenied => {
            eprintln!("skipping Bot API mock tests: local socket bind is not permitted");
            return Ok(None);
        }
        Err(err) => return Err(err.into()),
    };
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(Some((format!("http://{addr}"), handle)))
}

/// Config pointing at the mock with millisecond backoff.
pub fn test_config(base_url: &str) -> BotConfig {
    BotConfig::new(TEST_TOKEN)
        .with_base_url(base_url)
        .with_request_timeout(Duration::from_secs(5))
        .with_retry(
            RetryConfig::default()
                .with_delays(Duration::from_millis(10), Duration::from_millis(50)),
        )
}

pub fn sample_update(update_id: i64) -> serde_json::Value {
    serde_json::json!({
        "update_id": update_id,
        "message": {
            "message_id": format!("m{update_id}"),
            "text": "hello",
            "chat": {"id": "chat-1", "type": "private"},
            "from": {"id": "user-1", "name": "alice"}
        }
    })
}

/// Poll `check` until it returns true or `limit` elapses.
pub async fn wait_until<F>(limit: Duration, mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
