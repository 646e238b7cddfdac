#![allow(missing_docs)]

mod support;

use std::time::{Duration, Instant};

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use zalo_bot::{
    ApiRequest, BotConfig, Environment, ErrorKind, RequestExecutor, RetryConfig, ZaloBot,
};

use support::{MockApi, MockReply, TEST_TOKEN, spawn_mock_api, test_config};

fn bot_identity() -> serde_json::Value {
    serde_json::json!({"id": "42", "name": "echo-bot", "is_bot": true})
}

#[tokio::test]
async fn rate_limit_with_retry_after_then_success_takes_two_attempts() -> Result<()> {
    let api = MockApi::default();
    api.script(
        "getMe",
        [
            MockReply::json(
                429,
                &serde_json::json!({"ok": false, "error_code": 429, "description": "Too Many Requests"}),
            )
            .with_header("Retry-After", "2"),
            MockReply::ok(bot_identity()),
        ],
    );
    let Some((base_url, server)) = spawn_mock_api(api.clone()).await? else {
        return Ok(());
    };

    let bot = ZaloBot::new(test_config(&base_url))?;
    let me = bot.get_me().await?;
    assert_eq!(me.id, "42");
    assert!(me.is_bot);

    let requests = api.requests("getMe");
    assert_eq!(requests.len(), 2);
    let gap = requests[1].received_at - requests[0].received_at;
    assert!(gap >= Duration::from_secs(2), "second attempt after {gap:?}");

    server.abort();
    Ok(())
}

#[tokio::test]
async fn auth_failures_surface_immediately() -> Result<()> {
    let api = MockApi::default();
    api.fallback(
        "getMe",
        MockReply::json(
            401,
            &serde_json::json!({"ok": false, "error_code": 401, "description": "Unauthorized"}),
        ),
    );
    let Some((base_url, server)) = spawn_mock_api(api.clone()).await? else {
        return Ok(());
    };

    let bot = ZaloBot::new(test_config(&base_url))?;
    let Err(error) = bot.get_me().await else {
        anyhow::bail!("401 must fail");
    };
    assert_eq!(error.kind, ErrorKind::Auth);
    assert_eq!(error.code, 401);
    assert_eq!(error.description.as_deref(), Some("Unauthorized"));
    assert_eq!(api.requests("getMe").len(), 1);

    server.abort();
    Ok(())
}

#[tokio::test]
async fn server_errors_retry_until_exhausted() -> Result<()> {
    let api = MockApi::default();
    api.fallback("getMe", MockReply::raw(503, "<html>maintenance</html>"));
    let Some((base_url, server)) = spawn_mock_api(api.clone()).await? else {
        return Ok(());
    };

    let config = test_config(&base_url).with_retry(
        RetryConfig::default()
            .with_max_retries(2)
            .with_delays(Duration::from_millis(5), Duration::from_millis(20)),
    );
    let bot = ZaloBot::new(config)?;
    let Err(error) = bot.get_me().await else {
        anyhow::bail!("503 must fail");
    };
    assert_eq!((error.kind, error.code), (ErrorKind::Api, 503));
    assert_eq!(api.requests("getMe").len(), 3);

    server.abort();
    Ok(())
}

#[tokio::test]
async fn client_side_api_errors_are_terminal() -> Result<()> {
    let api = MockApi::default();
    api.fallback(
        "sendMessage",
        MockReply::json(
            200,
            &serde_json::json!({"ok": false, "error_code": 400, "description": "chat not found"}),
        ),
    );
    let Some((base_url, server)) = spawn_mock_api(api.clone()).await? else {
        return Ok(());
    };

    let bot = ZaloBot::new(test_config(&base_url))?;
    let Err(error) = bot.send_message("chat-1", "hi").await else {
        anyhow::bail!("ok=false must fail");
    };
    assert_eq!((error.kind, error.code), (ErrorKind::Api, 400));
    assert_eq!(error.message, "chat not found");
    let requests = api.requests("sendMessage");
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body)?;
    assert_eq!(body, serde_json::json!({"chat_id": "chat-1", "text": "hi"}));

    server.abort();
    Ok(())
}

#[tokio::test]
async fn token_travels_in_path_and_environment_marker_in_header() -> Result<()> {
    let api = MockApi::default();
    api.fallback("getMe", MockReply::ok(bot_identity()));
    let Some((base_url, server)) = spawn_mock_api(api.clone()).await? else {
        return Ok(());
    };

    let dev = ZaloBot::new(test_config(&base_url).with_environment(Environment::Development))?;
    dev.get_me().await?;
    let prod = ZaloBot::new(test_config(&base_url))?;
    prod.get_me().await?;

    let requests = api.requests("getMe");
    assert_eq!(requests.len(), 2);
    for request in &requests {
        assert_eq!(request.path, format!("/bot{TEST_TOKEN}/getMe"));
        assert_eq!(request.method, "GET");
        let user_agent = request
            .headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(user_agent.starts_with("zalo-bot-rs/"), "{user_agent}");
        assert!(request.headers.get("authorization").is_none());
    }
    assert_eq!(
        requests[0]
            .headers
            .get("x-environment")
            .and_then(|v| v.to_str().ok()),
        Some("development")
    );
    assert!(requests[1].headers.get("x-environment").is_none());

    server.abort();
    Ok(())
}

#[tokio::test]
async fn cancellation_interrupts_backoff_sleep() -> Result<()> {
    let api = MockApi::default();
    api.fallback("getMe", MockReply::raw(500, "oops"));
    let Some((base_url, server)) = spawn_mock_api(api.clone()).await? else {
        return Ok(());
    };

    let config = test_config(&base_url).with_retry(
        RetryConfig::default()
            .with_max_retries(10)
            .with_delays(Duration::from_secs(10), Duration::from_secs(10)),
    );
    let executor = RequestExecutor::new(&config);
    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        canceller.cancel();
    });

    let started = Instant::now();
    let outcome = tokio::time::timeout(
        Duration::from_secs(3),
        executor.execute(&ApiRequest::get("getMe"), &cancel),
    )
    .await?;
    let Err(error) = outcome else {
        anyhow::bail!("cancelled call must fail");
    };
    assert_eq!(error.kind, ErrorKind::Network);
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(api.requests("getMe").len(), 1);

    server.abort();
    Ok(())
}

#[tokio::test]
async fn connection_failures_are_network_errors() -> Result<()> {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:0").await {
        Ok(listener) => listener,
        Err(err) if err.kind() == std::io::ErrorKind::PermissionDenied => return Ok(()),
        Err(err) => return Err(err.into()),
    };
    let addr = listener.local_addr()?;
    drop(listener);

    let config = BotConfig::new(TEST_TOKEN)
        .with_base_url(format!("http://{addr}"))
        .with_retry(RetryConfig::disabled());
    let bot = ZaloBot::new(config)?;
    let Err(error) = bot.get_me().await else {
        anyhow::bail!("closed port must fail");
    };
    assert_eq!(error.kind, ErrorKind::Network);
    assert!(!error.to_string().contains(TEST_TOKEN));
    Ok(())
}

#[tokio::test]
async fn invalid_inputs_fail_before_any_request() -> Result<()> {
    let api = MockApi::default();
    let Some((base_url, server)) = spawn_mock_api(api.clone()).await? else {
        return Ok(());
    };

    let bot = ZaloBot::new(test_config(&base_url))?;
    let Err(error) = bot.set_webhook("http://insecure.example/hook", "s").await else {
        anyhow::bail!("http webhook must be rejected");
    };
    assert_eq!(error.kind, ErrorKind::Validation);
    let Err(error) = bot.send_message(" ", "hi").await else {
        anyhow::bail!("blank chat id must be rejected");
    };
    assert_eq!(error.kind, ErrorKind::Validation);
    assert!(api.requests("setWebhook").is_empty());
    assert!(api.requests("sendMessage").is_empty());

    server.abort();
    Ok(())
}

#[tokio::test]
async fn webhook_management_round_trip() -> Result<()> {
    let api = MockApi::default();
    api.fallback("setWebhook", MockReply::ok(serde_json::json!(true)));
    api.fallback("deleteWebhook", MockReply::ok(serde_json::json!(true)));
    api.fallback(
        "getWebhookInfo",
        MockReply::ok(serde_json::json!({
            "url": "https://bot.example/hook",
            "has_custom_certificate": false,
            "pending_update_count": 3
        })),
    );
    let Some((base_url, server)) = spawn_mock_api(api.clone()).await? else {
        return Ok(());
    };

    let bot = ZaloBot::new(test_config(&base_url))?;
    bot.set_webhook("https://bot.example/hook", "shared").await?;
    let info = bot.get_webhook_info().await?;
    assert_eq!(info.url, "https://bot.example/hook");
    assert_eq!(info.pending_update_count, 3);
    bot.delete_webhook().await?;

    let registered = api.requests("setWebhook");
    assert_eq!(registered.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&registered[0].body)?;
    assert_eq!(body["secret_token"], "shared");

    let payload = br#"{"update_id":1,"postback":{"payload":"p"}}"#;
    let signature = zalo_bot::sign_payload("shared", payload)?;
    bot.verify_webhook(payload, &signature).await?;

    server.abort();
    Ok(())
}

#[tokio::test]
async fn user_profile_is_fetched_by_query_and_validated_locally() -> Result<()> {
    let api = MockApi::default();
    api.fallback(
        "getUserProfile",
        MockReply::ok(serde_json::json!({
            "id": "u-9",
            "name": "Lan",
            "avatar": "https://cdn.example/u-9.png"
        })),
    );
    let Some((base_url, server)) = spawn_mock_api(api.clone()).await? else {
        return Ok(());
    };

    let bot = ZaloBot::new(test_config(&base_url))?;
    let profile = bot.get_user_profile("u-9").await?;
    assert_eq!(profile.id, "u-9");
    assert_eq!(profile.name, "Lan");
    assert_eq!(profile.avatar.as_deref(), Some("https://cdn.example/u-9.png"));

    let requests = api.requests("getUserProfile");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].query_param("user_id").as_deref(), Some("u-9"));

    for user_id in [String::new(), "  ".to_string(), "x".repeat(101)] {
        let Err(error) = bot.get_user_profile(&user_id).await else {
            anyhow::bail!("user id {user_id:?} must be rejected");
        };
        assert_eq!(error.kind, ErrorKind::Validation);
    }
    assert_eq!(api.requests("getUserProfile").len(), 1);

    server.abort();
    Ok(())
}
