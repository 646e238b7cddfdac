//! zalo-bot CLI: poll updates, serve a webhook, or call the Bot API.
//!
//! Credentials come from `ZALO_BOT_TOKEN` (or `--token`).
//!
//! Logging: set `RUST_LOG=zalo_bot=info` (or `warn`, `debug`) to see client logs on stderr.

mod cli;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use zalo_bot::{BotConfig, UpdateConfig, ZaloBot, sign_payload};

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG overrides; --verbose => debug; else info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose {
            "zalo_bot=debug"
        } else {
            "zalo_bot=info"
        })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    if let Command::Sign { secret, payload } = &cli.command {
        println!("{}", sign_payload(secret, payload.as_bytes())?);
        return Ok(());
    }

    let bot = ZaloBot::new(load_config(&cli)?)?;
    let result = match cli.command {
        Command::Me => print_json(&bot.get_me().await?),
        Command::WebhookInfo => print_json(&bot.get_webhook_info().await?),
        Command::DeleteWebhook => bot.delete_webhook().await.map_err(Into::into),
        Command::Send { chat_id, text } => print_json(&bot.send_message(&chat_id, &text).await?),
        Command::Profile { user_id } => print_json(&bot.get_user_profile(&user_id).await?),
        Command::Poll {
            timeout,
            limit,
            offset,
            max_updates,
        } => {
            let config = UpdateConfig::long_poll(timeout)
                .with_limit(limit)
                .with_offset(offset);
            run_poll(&bot, config, max_updates).await
        }
        Command::Webhook {
            bind,
            path,
            secret,
            register_url,
        } => run_webhook(&bot, &bind, &path, &secret, register_url.as_deref()).await,
        Command::Sign { .. } => Ok(()),
    };
    bot.close().await;
    result
}

fn load_config(cli: &Cli) -> anyhow::Result<BotConfig> {
    let token = cli.token.clone();
    let mut config = BotConfig::from_lookup(|name| match name {
        "ZALO_BOT_TOKEN" if token.is_some() => token.clone(),
        _ => std::env::var(name).ok(),
    })
    .context("failed to load bot configuration")?;
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url.clone());
    }
    if let Some(environment) = cli.environment {
        config = config.with_environment(environment);
    }
    config.validate()?;
    Ok(config)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

async fn run_poll(
    bot: &ZaloBot,
    config: UpdateConfig,
    max_updates: Option<usize>,
) -> anyhow::Result<()> {
    let stream = bot.start_polling(config).await;
    let mut received = 0usize;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received; stopping polling");
                break;
            }
            next = stream.recv() => {
                let Some(update) = next else {
                    break;
                };
                print_json(&update)?;
                received += 1;
                if max_updates.is_some_and(|max| received >= max) {
                    break;
                }
            }
        }
    }
    bot.stop_polling().await;
    if let Some(error) = bot.last_polling_error().await {
        tracing::warn!(error = %error, "Last polling error");
    }
    tracing::info!(received, "Polling finished");
    Ok(())
}

async fn run_webhook(
    bot: &ZaloBot,
    bind: &str,
    path: &str,
    secret: &str,
    register_url: Option<&str>,
) -> anyhow::Result<()> {
    bot.set_webhook_secret(secret).await;
    if let Some(url) = register_url {
        bot.set_webhook(url, secret)
            .await
            .context("failed to register webhook")?;
    }

    let (tx, mut rx) = mpsc::channel(bot.config().update_queue_capacity);
    let webhook = bot.webhook_app(path, tx).await;
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    tracing::info!(
        bind = %listener.local_addr()?,
        path = %webhook.path,
        "Webhook server listening"
    );

    let shutdown = CancellationToken::new();
    let server = tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            axum::serve(listener, webhook.app)
                .with_graceful_shutdown(shutdown.cancelled_owned())
                .await
        }
    });

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received; shutting down webhook server");
                break;
            }
            next = rx.recv() => {
                let Some(update) = next else {
                    break;
                };
                print_json(&update)?;
            }
        }
    }
    drop(rx);
    shutdown.cancel();
    server.await??;
    Ok(())
}
