use clap::{Parser, Subcommand};

use zalo_bot::Environment;
use zalo_bot::webhook::DEFAULT_WEBHOOK_PATH;

#[derive(Parser)]
#[command(name = "zalo-bot")]
#[command(about = "Zalo Bot API client: poll updates, serve signed webhooks, call the API.")]
pub(crate) struct Cli {
    /// Bot token (default: ZALO_BOT_TOKEN).
    #[arg(long, global = true)]
    pub(crate) token: Option<String>,

    /// API base URL (default: ZALO_BOT_API_BASE_URL or https://bot-api.zapps.me).
    #[arg(long, global = true)]
    pub(crate) base_url: Option<String>,

    /// production or development (default: ZALO_BOT_ENVIRONMENT or production).
    #[arg(long, global = true)]
    pub(crate) environment: Option<Environment>,

    /// Debug logging (ignored when RUST_LOG is set).
    #[arg(long, short, global = true)]
    pub(crate) verbose: bool,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Print the bot identity (getMe).
    Me,
    /// Long-poll updates and print each as one JSON line. Exit on Ctrl+C.
    Poll {
        /// Seconds the server may hold each request (0 = short polling).
        #[arg(long, default_value_t = 30)]
        timeout: u64,

        /// Batch size (1-100).
        #[arg(long, default_value_t = 100)]
        limit: u32,

        /// Start after this update id.
        #[arg(long, default_value_t = 0)]
        offset: i64,

        /// Exit after this many updates.
        #[arg(long)]
        max_updates: Option<usize>,
    },
    /// Serve a signed webhook endpoint and print each update as one JSON line.
    Webhook {
        /// Listen address.
        #[arg(long, default_value = "0.0.0.0:8443")]
        bind: String,

        /// Route path.
        #[arg(long, default_value = DEFAULT_WEBHOOK_PATH)]
        path: String,

        /// Shared secret used to verify X-Zalo-Signature.
        #[arg(long)]
        secret: String,

        /// Public HTTPS URL to register with setWebhook before serving.
        #[arg(long)]
        register_url: Option<String>,
    },
    /// Print the current webhook registration (getWebhookInfo).
    WebhookInfo,
    /// Remove the webhook registration (deleteWebhook).
    DeleteWebhook,
    /// Print a user's profile (getUserProfile).
    Profile {
        /// User id to look up.
        user_id: String,
    },
    /// Send a text message.
    Send {
        /// Target chat id.
        #[arg(long)]
        chat_id: String,

        /// Message text.
        text: String,
    },
    /// Print the X-Zalo-Signature value for a payload.
    Sign {
        /// Shared secret.
        #[arg(long)]
        secret: String,

        /// Raw payload.
        payload: String,
    },
}
