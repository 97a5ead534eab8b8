use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{ArgGroup, Parser};
use notify_core::config::parse_scopes;
use notify_core::{
    AndroidOptions, ApnsOptions, FcmClient, FcmClientConfig, FcmConfig, PushClient,
    PushMessageBuilder, PushResult, PushTarget, ServiceAccountKey, TokenProviderConfig,
};
use serde_json::{Map, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Send a single push notification through FCM HTTP v1
#[derive(Parser, Debug)]
#[command(name = "notify-send", version)]
#[command(group(ArgGroup::new("target").required(true).args(["token", "topic", "condition"])))]
struct Args {
    /// Service account JSON file
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    credentials: PathBuf,

    /// Firebase project id (defaults to the service account's project)
    #[arg(long, env = "FCM_PROJECT_ID")]
    project_id: Option<String>,

    /// Send endpoint override; `{project_id}` is substituted
    #[arg(long, env = "FCM_ENDPOINT")]
    endpoint: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "FCM_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// OAuth token endpoint (defaults to the service account's token_uri)
    #[arg(long, env = "FCM_TOKEN_URI")]
    token_uri: Option<String>,

    /// OAuth scopes, space or comma separated
    #[arg(long, env = "FCM_SCOPES")]
    scopes: Option<String>,

    /// Seconds before expiry at which a cached access token is refreshed
    #[arg(long, env = "FCM_TOKEN_CACHE_LEEWAY_SECS")]
    token_cache_leeway_secs: Option<i64>,

    /// Device registration token
    #[arg(long)]
    token: Option<String>,

    /// Topic name
    #[arg(long)]
    topic: Option<String>,

    /// Topic condition, e.g. "'news' in topics && 'sports' in topics"
    #[arg(long)]
    condition: Option<String>,

    #[arg(long)]
    title: String,

    #[arg(long)]
    body: String,

    /// Data entry as KEY=VALUE (repeatable)
    #[arg(long = "data", value_parser = parse_key_value)]
    data: Vec<(String, String)>,

    #[arg(long)]
    android_channel: Option<String>,

    /// Android priority: normal or high
    #[arg(long)]
    android_priority: Option<String>,

    /// Android time to live in seconds
    #[arg(long)]
    ttl: Option<u64>,

    /// APNs priority header: 10 (immediate) or 5 (background)
    #[arg(long)]
    apns_priority: Option<String>,

    /// APNs push type: alert, background, voip
    #[arg(long)]
    apns_push_type: Option<String>,

    /// Ask FCM to validate the message without delivering it
    #[arg(long)]
    validate_only: bool,

    /// Print the full result as JSON
    #[arg(long)]
    json: bool,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got `{}`", raw))
}

fn load_config(args: &Args) -> Result<FcmConfig> {
    let credentials = ServiceAccountKey::from_file(&args.credentials)
        .with_context(|| format!("loading {}", args.credentials.display()))?;

    let project_id = args
        .project_id
        .clone()
        .or_else(|| credentials.project_id.clone())
        .ok_or_else(|| anyhow!("--project-id is required: the service account has no project_id"))?;

    let mut client = FcmClientConfig::new(project_id);
    client.endpoint = args.endpoint.clone();
    client.timeout = args.timeout_secs.map(Duration::from_secs);

    let mut token = TokenProviderConfig::default();
    if let Some(token_uri) = args.token_uri.clone().or_else(|| credentials.token_uri.clone()) {
        token = token.with_token_uri(token_uri);
    }
    if let Some(scopes) = &args.scopes {
        let scopes = parse_scopes(scopes);
        if scopes.is_empty() {
            return Err(anyhow!("--scopes does not contain any scope"));
        }
        token = token.with_scopes(scopes);
    }
    if let Some(leeway) = args.token_cache_leeway_secs {
        token = token.with_cache_leeway(leeway);
    }

    Ok(FcmConfig {
        credentials,
        client,
        token,
    })
}

fn build_message(args: &Args) -> PushMessageBuilder {
    let mut builder = PushMessageBuilder::new(&args.title, &args.body);

    for (key, value) in &args.data {
        builder = builder.data(key.clone(), value.clone());
    }

    if args.android_channel.is_some() || args.android_priority.is_some() || args.ttl.is_some() {
        let mut android = AndroidOptions::new();
        if let Some(channel) = &args.android_channel {
            android = android.with_channel_id(channel);
        }
        if let Some(priority) = &args.android_priority {
            android = android.with_priority(priority);
        }
        if let Some(ttl) = args.ttl {
            android = android.with_ttl(ttl);
        }
        let mut notification = Map::new();
        notification.insert("sound".to_string(), Value::String("default".to_string()));
        builder = builder.android(android.with_notification(notification));
    }

    if args.apns_priority.is_some() || args.apns_push_type.is_some() {
        let mut apns = ApnsOptions::new();
        if let Some(priority) = &args.apns_priority {
            apns = apns.with_header("apns-priority", priority);
        }
        if let Some(push_type) = &args.apns_push_type {
            apns = apns.with_header("apns-push-type", push_type);
        }
        let mut aps = Map::new();
        aps.insert("sound".to_string(), Value::String("default".to_string()));
        aps.insert("mutable-content".to_string(), Value::from(1));
        builder = builder.apns(apns.with_aps(aps));
    }

    builder
}

fn print_result(result: &PushResult, as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    println!("Success: {}", result.success);
    println!("ID: {}", result.id.as_deref().unwrap_or("(none)"));
    println!(
        "ErrorCode: {}",
        result.error_code.as_deref().unwrap_or("(none)")
    );
    println!(
        "ErrorMessage: {}",
        result.error_message.as_deref().unwrap_or("(none)")
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let config = load_config(&args)?;
    let client = FcmClient::from_config(config)?;

    let target = PushTarget::from_parts(
        args.token.clone(),
        args.topic.clone(),
        args.condition.clone(),
    )?;
    let message = build_message(&args).build();

    tracing::info!(project_id = %client.project_id(), "Sending push notification");

    let result = if args.validate_only {
        client.validate(&message, &target).await
    } else {
        client.send(&message, &target).await
    };

    print_result(&result, args.json)?;

    if !result.success {
        std::process::exit(1);
    }

    Ok(())
}
