use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;

use tracing::info;

use embed_proxy::{AppConfig, ApplicationServer, Logger, ProxyProfile};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let config = Arc::new(AppConfig::parse());

    // guards are kept alive to flush logs and keep the sentry client around
    let _guards = Logger::init(&config);

    info!("logger and env prepped, loading proxy profile...");

    let profile = ProxyProfile::load(config.profile_path.as_deref())
        .context("failed to load proxy profile")?;

    info!(
        "profile ok ({} video hosts, {} denied domains), starting server...",
        profile.cookie_policy.video_hosts.len(),
        profile.deny_list.domains.len()
    );

    ApplicationServer::serve(config, Arc::new(profile))
        .await
        .context("server failed to start")?;

    Ok(())
}
