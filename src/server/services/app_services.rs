use std::sync::Arc;

use tracing::info;

use crate::{
    config::AppConfig,
    profile::ProxyProfile,
    server::services::{
        fetch_services::{DynFetchService, FetchService, FetchSettings},
        injection_services::render_injection,
        locator_services::IframeLocator,
        pipeline_services::VideoPipeline,
        rewrite_services::PageRewriter,
    },
};

/// everything a handler needs, cloned into every request through an Extension
#[derive(Clone)]
pub struct AppServices {
    pub fetcher: DynFetchService,
    pub pipeline: VideoPipeline,
    pub profile: Arc<ProxyProfile>,
    pub config: Arc<AppConfig>,
}

impl AppServices {
    pub fn new(config: Arc<AppConfig>, profile: Arc<ProxyProfile>) -> anyhow::Result<Self> {
        info!("starting services...");

        let settings = FetchSettings::from_config(&config, &profile);
        let fetcher = Arc::new(FetchService::new(profile.clone(), settings)?) as DynFetchService;

        Self::with_fetcher(config, profile, fetcher)
    }

    /// same as new but with the fetcher swapped out, tests hand in a mock here
    pub fn with_fetcher(
        config: Arc<AppConfig>,
        profile: Arc<ProxyProfile>,
        fetcher: DynFetchService,
    ) -> anyhow::Result<Self> {
        let locator = Arc::new(IframeLocator::from_profile(&profile)?);

        let injection = render_injection(&profile.injection, &profile.deny_list);
        let rewriter = Arc::new(PageRewriter::from_profile(&profile, injection)?);

        info!("locator and rewriter ok, services ready");

        let pipeline = VideoPipeline::new(fetcher.clone(), locator, rewriter);

        Ok(Self {
            fetcher,
            pipeline,
            profile,
            config,
        })
    }
}
