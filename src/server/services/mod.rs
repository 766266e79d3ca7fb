pub mod app_services;
pub mod fetch_services;
pub mod injection_services;
pub mod locator_services;
pub mod pipeline_services;
pub mod rewrite_services;

pub use app_services::AppServices;
pub use fetch_services::{DynFetchService, FetchResult, FetchServiceTrait};
pub use locator_services::IframeLocator;
pub use pipeline_services::{ProxiedContent, VideoPipeline};
pub use rewrite_services::PageRewriter;
