mod defaults;
pub mod model;

use std::path::Path;

use anyhow::Context;
use tracing::info;

pub use model::*;

impl ProxyProfile {
    /// no path means the built in profile, otherwise the json file is parsed on top of the
    /// defaults so a file only needs the fields it changes
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let profile = match path {
            Some(path) => {
                info!("loading proxy profile from {}", path.display());
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read profile {}", path.display()))?;
                serde_json::from_str::<ProxyProfile>(&raw)
                    .with_context(|| format!("failed to parse profile {}", path.display()))?
            }
            None => {
                info!("no profile path given, using built in profile");
                ProxyProfile::default()
            }
        };

        profile.validate()?;

        Ok(profile)
    }
}
