use std::path::PathBuf;

use tracing::level_filters::LevelFilter;

#[derive(clap::ValueEnum, Clone, Debug, Copy)]
pub enum CargoEnv {
    Development,
    Production,
}

#[derive(clap::Parser, Clone, Debug)]
pub struct AppConfig {
    // production or development
    #[clap(long, env, value_enum, default_value = "development")]
    pub cargo_env: CargoEnv,

    // port that the app will bind to
    #[clap(long, env, default_value = "3000")]
    pub port: u16,

    // this should be either * for allowing everything, or a comma seperated list of domains like
    // example.com,something.com
    #[clap(long, env, default_value = "*")]
    pub cors_origin: String,

    // optional json file replacing the built in header profile, deny list and injection tables.
    // anything left out of the file keeps its built in value
    #[clap(long, env)]
    pub profile_path: Option<PathBuf>,

    // every outbound fetch gets cancelled after this many seconds
    #[clap(long, env, default_value = "30")]
    pub upstream_timeout_secs: u64,

    #[clap(long, env, default_value = "5")]
    pub max_redirects: usize,

    // 50mb, anything bigger than this is not an embed page
    #[clap(long, env, default_value = "52428800")]
    pub max_body_bytes: usize,

    // optional sentry integration
    #[clap(long, env)]
    pub sentry_dsn: Option<String>,

    // off, error, warn, info, debug or trace. unset means debug in development and info in
    // production
    #[clap(long, env)]
    pub log_level: Option<LevelFilter>,

    // production only, development logs to stdout
    #[clap(long, env, default_value = "logs")]
    pub log_dir: PathBuf,

    // rotated daily, the date gets appended
    #[clap(long, env, default_value = "proxy.log")]
    pub log_file: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cargo_env: CargoEnv::Development,
            port: 3000,
            cors_origin: "*".to_string(),
            profile_path: None,
            upstream_timeout_secs: 30,
            max_redirects: 5,
            max_body_bytes: 50 * 1024 * 1024,
            sentry_dsn: None,
            log_level: None,
            log_dir: PathBuf::from("logs"),
            log_file: "proxy.log".to_string(),
        }
    }
}
