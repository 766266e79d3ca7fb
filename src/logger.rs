/* Logger initialization */
use std::any::Any;
use std::panic::{self, PanicHookInfo};
use std::thread;

use tracing::{error, level_filters::LevelFilter};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};

use crate::{AppConfig, CargoEnv};

pub struct LoggerGuards {
    pub _tracing_guard: WorkerGuard,
    // option because sentry is only loaded when a dsn is configured
    pub _sentry_guard: Option<sentry::ClientInitGuard>,
}

pub struct Logger {}

impl Logger {
    pub fn init(config: &AppConfig) -> LoggerGuards {
        let level = max_level(config.cargo_env, config.log_level);
        let (writer, guard) = Self::writer(config);

        let sentry_guard = config.sentry_dsn.clone().map(|dsn| {
            sentry::init((
                dsn,
                sentry::ClientOptions {
                    release: sentry::release_name!(),
                    environment: Some(environment_name(config.cargo_env).into()),
                    attach_stacktrace: true,
                    ..Default::default()
                },
            ))
        });

        use tracing_subscriber::layer::SubscriberExt;
        use tracing_subscriber::util::SubscriberInitExt;

        // colour codes only make sense on a terminal
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_ansi(matches!(config.cargo_env, CargoEnv::Development))
            .with_writer(writer);

        let registry = tracing_subscriber::registry().with(level).with(fmt_layer);

        if sentry_guard.is_some() {
            registry.with(sentry_tracing::layer()).init();
        } else {
            registry.init();
        }

        panic::set_hook(Box::new(log_panic));

        LoggerGuards {
            _tracing_guard: guard,
            _sentry_guard: sentry_guard,
        }
    }

    // development goes to stdout, production to a daily rotated file
    fn writer(config: &AppConfig) -> (NonBlocking, WorkerGuard) {
        match config.cargo_env {
            CargoEnv::Development => tracing_appender::non_blocking(std::io::stdout()),
            CargoEnv::Production => tracing_appender::non_blocking(
                tracing_appender::rolling::daily(&config.log_dir, &config.log_file),
            ),
        }
    }
}

/// An explicit `LOG_LEVEL` wins, otherwise development logs the per-fetch debug lines and
/// production stays at info.
pub fn max_level(cargo_env: CargoEnv, configured: Option<LevelFilter>) -> LevelFilter {
    configured.unwrap_or(match cargo_env {
        CargoEnv::Development => LevelFilter::DEBUG,
        CargoEnv::Production => LevelFilter::INFO,
    })
}

pub fn environment_name(cargo_env: CargoEnv) -> &'static str {
    match cargo_env {
        CargoEnv::Development => "development",
        CargoEnv::Production => "production",
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "Box<Any>"
    }
}

fn log_panic(info: &PanicHookInfo<'_>) {
    let current = thread::current();
    let name = current.name().unwrap_or("unknown");
    let msg = panic_message(info.payload());
    let at = info
        .location()
        .map(|location| format!(": {}:{}", location.file(), location.line()))
        .unwrap_or_default();

    error!(
        target: "panic",
        "thread '{}' panicked at '{}'{}\n{:?}",
        name,
        msg,
        at,
        backtrace::Backtrace::new()
    );
}
