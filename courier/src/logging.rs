// Logging for Courier
//
// Courier logs through the `tracing` facade. Nothing is printed until the
// application installs a subscriber, either its own or one of the presets
// below built on `tracing-subscriber`.
//
// # Usage Examples
//
// ```rust
// use courier::logging;
//
// // INFO level, human readable console output
// logging::init_default();
//
// // Or tune it
// let config = logging::LogConfig {
//     level: tracing::Level::DEBUG,
//     json_format: false,
//     ..Default::default()
// };
// logging::init(config);
// ```
//
// Scheduling decisions log at TRACE, drain results at DEBUG, pool lifecycle at
// INFO, rejected submissions at WARN and handler failures at ERROR. Set
// `RUST_LOG=courier=trace` to watch every claim and release.

use std::io;
use std::sync::Once;
use tracing::{Level, Subscriber};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Configuration for the Courier logging presets
///
/// # Examples
///
/// ```rust
/// use courier::logging::LogConfig;
/// use tracing::Level;
///
/// let config = LogConfig {
///     level: Level::DEBUG,
///     json_format: true,
///     show_file_line: false,
///     show_thread_info: true,
///     show_time: true,
///     target_filters: Some("courier::agent=trace".to_string()),
/// };
/// ```
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level to display
    pub level: Level,
    /// Whether to use JSON format for logs
    pub json_format: bool,
    /// Whether to include file and line information
    pub show_file_line: bool,
    /// Whether to include thread name/id, handy since handlers run on pool workers
    pub show_thread_info: bool,
    /// Whether to include timestamps
    pub show_time: bool,
    /// Target filter expressions (format: "target=level,target2=level2,...")
    pub target_filters: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            show_file_line: true,
            show_thread_info: true,
            show_time: true,
            target_filters: None,
        }
    }
}

static INIT: Once = Once::new();

fn env_filter(config: &LogConfig) -> EnvFilter {
    let mut filter = EnvFilter::from_default_env().add_directive(config.level.into());
    if let Some(filters) = &config.target_filters {
        for directive in filters.split(',') {
            if let Ok(directive) = directive.trim().parse() {
                filter = filter.add_directive(directive);
            }
        }
    }
    filter
}

/// Install the global subscriber described by `config`.
///
/// Only the first call in a process takes effect.
pub fn init(config: LogConfig) {
    INIT.call_once(|| {
        let registry = tracing_subscriber::registry().with(env_filter(&config));

        let subscriber: Box<dyn Subscriber + Send + Sync> = match (config.json_format, config.show_time) {
            (true, _) => Box::new(registry.with(fmt::layer().json().flatten_event(true))),
            (false, true) => Box::new(registry.with(console_layer(&config))),
            (false, false) => Box::new(registry.with(console_layer(&config).without_time())),
        };

        set_global_subscriber(subscriber);
    });
}

fn console_layer<S>(config: &LogConfig) -> fmt::Layer<S> {
    fmt::layer()
        .with_ansi(atty::is(atty::Stream::Stdout))
        .with_file(config.show_file_line)
        .with_line_number(config.show_file_line)
        .with_thread_names(config.show_thread_info)
        .with_thread_ids(config.show_thread_info)
}

fn set_global_subscriber<S>(subscriber: S)
where
    S: Subscriber + Send + Sync + 'static,
{
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Error setting global tracing subscriber: {}", err);
    }
}

/// Log to the console and append plain-text records to `log_file`.
pub fn init_with_file(config: LogConfig, log_file: &str) -> Result<(), io::Error> {
    // Fail early rather than inside the writer closure.
    file_writer(log_file)?;

    INIT.call_once(|| {
        let path = log_file.to_string();
        let file_layer = fmt::layer()
            .with_ansi(false)
            .with_writer(move || match file_writer(&path) {
                Ok(writer) => writer,
                Err(_) => Box::new(io::stderr()),
            })
            .with_file(true)
            .with_line_number(true)
            .with_thread_names(true)
            .with_thread_ids(true);

        let subscriber = tracing_subscriber::registry()
            .with(env_filter(&config))
            .with(console_layer(&config))
            .with(file_layer);

        set_global_subscriber(subscriber);
    });

    Ok(())
}

/// Open `path` for appending, creating it if needed.
pub fn file_writer(path: &str) -> io::Result<Box<dyn io::Write + Send + Sync + 'static>> {
    let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
    Ok(Box::new(file))
}

/// INFO level, human readable console output.
pub fn init_default() {
    init(LogConfig::default());
}

/// DEBUG everywhere and TRACE for the scheduling loop.
pub fn init_development() {
    init(LogConfig {
        level: Level::DEBUG,
        target_filters: Some("courier=debug,courier::agent=trace".to_string()),
        ..Default::default()
    });
}

/// JSON records at INFO, without source locations.
pub fn init_production() {
    init(LogConfig {
        level: Level::INFO,
        json_format: true,
        show_file_line: false,
        show_thread_info: true,
        show_time: true,
        target_filters: None,
    });
}

/// WARN and above, compact, for test binaries.
pub fn init_test() {
    init(LogConfig {
        level: Level::WARN,
        json_format: false,
        show_file_line: true,
        show_thread_info: false,
        show_time: false,
        target_filters: None,
    });
}

/// Span covering work done on behalf of one agent
///
/// ```rust
/// let span = courier::agent_span!("orders", "5f1c...");
/// let _guard = span.enter();
/// ```
#[macro_export]
macro_rules! agent_span {
    ($agent_name:expr, $agent_id:expr) => {
        $crate::logging::debug_span!("agent", name = %$agent_name, id = %$agent_id)
    };
    ($agent_name:expr, $agent_id:expr, $($fields:tt)*) => {
        $crate::logging::debug_span!("agent", name = %$agent_name, id = %$agent_id, $($fields)*)
    };
}

/// Outcome of handing one message to a handler
#[macro_export]
macro_rules! log_delivery {
    ($agent_name:expr, $status:expr) => {
        $crate::logging::debug!(agent = %$agent_name, status = $status)
    };
    ($agent_name:expr, $status:expr, $($fields:tt)*) => {
        $crate::logging::debug!(agent = %$agent_name, status = $status, $($fields)*)
    };
}

/// Claim, release and submission decisions of the scheduling loop
#[macro_export]
macro_rules! log_scheduler {
    ($agent_name:expr, $event:expr) => {
        $crate::logging::trace!(agent = %$agent_name, event = $event)
    };
    ($agent_name:expr, $event:expr, $($fields:tt)*) => {
        $crate::logging::trace!(agent = %$agent_name, event = $event, $($fields)*)
    };
}

/// Worker pool lifecycle events
#[macro_export]
macro_rules! log_pool {
    ($pool_name:expr, $event:expr) => {
        $crate::logging::info!(pool = %$pool_name, event = $event)
    };
    ($pool_name:expr, $event:expr, $($fields:tt)*) => {
        $crate::logging::info!(pool = %$pool_name, event = $event, $($fields)*)
    };
}

/// Error conditions, with the error rendered through `Display`
#[macro_export]
macro_rules! log_error {
    ($error:expr) => {
        $crate::logging::error!(error = %$error)
    };
    ($error:expr, $($fields:tt)*) => {
        $crate::logging::error!(error = %$error, $($fields)*)
    };
}

/// The dispatcher active on the calling thread.
///
/// Worker threads adopt the dispatcher of the thread that built their pool,
/// so scoped subscribers in tests also see what the workers log. When that
/// thread had no subscriber at all, workers fall back to the global default
/// at the time each event is emitted.
#[inline]
pub fn current_subscriber() -> tracing::Dispatch {
    tracing::dispatcher::get_default(|d| d.clone())
}

pub use tracing::{debug, debug_span, error, info, info_span, trace, warn};
