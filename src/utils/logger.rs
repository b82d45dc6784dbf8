use log::LevelFilter;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::{
    CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
};
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::{Path, PathBuf};

type LogResult = Result<(), Box<dyn std::error::Error>>;

/// Target used for per-exec query records.
pub const QUERY_TARGET: &str = "siddon::query";

const ROLL_SIZE: u64 = 10 * 1024 * 1024;
const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";

/// Initializes logging from `log4rs.yaml` in the working directory.
/// A missing file leaves logging unconfigured.
///
/// # Errors
/// Returns an error if the file exists but cannot be loaded.
pub fn init() -> LogResult {
    let path = Path::new("log4rs.yaml");
    if !path.exists() {
        return Ok(());
    }
    init_path(path)
}

/// Initializes logging from a specific config file.
///
/// # Errors
/// Returns an error if the file cannot be read or a logger is already installed.
pub fn init_path(path: &Path) -> LogResult {
    log4rs::init_file(path, log4rs::config::Deserializers::default())?;
    Ok(())
}

fn parse_level(level: Option<&str>) -> LevelFilter {
    match level.unwrap_or("info").to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

fn rolling(base: &Path, stem: &str, keep: u32) -> Result<RollingFileAppender, Box<dyn std::error::Error>> {
    let roller = FixedWindowRoller::builder().build(&format!("{}", base.join(format!("{stem}.{{}}.log")).display()), keep)?;
    let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(ROLL_SIZE)), Box::new(roller));
    Ok(RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build(base.join(format!("{stem}.log")), Box::new(policy))?)
}

/// Configures process-wide logging with two rolling files under `dir`:
/// `app.log` for everything and `query.log` for [`QUERY_TARGET`].
///
/// - dir: base directory; current directory when `None`
/// - level: off|error|warn|info|debug|trace (default info)
/// - retention: rolled files to keep (default 7)
///
/// If a logger is already installed the call is a no-op.
///
/// # Errors
/// Returns an error if the directory or appenders cannot be created.
pub fn configure_logging(dir: Option<&Path>, level: Option<&str>, retention: Option<usize>) -> LogResult {
    let base = match dir {
        Some(d) => d.to_path_buf(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    std::fs::create_dir_all(&base)?;
    let keep = u32::try_from(retention.unwrap_or(7)).unwrap_or(u32::MAX);
    let lvl = parse_level(level);

    let config = Config::builder()
        .appender(Appender::builder().build("app", Box::new(rolling(&base, "app", keep)?)))
        .appender(Appender::builder().build("query", Box::new(rolling(&base, "query", keep)?)))
        .logger(Logger::builder().appender("query").additive(false).build(QUERY_TARGET, lvl))
        .build(Root::builder().appender("app").build(lvl))?;
    // A logger installed earlier in the process stays in place.
    let installed: Result<_, log::SetLoggerError> = log4rs::init_config(config);
    if let Err(err) = installed {
        log::debug!("keeping existing logger: {err}");
    }
    Ok(())
}

/// Configures logging from environment variables when present:
/// - `SIDDON_LOG_DIR`
/// - `SIDDON_LOG_LEVEL`
/// - `SIDDON_LOG_RETENTION`
///
/// # Errors
/// See [`configure_logging`].
pub fn configure_from_env() -> LogResult {
    let dir = std::env::var("SIDDON_LOG_DIR").ok().map(PathBuf::from);
    let level = std::env::var("SIDDON_LOG_LEVEL").ok();
    let retention = std::env::var("SIDDON_LOG_RETENTION").ok().and_then(|s| s.parse::<usize>().ok());
    configure_logging(dir.as_deref(), level.as_deref(), retention)
}
