// zohosync/src/utils/logging.rs
use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

// Third-party crates log every statement/request at info; keep them quiet.
const NOISY_TARGETS: [&str; 4] = ["sqlx", "hyper", "hyper_util", "reqwest"];

/// Installs the global subscriber: full detail to `log_file` (truncated on
/// every run) at `level`, warnings and errors only on stdout.
pub fn init_logging(level: &str, log_file: &Path) -> Result<()> {
    let file = File::create(log_file)
        .with_context(|| format!("Failed to create log file at {}", log_file.display()))?;

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(Mutex::new(file))
        .with_filter(file_filter(level));

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stdout)
        .with_filter(LevelFilter::WARN);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!(
        "Logging configured. Level: {}. Log file: {}",
        level,
        log_file.display()
    );
    Ok(())
}

fn file_filter(level: &str) -> EnvFilter {
    let level = match level.trim().to_ascii_uppercase().as_str() {
        "WARNING" => LevelFilter::WARN,
        "CRITICAL" | "FATAL" => LevelFilter::ERROR,
        other => LevelFilter::from_str(other).unwrap_or(LevelFilter::INFO),
    };
    // Noisy crates never log above WARN nor above the requested level.
    let noisy_level = level.min(LevelFilter::WARN);
    let directives: Vec<String> = std::iter::once(level.to_string())
        .chain(NOISY_TARGETS.iter().map(|target| format!("{}={}", target, noisy_level)))
        .collect();
    EnvFilter::new(directives.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_filter_accepts_uppercase_level() {
        let filter = file_filter("DEBUG");
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn test_file_filter_maps_python_style_levels() {
        assert_eq!(file_filter("WARNING").max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(file_filter("CRITICAL").max_level_hint(), Some(LevelFilter::ERROR));
    }

    #[test]
    fn test_noisy_crates_follow_stricter_levels() {
        let error_only = file_filter("ERROR");
        assert_eq!(error_only.max_level_hint(), Some(LevelFilter::ERROR));
        assert!(!error_only.to_string().contains("sqlx=warn"));

        let off = file_filter("OFF");
        assert_eq!(off.max_level_hint(), Some(LevelFilter::OFF));
    }

    #[test]
    fn test_noisy_crates_capped_at_warn_for_verbose_levels() {
        let filter = file_filter("TRACE").to_string();
        assert!(filter.contains("sqlx=warn"));
        assert!(filter.contains("reqwest=warn"));
    }

    #[test]
    fn test_file_filter_falls_back_to_info() {
        let filter = file_filter("loud");
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    }
}
