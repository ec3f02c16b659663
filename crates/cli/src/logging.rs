use crate::config::{LoggingConfig, LoggingLevelsConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer};

/// Most verbose level enabled in the config; `off` when none are.
fn level_from_flags(levels: &LoggingLevelsConfig) -> &'static str {
    let mut level = "off";
    if levels.critical || levels.error {
        level = "error";
    }
    if levels.warning {
        level = "warn";
    }
    if levels.info {
        level = "info";
    }
    if levels.debug {
        level = "debug";
    }
    level
}

/// Install the global subscriber. Logs go to stderr so stdout stays clean for
/// results; `RUST_LOG` overrides the configured level.
pub fn init_logging(config: &LoggingConfig) {
    let level = level_from_flags(&config.levels);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let show_file = config.format.location.show_file;
    let show_line = config.format.location.show_line;

    let base = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(show_file)
        .with_file(show_file)
        .with_line_number(show_line)
        .with_thread_ids(false);

    // Layer::boxed() unifies the formatter types across branches
    let fmt_layer = match (config.format.json, config.format.show_time) {
        (true, true) => base.json().boxed(),
        (true, false) => base.json().without_time().boxed(),
        (false, true) => base.boxed(),
        (false, false) => base.without_time().boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels(debug: bool, info: bool, warning: bool, error: bool) -> LoggingLevelsConfig {
        LoggingLevelsConfig {
            debug,
            info,
            warning,
            error,
            critical: error,
        }
    }

    #[test]
    fn test_most_verbose_level_wins() {
        assert_eq!(level_from_flags(&levels(true, true, true, true)), "debug");
        assert_eq!(level_from_flags(&levels(false, true, true, true)), "info");
        assert_eq!(level_from_flags(&levels(false, false, true, true)), "warn");
        assert_eq!(level_from_flags(&levels(false, false, false, true)), "error");
        assert_eq!(level_from_flags(&levels(false, false, false, false)), "off");
    }
}
