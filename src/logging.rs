//! Logging bootstrap: `log` facade with an `env_logger` backend on stderr.

use log::LevelFilter;

/// Map `-v` occurrences to a level: none is warn, one is info, more is debug.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

/// Install the logger. `RUST_LOG` is applied on top of the verbosity level.
/// A second call is a no-op.
pub fn setup_logging(verbosity: u8) {
    let _ = env_logger::Builder::new()
        .filter_level(level_for(verbosity))
        .parse_default_env()
        .format_timestamp(None)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for() {
        assert_eq!(level_for(0), LevelFilter::Warn);
        assert_eq!(level_for(1), LevelFilter::Info);
        assert_eq!(level_for(2), LevelFilter::Debug);
        assert_eq!(level_for(9), LevelFilter::Debug);
    }
}
