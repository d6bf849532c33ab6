use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `level` (or `debug` when `debug` is
/// true) is used. Fails on an unknown level or when a subscriber is already
/// installed.
pub fn init_logging(level: &str, debug: bool) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_level() {
        let err = init_logging("chatty", false).unwrap_err();
        assert!(err.to_string().contains("Invalid log level"));
    }

    #[test]
    fn second_install_is_an_error() {
        let _ = init_logging("info", false);
        assert!(init_logging("info", true).is_err());
    }
}
