//! Tracing subscriber setup

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a formatted subscriber filtered by `RUST_LOG`, or by
/// `default_level` (e.g. `"info"`, `"this_admin=debug"`) when unset
///
/// Returns an error when a global subscriber is already installed.
pub fn init_tracing(default_level: &str) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        let _ = init_tracing("debug");
        assert!(init_tracing("debug").is_err());
    }
}
