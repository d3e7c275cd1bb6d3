use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format of the installed subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Install a global `tracing` subscriber
///
/// `RUST_LOG` wins when set; otherwise `default_directive` (e.g.
/// `relayx=info`) applies. Returns `false` if a subscriber was already
/// installed.
pub fn init_tracing(default_directive: &str, format: LogFormat) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let registry = tracing_subscriber::registry().with(filter);
    let result = match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
    };
    result.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_install_is_rejected() {
        let _ = init_tracing("relayx=debug", LogFormat::Text);
        assert!(!init_tracing("relayx=debug", LogFormat::Json));
    }
}
