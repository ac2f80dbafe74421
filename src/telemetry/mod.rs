use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

/// Installs the global subscriber. `RUST_LOG` wins over `log_level`; logs go
/// to stderr so command output on stdout stays machine readable.
pub fn init_tracing(log_level: &str, json_output: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;
    let subscriber = Registry::default().with(env_filter);

    if json_output {
        let json_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true);
        tracing::subscriber::set_global_default(subscriber.with(json_layer))?;
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true);
        tracing::subscriber::set_global_default(subscriber.with(fmt_layer))?;
    }
    Ok(())
}
