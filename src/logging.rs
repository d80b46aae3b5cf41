use std::io::IsTerminal as _;

use anyhow::Context as _;

/// Installs the stderr subscriber. `RUST_LOG` wins over the `--quiet` level.
pub fn init(quiet: bool) -> anyhow::Result<()> {
    let directive = default_directive(quiet);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(directive))
        .with_context(|| format!("build log filter: {directive}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("initialize tracing subscriber: {err}"))?;

    Ok(())
}

fn default_directive(quiet: bool) -> &'static str {
    if quiet { "warn" } else { "info" }
}
