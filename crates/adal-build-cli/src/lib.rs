use adal_build_core::paths;
use std::path::PathBuf;

/// Install the fmt subscriber shared by every binary: `RUST_LOG` filters,
/// warnings and errors are always shown.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Project root from `ADAL_BUILD_ROOT`, or discovered from the working
/// directory.
pub fn project_root() -> PathBuf {
    let explicit = std::env::var_os(paths::ROOT_ENV).map(PathBuf::from);
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    paths::resolve_root(explicit.as_deref(), &cwd)
}
