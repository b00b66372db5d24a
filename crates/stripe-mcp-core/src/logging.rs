use once_cell::sync::Lazy;
use tracing_subscriber::EnvFilter;

static INIT: Lazy<()> = Lazy::new(|| {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(std::env::var_os("DEBUG").is_some())));

    // stdout carries the protocol, so everything goes to stderr
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();
});

fn default_level(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "info"
    }
}

pub fn setup() {
    Lazy::force(&INIT);
}
