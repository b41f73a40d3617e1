use crate::config::LOG_ENV;
use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Installs a stderr subscriber when `ALSA_SNDIO_LOG` is set. An already
/// installed global subscriber is left alone.
pub fn init() {
    INIT.call_once(|| {
        let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) else {
            return;
        };
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
