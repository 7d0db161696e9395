use anyhow::{bail, Context};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use newengine_audio_ducking::{
    BackendKind, DuckingConfig, DuckingController, DuckingPlatform, DuckingSubscription,
    NullDuckingPlatform,
};
use newengine_modules_logging::{init_console_logger, ConsoleLoggerConfig};

const CONFIG_ENV: &str = "DUCKING_PROBE_CONFIG";

/// Backend handle kept alongside the trait object so the null journal can be printed.
enum Backend {
    Null(Arc<NullDuckingPlatform>),
    #[cfg(feature = "native")]
    Native(Arc<newengine_audio_ducking::ffi::SoundManagerLibrary>),
}

impl Backend {
    fn from_config(cfg: &DuckingConfig) -> anyhow::Result<Self> {
        match cfg.backend.kind {
            BackendKind::Null => Ok(Self::Null(Arc::new(NullDuckingPlatform::with_auto_notify(
                cfg.backend.auto_notify,
            )))),
            #[cfg(feature = "native")]
            BackendKind::Native => {
                use newengine_audio_ducking::ffi::SoundManagerLibrary;

                let lib = SoundManagerLibrary::open(&cfg.backend.library)?;
                Ok(Self::Native(Arc::new(lib)))
            }
            #[cfg(not(feature = "native"))]
            BackendKind::Native => bail!("native backend requires the `native` feature"),
        }
    }

    fn platform(&self) -> Arc<dyn DuckingPlatform> {
        match self {
            Self::Null(p) => p.clone() as Arc<dyn DuckingPlatform>,
            #[cfg(feature = "native")]
            Self::Native(p) => p.clone() as Arc<dyn DuckingPlatform>,
        }
    }
}

fn config_path() -> Option<PathBuf> {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
}

fn wait_for(sub: &DuckingSubscription, expected: bool, wait: Duration) {
    match sub.recv_timeout(wait) {
        Some(ev) if ev.is_ducked == expected => info!("state changed: ducked={}", ev.is_ducked),
        Some(ev) => warn!("state changed: ducked={} (expected {expected})", ev.is_ducked),
        None => warn!("no state change within {}ms", wait.as_millis()),
    }
}

fn main() -> anyhow::Result<()> {
    init_console_logger(&ConsoleLoggerConfig::from_env()).context("logger init failed")?;

    let cfg = match config_path() {
        Some(path) => DuckingConfig::load(&path)?,
        None => DuckingConfig::default(),
    };
    let params = cfg.session.params()?;
    let wait = Duration::from_millis(cfg.session.wait_ms);

    let backend = Backend::from_config(&cfg)?;
    let controller = DuckingController::new(cfg.session.category, backend.platform())?;
    info!("session open: {controller:?}");

    let sub = controller.subscribe_channel();

    controller.activate_with(params)?;
    info!(
        "activate: duration={}ms ratio={}",
        params.duration_ms(),
        params.ratio()
    );
    wait_for(&sub, true, wait);
    info!("is_ducked={}", controller.is_ducked()?);

    controller.deactivate()?;
    info!("deactivate");
    wait_for(&sub, false, wait);

    let ducked = controller.is_ducked()?;
    controller.release();
    info!("released");

    if let Backend::Null(p) = &backend {
        for call in p.calls() {
            info!("journal: {call:?}");
        }
    }

    if ducked {
        bail!("stream still ducked after deactivate");
    }
    Ok(())
}
