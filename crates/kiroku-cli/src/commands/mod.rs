//! Subcommands and the helpers they share.

pub mod attendance;
pub mod batch;
pub mod config;
pub mod process;

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use tracing::{debug, warn};

use kiroku_core::{CancelSignal, DocumentType, KirokuConfig, Strategy};

/// Document type as given on the command line.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum DocumentKind {
    /// 在留カード
    ResidenceCard,
    /// 履歴書
    Resume,
    /// 運転免許証
    DriverLicense,
    /// タイムカード
    TimerCard,
}

impl From<DocumentKind> for DocumentType {
    fn from(kind: DocumentKind) -> Self {
        match kind {
            DocumentKind::ResidenceCard => DocumentType::ResidenceCard,
            DocumentKind::Resume => DocumentType::Resume,
            DocumentKind::DriverLicense => DocumentType::DriverLicense,
            DocumentKind::TimerCard => DocumentType::TimerCard,
        }
    }
}

/// Provider strategy as given on the command line.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum StrategyArg {
    /// Cloud backend first
    PreferA,
    /// Local engine first
    PreferB,
    /// Both at once, merged
    Auto,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::PreferA => Strategy::PreferA,
            StrategyArg::PreferB => Strategy::PreferB,
            StrategyArg::Auto => Strategy::Auto,
        }
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kiroku")
        .join("config.json")
}

/// Load the explicit config file, else the default one if present, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<KirokuConfig> {
    if let Some(path) = config_path {
        return KirokuConfig::from_file(Path::new(path))
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path, e));
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using config at {}", default_path.display());
        Ok(KirokuConfig::from_file(&default_path)?)
    } else {
        Ok(KirokuConfig::default())
    }
}

/// Cancellation signal that fires on Ctrl-C.
pub fn cancel_on_ctrl_c() -> CancelSignal {
    let (handle, signal) = CancelSignal::pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling in-flight work");
            handle.cancel();
        }
    });
    signal
}
