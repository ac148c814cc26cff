//! msync-config
//!
//! Run configuration: tunable sync settings loaded from YAML (with a
//! deterministic config hash for the run report) and marketplace
//! credentials resolved from the environment exactly once at startup.
//!
//! The core crates never read files or env vars themselves; they receive
//! already-validated values from here.

mod credentials;
mod settings;

pub use credentials::{
    resolve_ozon_credentials, resolve_yandex_credentials, OzonCredentials, YandexCredentials,
};
pub use settings::{load_settings, settings_hash, SyncSettings};
