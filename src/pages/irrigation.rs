//! Irrigation control page: the only page that writes to the backend.
//!
//! Every change builds the full config locally, POSTs it, and on success
//! displays the server's echo rather than the locally built record. On
//! failure the displayed config is unchanged and an error toast is queued.
//!
//! The last server-confirmed config is cached under `irrigation_config` and
//! seeds the page on mount, so a dead backend still shows real settings.
//!
//! Manual pump writes are refused here while auto mode is on; the backend
//! itself accepts them.

use std::sync::{Mutex, MutexGuard};

use crate::api::ApiClient;
use crate::cache::{CacheKey, ClientCache};
use crate::models::IrrigationConfig;

// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Info,
    Error,
}

/// Transient notification for the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

/// What happened to a requested change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Server accepted; displayed config is the echo
    Saved,
    /// Refused locally; nothing was sent
    Rejected,
    /// Sent but failed; displayed config unchanged
    Failed,
}

/// Alert contact settings, saved as part of the config record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationSettings {
    pub alert_mobile: String,
    pub alert_email: String,
    pub enable_sms: bool,
    pub enable_email: bool,
}

#[derive(Debug)]
struct ControlState {
    config: IrrigationConfig,
    loaded: bool,
    toasts: Vec<Toast>,
}

/// View model for the irrigation control page
#[derive(Debug)]
pub struct IrrigationControl {
    api: ApiClient,
    cache: ClientCache,
    state: Mutex<ControlState>,
}

impl IrrigationControl {
    /// Seed from the cached config, or the backend's defaults.
    pub fn new(api: ApiClient, cache: ClientCache) -> Self {
        // ---
        let config = cache
            .get(CacheKey::IrrigationConfig)
            .unwrap_or_default();

        Self {
            api,
            cache,
            state: Mutex::new(ControlState {
                config,
                loaded: false,
                toasts: Vec::new(),
            }),
        }
    }

    pub fn config(&self) -> IrrigationConfig {
        self.lock().config.clone()
    }

    /// False until the first load attempt has finished.
    pub fn is_loaded(&self) -> bool {
        self.lock().loaded
    }

    /// Drain queued toasts, oldest first.
    pub fn take_toasts(&self) -> Vec<Toast> {
        std::mem::take(&mut self.lock().toasts)
    }

    /// Fetch the current config once, on mount.
    pub async fn load(&self) -> bool {
        // ---
        let result = self.api.config().await;
        match result {
            Ok(config) => {
                tracing::debug!("Loaded irrigation config: {:?}", config);
                {
                    let mut state = self.lock();
                    state.loaded = true;
                    state.config = config.clone();
                }
                self.persist(&config);
                true
            }
            Err(e) => {
                tracing::error!("Failed to fetch config: {}", e);
                let mut state = self.lock();
                state.loaded = true;
                push(&mut state, ToastLevel::Error, "Failed to load settings from server");
                false
            }
        }
    }

    /// Flip the manual pump. Refused while auto mode is on.
    pub async fn toggle_pump(&self) -> Outcome {
        let on = !self.config().manual_pump_state;
        self.set_pump(on).await
    }

    /// Switch the manual pump on or off. Refused while auto mode is on.
    pub async fn set_pump(&self, on: bool) -> Outcome {
        // ---
        let mut next = self.config();
        if next.auto_mode {
            self.toast(ToastLevel::Error, "Please switch to Manual mode first");
            return Outcome::Rejected;
        }

        next.manual_pump_state = on;
        let done = if on { "Pump turned ON" } else { "Pump turned OFF" };
        self.save(next, done.to_string()).await
    }

    pub async fn toggle_auto_mode(&self) -> Outcome {
        let on = !self.config().auto_mode;
        self.set_auto_mode(on).await
    }

    /// Enable or disable auto mode. Always allowed; in auto mode the
    /// controller owns the pump regardless of `manual_pump_state`.
    pub async fn set_auto_mode(&self, on: bool) -> Outcome {
        // ---
        let mut next = self.config();
        next.auto_mode = on;
        let done = if on { "Auto mode enabled" } else { "Manual mode enabled" };
        self.save(next, done.to_string()).await
    }

    /// Set the moisture level below which auto mode starts the pump.
    pub async fn update_threshold(&self, percent: f64) -> Outcome {
        // ---
        if !(0.0..=100.0).contains(&percent) {
            self.toast(
                ToastLevel::Error,
                format!("Threshold must be between 0 and 100, got {percent}"),
            );
            return Outcome::Rejected;
        }

        let mut next = self.config();
        next.moisture_threshold_percent = percent;
        self.save(next, format!("Moisture threshold updated to {percent}%"))
            .await
    }

    pub async fn update_notifications(&self, settings: NotificationSettings) -> Outcome {
        // ---
        let mut next = self.config();
        next.alert_mobile = settings.alert_mobile;
        next.alert_email = settings.alert_email;
        next.enable_sms = settings.enable_sms;
        next.enable_email = settings.enable_email;
        self.save(next, "Notification settings saved".to_string())
            .await
    }

    async fn save(&self, next: IrrigationConfig, success: String) -> Outcome {
        // ---
        match self.api.save_config(&next).await {
            Ok(echo) => {
                {
                    let mut state = self.lock();
                    state.config = echo.clone();
                    push(&mut state, ToastLevel::Success, success);
                }
                self.persist(&echo);
                Outcome::Saved
            }
            Err(e) => {
                tracing::error!("Failed to update config: {}", e);
                self.toast(ToastLevel::Error, "Failed to save settings");
                Outcome::Failed
            }
        }
    }

    fn persist(&self, config: &IrrigationConfig) {
        if let Err(e) = self.cache.set(CacheKey::IrrigationConfig, config) {
            tracing::warn!("Failed to cache irrigation config: {}", e);
        }
    }

    fn toast(&self, level: ToastLevel, message: impl Into<String>) {
        push(&mut self.lock(), level, message);
    }

    fn lock(&self) -> MutexGuard<'_, ControlState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }
}

fn push(state: &mut ControlState, level: ToastLevel, message: impl Into<String>) {
    let message = message.into();
    match level {
        ToastLevel::Error => tracing::warn!("{}", message),
        _ => tracing::info!("{}", message),
    }
    state.toasts.push(Toast { level, message });
}
