//! `fieldwatch-dashboard`: terminal dashboard for the smart-agriculture
//! irrigation monitor.
//!
//! Every page is a polling view model over the irrigation backend's REST API
//! (`/api/sensors`, `/api/config`, `/api/alerts`, `/api/status`) and the
//! Open-Meteo forecast API. Snapshots are cached on disk so a restart or a
//! backend outage still shows the last-known-good data.

pub mod api;
pub mod app;
pub mod cache;
pub mod config;
pub mod error;
pub mod io;
pub mod models;
pub mod pages;
pub mod poller;
pub mod render;
pub mod status;
pub mod weather;

pub use app::App;
pub use cache::{CacheKey, ClientCache, Theme};
pub use config::Config;
pub use error::{CacheError, FetchError};
pub use poller::{start_polling, Feed, PollHandle, ViewModel};
