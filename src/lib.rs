pub mod anchor;
pub mod app;
pub mod backend;
pub mod clock;
pub mod config;
pub mod errors;
pub mod export;
pub mod handlers;
pub mod models;
pub mod notices;
pub mod records;
pub mod refresh;
pub mod state;
pub mod sync;
pub mod synclog;
pub mod ticker;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use refresh::refresh_modules;
pub use state::AppState;
pub use sync::{TriggerOutcome, trigger_sync};
pub use ticker::spawn_ticker;
