//! TUI Module - Pipeline Playback Dashboard
//!
//! Terminal interface that replays a question's journey through the
//! tokens → parse → semantic form → logic query pipeline.
//!
//! Architecture:
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        UI LAYER (widgets/)                          │
//! │  Pure rendering. Tree / expression / raw renderers + StageView.     │
//! └─────────────────────────────────────────────────────────────────────┘
//!                               ▲
//!                               │ PipelineView + view state
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      DOMAIN LAYER (state.rs)                        │
//! │  AppState: query lifecycle, PlaybackController, tree toggles.       │
//! └─────────────────────────────────────────────────────────────────────┘
//!                               ▲
//!                               │ RuntimeEvent channel
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    CONNECTOR LAYER (runtime/)                       │
//! │  RuntimeBridge trait. Backend calls on tokio tasks.                 │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

mod app;
mod events;
mod state;

pub mod runtime;
pub mod theme;
pub mod widgets;

use std::sync::Arc;

pub use app::TuiApp;
pub use state::{AppState, Focus, QueryStatus};
pub use theme::PipelineTheme;

use crate::backend::Backend;
use crate::config::ViewerConfig;

/// Run the TUI dashboard
pub async fn run(config: &ViewerConfig, backend: Arc<dyn Backend>) -> anyhow::Result<()> {
    let app = TuiApp::new(config, backend);
    app.run().await
}
