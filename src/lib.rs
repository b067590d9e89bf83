//! Data-access core for a book-catalog UI.
//!
//! The host view layer calls in on every relevant input event (keystroke,
//! field change, toggle) and renders the state snapshots published here.
//! All temporal logic lives in [`lifecycle::LifecycleController`]: debounced
//! triggering, in-flight cancellation, and race-safe result application via
//! a generation counter. [`catalog::CatalogQueryService`] degrades to the
//! local [`fallback`] dataset when the backend is unreachable, and
//! [`suggest::SuggestionGenerator`] produces AI blurbs for the book form.

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fallback;
pub mod lifecycle;
pub mod model;
pub mod session;
pub mod suggest;

pub use api::{ApiClient, CatalogTransport};
pub use catalog::{CatalogQueryService, DataSource, SearchOutcome};
pub use config::{CatalogConfig, LogLevel, load_config};
pub use error::{ErrorInfo, RequestError};
pub use lifecycle::{LifecycleController, Operation, RequestPhase, RequestState};
pub use model::{
    ALL_CATEGORIES, BookDetail, BookSummary, CreatedBook, FieldSnapshot, FilterCriteria, NewBook,
    Suggestion,
};
pub use session::{ANONYMOUS_USER_ID, FixedSession, SessionProvider};
pub use suggest::{SuggestionGenerator, SuggestionView, build_prompt};

use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install a global tracing subscriber for hosts that do not bring their
/// own. `RUST_LOG` overrides the configured level.
pub fn init_tracing(level: LogLevel) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_filter_str()));
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(env_filter),
        )
        .init();
    warn!("Logging initialized; override level with config.log_level or RUST_LOG");
}
