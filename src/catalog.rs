//! Book catalog queries with graceful degradation.
//!
//! Searches go through a [`LifecycleController`] so rapid re-triggers are
//! collapsed and stale responses discarded. When the remote call fails for
//! any reason other than cancellation, the fallback catalog is filtered with
//! the same normalized criteria and returned together with the original
//! error, so the host can show a degraded-mode notice instead of a hard
//! failure.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::api::{CatalogTransport, CreateBookPayload};
use crate::error::{ErrorInfo, RequestError};
use crate::fallback;
use crate::lifecycle::{LifecycleController, Operation, RequestState};
use crate::model::{BookDetail, BookSummary, CreatedBook, FilterCriteria, NewBook};
use crate::session::{ANONYMOUS_USER_ID, SessionProvider};

/// Where a search result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Remote,
    Fallback,
}

/// Result of one catalog search. `error` is populated exactly when `source`
/// is [`DataSource::Fallback`], so live and degraded data stay
/// distinguishable.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub books: Vec<BookSummary>,
    pub source: DataSource,
    pub error: Option<ErrorInfo>,
}

struct CatalogSearchOp {
    transport: Arc<dyn CatalogTransport>,
}

#[async_trait]
impl Operation<FilterCriteria, SearchOutcome> for CatalogSearchOp {
    async fn run(
        &self,
        criteria: FilterCriteria,
        cancel: CancellationToken,
    ) -> Result<SearchOutcome, RequestError> {
        // Normalize once; the remote parameters and the fallback predicate
        // must see identical criteria.
        let criteria = criteria.normalized();
        match self.transport.list_books(&criteria, cancel).await {
            Ok(books) => {
                info!(count = books.len(), "Remote search succeeded");
                Ok(SearchOutcome {
                    books,
                    source: DataSource::Remote,
                    error: None,
                })
            }
            Err(err) if err.is_cancellation() => Err(err),
            Err(err) => {
                warn!(error = %err, "Remote search failed; serving fallback catalog");
                let books = fallback::shared().filter(&criteria);
                Ok(SearchOutcome {
                    books,
                    source: DataSource::Fallback,
                    error: Some(ErrorInfo::from(&err)),
                })
            }
        }
    }
}

/// Resolves filter criteria into book lists, preferring the remote service.
/// Also hosts the one-shot detail and create operations.
pub struct CatalogQueryService {
    controller: LifecycleController<FilterCriteria, SearchOutcome>,
    transport: Arc<dyn CatalogTransport>,
    session: Arc<dyn SessionProvider>,
}

impl CatalogQueryService {
    pub fn new(
        transport: Arc<dyn CatalogTransport>,
        session: Arc<dyn SessionProvider>,
        search_debounce: Duration,
    ) -> Self {
        let op = Arc::new(CatalogSearchOp {
            transport: Arc::clone(&transport),
        });
        Self {
            controller: LifecycleController::new(op, search_debounce),
            transport,
            session,
        }
    }

    /// Trigger a search. Empty criteria list the whole catalog.
    pub fn search(&mut self, criteria: FilterCriteria) {
        self.controller.configure(Some(criteria), true);
    }

    /// Abort the current search, if any.
    pub fn cancel(&mut self) {
        self.controller.cancel();
    }

    pub fn state(&self) -> RequestState<SearchOutcome> {
        self.controller.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState<SearchOutcome>> {
        self.controller.subscribe()
    }

    /// One-shot `GET /books/{id}`. No fallback: a missing detail is a real
    /// error at the consuming boundary.
    pub async fn book_detail(
        &self,
        id: &str,
        cancel: CancellationToken,
    ) -> Result<BookDetail, RequestError> {
        self.transport.book_detail(id, cancel).await
    }

    /// One-shot `POST /books`, stamping the draft with the session's user id
    /// (or the anonymous placeholder when no session exists).
    pub async fn create_book(
        &self,
        draft: NewBook,
        cancel: CancellationToken,
    ) -> Result<CreatedBook, RequestError> {
        let user_id = self
            .session
            .current_user_id()
            .unwrap_or_else(|| ANONYMOUS_USER_ID.to_string());
        let payload = CreateBookPayload {
            user_id,
            title: draft.title,
            author: draft.author,
            category: draft.category,
            description: draft.description,
            ai_summary: draft.ai_summary,
        };
        self.transport.create_book(payload, cancel).await
    }
}
