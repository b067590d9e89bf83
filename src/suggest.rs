//! AI-assisted blurb generation for the book form.
//!
//! Watches the form's metadata fields behind an activation toggle. Every
//! qualifying field change cancels the previous attempt and reschedules one
//! after the debounce delay; a generation only runs while the toggle is on
//! and both title and author are non-blank. Discarding a suggestion also
//! aborts anything scheduled or in flight, so text the user explicitly
//! cleared cannot reappear from a stale request.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::CatalogTransport;
use crate::error::{ErrorInfo, RequestError};
use crate::lifecycle::{LifecycleController, Operation, RequestPhase};
use crate::model::{FieldSnapshot, Suggestion};

/// What the form renders: tri-state minus the internals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionView {
    pub loading: bool,
    pub suggestion: String,
    pub error: Option<ErrorInfo>,
}

/// Build the generation prompt from a field snapshot. Pure; missing fields
/// are rendered as explicit markers rather than omitted.
pub fn build_prompt(fields: &FieldSnapshot) -> String {
    let or_marker = |value: &str, marker: &str| {
        let value = value.trim();
        if value.is_empty() {
            marker.to_string()
        } else {
            value.to_string()
        }
    };
    format!(
        "Using the following book metadata, write an introduction of 200 to 300 \
characters in English that makes readers want to pick the book up.\n\
- Title: {title}\n\
- Author: {author}\n\
- Category: {category}\n\
- Reference description: {description}\n\
\n\
Requirements:\n\
- Condense the core value into two or three persuasive points\n\
- No hype or promotional phrasing; stay information-centered\n\
- Use correct punctuation and spacing",
        title = or_marker(&fields.title, "(not provided)"),
        author = or_marker(&fields.author, "(not provided)"),
        category = or_marker(&fields.category, "(not provided)"),
        description = or_marker(&fields.description, "(none)"),
    )
}

struct GenerateSuggestionOp {
    transport: Arc<dyn CatalogTransport>,
}

#[async_trait]
impl Operation<FieldSnapshot, Suggestion> for GenerateSuggestionOp {
    async fn run(
        &self,
        fields: FieldSnapshot,
        cancel: CancellationToken,
    ) -> Result<Suggestion, RequestError> {
        let prompt = build_prompt(&fields);
        let text = self.transport.generate_text(&prompt, cancel).await?;
        Ok(Suggestion {
            text,
            source_fields: fields,
        })
    }
}

/// Debounced AI suggestion generation over the watched form fields.
pub struct SuggestionGenerator {
    controller: LifecycleController<FieldSnapshot, Suggestion>,
    fields: FieldSnapshot,
    auto: bool,
}

impl SuggestionGenerator {
    pub fn new(transport: Arc<dyn CatalogTransport>, debounce: Duration) -> Self {
        let op = Arc::new(GenerateSuggestionOp { transport });
        Self {
            controller: LifecycleController::new(op, debounce),
            fields: FieldSnapshot::default(),
            auto: false,
        }
    }

    /// Toggle automatic generation. Turning it off immediately cancels any
    /// scheduled or in-flight generation and clears the suggestion; turning
    /// it on triggers a generation if the fields already qualify.
    pub fn set_auto(&mut self, auto: bool) {
        self.auto = auto;
        self.reconfigure();
    }

    /// Called by the form on every change to the watched fields.
    pub fn set_fields(&mut self, fields: FieldSnapshot) {
        self.fields = fields;
        self.reconfigure();
    }

    pub fn fields(&self) -> &FieldSnapshot {
        &self.fields
    }

    pub fn description(&self) -> &str {
        &self.fields.description
    }

    /// Copy the current suggestion into the description field. No-op while
    /// no suggestion is present. The description is a watched field, so this
    /// reconfigures like any other edit.
    pub fn apply_suggestion(&mut self) {
        let Some(suggestion) = self.controller.state().result else {
            return;
        };
        if suggestion.text.is_empty() {
            return;
        }
        debug!("Applying AI suggestion to description");
        self.fields.description = suggestion.text;
        self.reconfigure();
    }

    /// Clear the current suggestion and abort anything scheduled or in
    /// flight.
    pub fn discard_suggestion(&mut self) {
        self.controller.reset();
    }

    pub fn view(&self) -> SuggestionView {
        let state = self.controller.state();
        SuggestionView {
            loading: state.phase == RequestPhase::Loading,
            suggestion: state
                .result
                .map(|suggestion| suggestion.text)
                .unwrap_or_default(),
            error: state.error,
        }
    }

    fn reconfigure(&mut self) {
        let qualified = self.auto
            && !self.fields.title.trim().is_empty()
            && !self.fields.author.trim().is_empty();
        if qualified {
            self.controller.configure(Some(self.fields.clone()), true);
        } else {
            self.controller.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::task::yield_now;
    use tokio::time::{advance, sleep};

    use crate::api::CreateBookPayload;
    use crate::model::{BookDetail, BookSummary, CreatedBook, FilterCriteria};

    /// Replies with a fixed blurb after a scripted delay, recording prompts.
    struct ScriptedAi {
        reply: String,
        delay: Duration,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedAi {
        fn instant(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                delay: Duration::ZERO,
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn slow(reply: &str, delay_ms: u64) -> Self {
            Self {
                reply: reply.to_string(),
                delay: Duration::from_millis(delay_ms),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn prompt_count(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CatalogTransport for ScriptedAi {
        async fn list_books(
            &self,
            _criteria: &FilterCriteria,
            _cancel: CancellationToken,
        ) -> Result<Vec<BookSummary>, RequestError> {
            unreachable!("suggestion tests never list books")
        }

        async fn book_detail(
            &self,
            _id: &str,
            _cancel: CancellationToken,
        ) -> Result<BookDetail, RequestError> {
            unreachable!("suggestion tests never fetch details")
        }

        async fn create_book(
            &self,
            _payload: CreateBookPayload,
            _cancel: CancellationToken,
        ) -> Result<CreatedBook, RequestError> {
            unreachable!("suggestion tests never create books")
        }

        async fn generate_text(
            &self,
            prompt: &str,
            _cancel: CancellationToken,
        ) -> Result<String, RequestError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if self.delay > Duration::ZERO {
                sleep(self.delay).await;
            }
            Ok(self.reply.clone())
        }
    }

    async fn settle() {
        for _ in 0..16 {
            yield_now().await;
        }
    }

    fn snapshot(title: &str, author: &str) -> FieldSnapshot {
        FieldSnapshot {
            title: title.to_string(),
            author: author.to_string(),
            ..FieldSnapshot::default()
        }
    }

    #[test]
    fn prompt_embeds_all_fields_with_markers_for_missing_ones() {
        let prompt = build_prompt(&FieldSnapshot {
            title: "AI Product Design".to_string(),
            author: "Alice Kim".to_string(),
            category: String::new(),
            description: "  ".to_string(),
        });
        assert!(prompt.contains("- Title: AI Product Design"));
        assert!(prompt.contains("- Author: Alice Kim"));
        assert!(prompt.contains("- Category: (not provided)"));
        assert!(prompt.contains("- Reference description: (none)"));
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_field_edits_collapse_to_one_generation() {
        let ai = Arc::new(ScriptedAi::instant("A concise blurb."));
        let mut generator =
            SuggestionGenerator::new(Arc::clone(&ai) as Arc<dyn CatalogTransport>, Duration::from_millis(600));

        generator.set_auto(true);
        generator.set_fields(snapshot("Clean", "Robert Martin"));
        settle().await;
        advance(Duration::from_millis(200)).await;
        generator.set_fields(snapshot("Clean Code", "Robert Martin"));
        settle().await;
        advance(Duration::from_millis(700)).await;
        settle().await;

        assert_eq!(ai.prompt_count(), 1);
        assert!(ai.prompts.lock().unwrap()[0].contains("- Title: Clean Code"));
        assert_eq!(generator.view().suggestion, "A concise blurb.");
    }

    #[tokio::test(start_paused = true)]
    async fn blank_author_never_issues_a_call() {
        let ai = Arc::new(ScriptedAi::instant("unused"));
        let mut generator =
            SuggestionGenerator::new(Arc::clone(&ai) as Arc<dyn CatalogTransport>, Duration::from_millis(600));

        generator.set_auto(true);
        generator.set_fields(snapshot("Clean Code", "   "));
        advance(Duration::from_secs(10)).await;
        settle().await;

        assert_eq!(ai.prompt_count(), 0);
        let view = generator.view();
        assert!(!view.loading);
        assert_eq!(view.suggestion, "");
        assert_eq!(view.error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn toggling_off_cancels_in_flight_generation_silently() {
        let ai = Arc::new(ScriptedAi::slow("late blurb", 1_000));
        let mut generator =
            SuggestionGenerator::new(Arc::clone(&ai) as Arc<dyn CatalogTransport>, Duration::from_millis(600));

        generator.set_auto(true);
        generator.set_fields(snapshot("Clean Code", "Robert Martin"));
        settle().await;
        advance(Duration::from_millis(650)).await;
        settle().await;
        assert!(generator.view().loading);

        generator.set_auto(false);
        advance(Duration::from_secs(5)).await;
        settle().await;

        let view = generator.view();
        assert!(!view.loading);
        assert_eq!(view.suggestion, "");
        assert_eq!(view.error, None);
        assert_eq!(ai.prompt_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn apply_suggestion_is_idempotent_and_retriggers_generation() {
        let ai = Arc::new(ScriptedAi::instant("A concise blurb."));
        let mut generator =
            SuggestionGenerator::new(Arc::clone(&ai) as Arc<dyn CatalogTransport>, Duration::from_millis(600));

        generator.set_auto(true);
        generator.set_fields(snapshot("Clean Code", "Robert Martin"));
        settle().await;
        advance(Duration::from_millis(650)).await;
        settle().await;
        assert_eq!(generator.view().suggestion, "A concise blurb.");

        generator.apply_suggestion();
        assert_eq!(generator.description(), "A concise blurb.");
        generator.apply_suggestion();
        assert_eq!(generator.description(), "A concise blurb.");

        // The description is a watched field: applying schedules another
        // generation after the debounce window.
        settle().await;
        advance(Duration::from_millis(700)).await;
        settle().await;
        assert!(ai.prompt_count() >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn apply_without_suggestion_is_a_no_op() {
        let ai = Arc::new(ScriptedAi::instant("unused"));
        let mut generator =
            SuggestionGenerator::new(Arc::clone(&ai) as Arc<dyn CatalogTransport>, Duration::from_millis(600));

        generator.set_fields(snapshot("Clean Code", "Robert Martin"));
        generator.apply_suggestion();
        assert_eq!(generator.description(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn discard_aborts_in_flight_generation() {
        let ai = Arc::new(ScriptedAi::slow("stale blurb", 1_000));
        let mut generator =
            SuggestionGenerator::new(Arc::clone(&ai) as Arc<dyn CatalogTransport>, Duration::from_millis(600));

        generator.set_auto(true);
        generator.set_fields(snapshot("Clean Code", "Robert Martin"));
        settle().await;
        advance(Duration::from_millis(650)).await;
        settle().await;
        assert!(generator.view().loading);

        generator.discard_suggestion();
        advance(Duration::from_secs(5)).await;
        settle().await;

        // The explicitly cleared suggestion must not reappear.
        let view = generator.view();
        assert_eq!(view.suggestion, "");
        assert!(!view.loading);
        assert_eq!(view.error, None);
    }
}
