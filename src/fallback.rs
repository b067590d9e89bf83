//! Static fallback catalog used when the remote service is unreachable.
//!
//! The filter mirrors the remote service's semantics exactly, so a degraded
//! session behaves like a live one over a smaller dataset. One shared
//! instance backs every consumer; the seed data is immutable and safe to
//! read concurrently.

use once_cell::sync::Lazy;

use crate::model::{BookSummary, FilterCriteria};

static SHARED: Lazy<FallbackCatalogProvider> = Lazy::new(FallbackCatalogProvider::new);

/// The single provider instance shared by all consumers.
pub fn shared() -> &'static FallbackCatalogProvider {
    &SHARED
}

/// In-memory seed dataset plus the remote-equivalent filter predicate.
pub struct FallbackCatalogProvider {
    books: Vec<BookSummary>,
}

impl FallbackCatalogProvider {
    fn new() -> Self {
        Self { books: seed_books() }
    }

    /// Apply `criteria` to the seed dataset.
    ///
    /// Keyword: case-insensitive substring match against title OR author;
    /// empty matches everything. Category: case-insensitive substring match;
    /// empty (including the collapsed `ALL` sentinel) matches everything.
    /// Output preserves dataset insertion order.
    pub fn filter(&self, criteria: &FilterCriteria) -> Vec<BookSummary> {
        let criteria = criteria.normalized();
        self.books
            .iter()
            .filter(|book| {
                let matches_keyword = criteria.keyword.is_empty()
                    || book.title.to_lowercase().contains(&criteria.keyword)
                    || book.author.to_lowercase().contains(&criteria.keyword);
                let matches_category = criteria.category.is_empty()
                    || book.category.to_lowercase().contains(&criteria.category);
                matches_keyword && matches_category
            })
            .cloned()
            .collect()
    }
}

fn seed_books() -> Vec<BookSummary> {
    vec![
        BookSummary {
            id: "mock-1".to_string(),
            title: "The Frontend Field Handbook".to_string(),
            author: "June Park".to_string(),
            category: "Programming".to_string(),
            cover_url: None,
        },
        BookSummary {
            id: "mock-2".to_string(),
            title: "Decisions Through Data Science".to_string(),
            author: "Harin Lee".to_string(),
            category: "Data".to_string(),
            cover_url: None,
        },
        BookSummary {
            id: "mock-3".to_string(),
            title: "A Clean Code Journey".to_string(),
            author: "Sam Okafor".to_string(),
            category: "Software Engineering".to_string(),
            cover_url: Some(
                "https://images.unsplash.com/photo-1481627834876-b7833e8f5570?auto=format&fit=crop&w=500&q=80"
                    .to_string(),
            ),
        },
        BookSummary {
            id: "mock-4".to_string(),
            title: "AI Product Design".to_string(),
            author: "Alice Kim".to_string(),
            category: "UX/UI".to_string(),
            cover_url: Some(
                "https://images.unsplash.com/photo-1451187580459-43490279c0fa?auto=format&fit=crop&w=500&q=80"
                    .to_string(),
            ),
        },
        BookSummary {
            id: "mock-5".to_string(),
            title: "First Steps in Serverless".to_string(),
            author: "Mateo Alvarez".to_string(),
            category: "Cloud".to_string(),
            cover_url: Some(
                "https://images.unsplash.com/photo-1498050108023-c5249f4df085?auto=format&fit=crop&w=500&q=80"
                    .to_string(),
            ),
        },
    ]
}
