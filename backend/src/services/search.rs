//! Search service
//!
//! Turns a structured search request into a record predicate. Terms within a
//! category are OR-combined, categories are AND-combined, and a category that
//! was not supplied constrains nothing.

use crate::database::{Predicate, Record, Repository};
use crate::error::Result;
use crate::services::users::UserService;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Search terms by category, as sent by clients and stored as a user's last search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Whitespace-separated substrings of the description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_search_term: Option<String>,
    /// Whitespace-separated tag names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_search_term: Option<String>,
    /// Single substring of any comment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments_search_term: Option<String>,
    /// Single color name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_search_term: Option<String>,
}

impl SearchRequest {
    /// Build a request from named terms. Unknown keys are ignored.
    pub fn from_terms(terms: &HashMap<String, String>) -> Self {
        let term = |key: &str| terms.get(key).cloned();

        Self {
            description_search_term: term("descriptionSearchTerm"),
            tag_search_term: term("tagSearchTerm"),
            comments_search_term: term("commentsSearchTerm"),
            color_search_term: term("colorSearchTerm"),
        }
    }

    /// Compose the request into a single predicate
    pub fn to_predicate(&self) -> Predicate {
        let description = Predicate::any_of(
            words(&self.description_search_term).map(|w| Predicate::DescriptionContains(w.to_string())),
        );
        let tags = Predicate::any_of(
            words(&self.tag_search_term).map(|w| Predicate::HasTag(w.to_string())),
        );
        let comments = Predicate::any_of(
            whole(&self.comments_search_term).map(|t| Predicate::CommentContains(t.to_string())),
        );
        let color = Predicate::any_of(
            whole(&self.color_search_term).map(|t| Predicate::ColorIs(t.to_string())),
        );

        Predicate::all_of([description, tags, comments, color])
    }
}

fn words(term: &Option<String>) -> impl Iterator<Item = &str> {
    term.as_deref().unwrap_or_default().split_whitespace()
}

fn whole(term: &Option<String>) -> Option<&str> {
    term.as_deref().map(str::trim).filter(|t| !t.is_empty())
}

/// Service answering search requests
#[derive(Clone)]
pub struct SearchService {
    repo: Repository,
    users: UserService,
}

impl SearchService {
    pub fn new(repo: Repository, users: UserService) -> Self {
        Self { repo, users }
    }

    /// Run a search on behalf of a user.
    ///
    /// The user is found or created, the request is stored as their last
    /// search and their last viewed record is cleared before the query runs.
    pub async fn search(&self, username: &str, request: &SearchRequest) -> Result<Vec<Record>> {
        self.users.record_search(username, request).await?;

        let predicate = request.to_predicate();
        tracing::debug!("Searching records with {:?}", predicate);

        let records = self.repo.query_records(&predicate).await?;

        tracing::info!("Search for {} returned {} records", username, records.len());
        Ok(records)
    }
}
