//! State machine for one document import.
//!
//! ```text
//! Idle -> Extracting -> Review -> Applied
//!             |
//!             v
//!           Failed
//! ```
//!
//! A failed session is reported back as-is; trying again means starting a
//! new session on the same document.

use serde::Serialize;
use tracing::{info, warn};

use super::draft::ImportDraft;
use super::error::ImportError;
use super::service::{ImportDestination, ImportOutcome, ImportService};
use crate::budget::BudgetTree;
use crate::extraction::{
    ExpenseExtractor, ExtractionError, ExtractionResult, SourceDocument, budget_context,
};

/// Why extraction failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Missing or rejected credentials, no endpoint.
    Configuration,
    /// Anything else the service did wrong.
    Service,
}

impl From<&ExtractionError> for FailureKind {
    fn from(err: &ExtractionError) -> Self {
        if err.is_configuration() {
            Self::Configuration
        } else {
            Self::Service
        }
    }
}

/// Current state of an import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ImportState {
    /// Nothing started.
    Idle,
    /// Waiting for the extractor.
    Extracting,
    /// Draft ready for review.
    Review {
        /// Staged rows.
        draft: ImportDraft,
    },
    /// Draft merged into the budget.
    Applied {
        /// What was created.
        outcome: ImportOutcome,
    },
    /// Extraction failed.
    Failed {
        /// Failure category.
        kind: FailureKind,
        /// Error message.
        message: String,
    },
}

impl ImportState {
    /// State name for messages.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Extracting => "extracting",
            Self::Review { .. } => "in review",
            Self::Applied { .. } => "applied",
            Self::Failed { .. } => "failed",
        }
    }
}

/// One document import from upload to apply.
#[derive(Debug, Clone)]
pub struct ImportSession {
    state: ImportState,
    document: Option<SourceDocument>,
}

impl Default for ImportSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportSession {
    /// Creates an idle session.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: ImportState::Idle,
            document: None,
        }
    }

    /// Resumes review of a draft extracted by an earlier session.
    #[must_use]
    pub fn reviewing(draft: ImportDraft) -> Self {
        Self {
            state: ImportState::Review { draft },
            document: None,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &ImportState {
        &self.state
    }

    /// Moves from `Idle` to `Extracting` for `document`.
    pub fn begin(&mut self, document: SourceDocument) -> Result<(), ImportError> {
        if !matches!(self.state, ImportState::Idle) {
            return Err(self.invalid("start extraction"));
        }
        self.document = Some(document);
        self.state = ImportState::Extracting;
        Ok(())
    }

    /// Records the extractor's answer: `Review` on success, `Failed` otherwise.
    pub fn finish(
        &mut self,
        result: Result<ExtractionResult, ExtractionError>,
    ) -> Result<&ImportState, ImportError> {
        if !matches!(self.state, ImportState::Extracting) {
            return Err(self.invalid("finish extraction"));
        }
        self.state = match result {
            Ok(extracted) => ImportState::Review {
                draft: ImportDraft::from_extraction(extracted),
            },
            Err(e) => {
                warn!(error = %e, "Document extraction failed");
                ImportState::Failed {
                    kind: FailureKind::from(&e),
                    message: e.to_string(),
                }
            }
        };
        Ok(&self.state)
    }

    /// Runs the extractor for the session's document and records the result.
    ///
    /// The session must be `Extracting`.
    pub async fn extract(
        &mut self,
        extractor: &dyn ExpenseExtractor,
        tree: &BudgetTree,
    ) -> Result<&ImportState, ImportError> {
        if !matches!(self.state, ImportState::Extracting) {
            return Err(self.invalid("extract"));
        }
        let Some(document) = &self.document else {
            return Err(self.invalid("extract"));
        };
        let context = budget_context(tree);
        let result = extractor.extract(document, &context).await;
        self.finish(result)
    }

    /// Applies the reviewed draft. On error the session stays in review.
    pub fn apply(
        &mut self,
        tree: &mut BudgetTree,
        destination: &ImportDestination,
        grant_title: Option<&str>,
    ) -> Result<ImportOutcome, ImportError> {
        let ImportState::Review { draft } = &self.state else {
            return Err(self.invalid("apply"));
        };
        let outcome = ImportService::apply(tree, draft, destination, grant_title)?;
        info!(
            file_name = self.document.as_ref().map_or("", |d| d.file_name.as_str()),
            "Import session applied"
        );
        self.state = ImportState::Applied {
            outcome: outcome.clone(),
        };
        Ok(outcome)
    }

    fn invalid(&self, action: &'static str) -> ImportError {
        ImportError::InvalidState {
            state: self.state.name(),
            action,
        }
    }
}
