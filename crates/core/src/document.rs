//! Document and template records.
//!
//! Blob bytes live in [`crate::storage::DocumentStorage`]; these are the
//! metadata records kept in the entity store.

use chrono::{DateTime, Utc};
use grantwise_shared::types::{AimId, DocumentId, GrantId, TemplateId};
use serde::{Deserialize, Serialize};

use crate::storage::StoredBlob;

/// Metadata for an uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Document ID.
    pub id: DocumentId,
    /// Display name, usually the original file name.
    pub name: String,
    /// Kind of document (e.g. "invoice", "budget_justification").
    #[serde(default)]
    pub document_type: Option<String>,
    /// Grant the document belongs to.
    #[serde(default)]
    pub grant_id: Option<GrantId>,
    /// Aim the document belongs to.
    #[serde(default)]
    pub aim_id: Option<AimId>,
    /// MIME type.
    #[serde(default)]
    pub content_type: String,
    /// Blob size.
    #[serde(default)]
    pub size_bytes: u64,
    /// Blob location; absent for metadata-only records.
    #[serde(default)]
    pub storage_key: Option<String>,
    /// Upload timestamp.
    pub uploaded_at: DateTime<Utc>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Input for registering a document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewDocument {
    /// Display name.
    pub name: String,
    /// Kind of document.
    #[serde(default)]
    pub document_type: Option<String>,
    /// Owning grant.
    #[serde(default)]
    pub grant_id: Option<GrantId>,
    /// Owning aim.
    #[serde(default)]
    pub aim_id: Option<AimId>,
    /// MIME type.
    #[serde(default)]
    pub content_type: String,
    /// Tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewDocument {
    /// Builds the record, taking size and key from the stored blob when present.
    #[must_use]
    pub fn into_document(self, id: DocumentId, blob: Option<StoredBlob>) -> Document {
        let (size_bytes, storage_key, content_type) = match blob {
            Some(blob) => (blob.size_bytes, Some(blob.storage_key), blob.content_type),
            None => (0, None, self.content_type),
        };
        Document {
            id,
            name: self.name.trim().to_string(),
            document_type: self.document_type,
            grant_id: self.grant_id,
            aim_id: self.aim_id,
            content_type,
            size_bytes,
            storage_key,
            uploaded_at: Utc::now(),
            tags: self.tags,
        }
    }
}

/// Partial document update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentPatch {
    /// New name.
    pub name: Option<String>,
    /// New document type.
    pub document_type: Option<String>,
    /// New aim link.
    pub aim_id: Option<AimId>,
    /// Replacement tags.
    pub tags: Option<Vec<String>>,
}

impl Document {
    /// Applies a patch in place.
    pub fn apply(&mut self, patch: DocumentPatch) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(document_type) = patch.document_type {
            self.document_type = Some(document_type);
        }
        if let Some(aim_id) = patch.aim_id {
            self.aim_id = Some(aim_id);
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
    }
}

/// Reusable text template (report sections, justifications).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// Template ID.
    pub id: TemplateId,
    /// Name.
    pub name: String,
    /// Grouping label.
    #[serde(default)]
    pub category: String,
    /// Template text.
    #[serde(default)]
    pub body: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a template.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTemplate {
    /// Name.
    pub name: String,
    /// Grouping label.
    #[serde(default)]
    pub category: String,
    /// Template text.
    #[serde(default)]
    pub body: String,
}

impl NewTemplate {
    /// Builds the record with a fresh id.
    #[must_use]
    pub fn into_template(self) -> Template {
        let now = Utc::now();
        Template {
            id: TemplateId::new(),
            name: self.name.trim().to_string(),
            category: self.category,
            body: self.body,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial template update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplatePatch {
    /// New name.
    pub name: Option<String>,
    /// New category.
    pub category: Option<String>,
    /// New body.
    pub body: Option<String>,
}

impl Template {
    /// Applies a patch in place and bumps `updated_at`.
    pub fn apply(&mut self, patch: TemplatePatch) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(body) = patch.body {
            self.body = body;
        }
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_overrides_declared_content_type() {
        let input = NewDocument {
            name: " invoice.pdf ".into(),
            content_type: "application/octet-stream".into(),
            ..NewDocument::default()
        };
        let blob = StoredBlob {
            storage_key: "unassigned/x/invoice.pdf".into(),
            size_bytes: 10,
            content_type: "application/pdf".into(),
        };

        let doc = input.into_document(DocumentId::new(), Some(blob));
        assert_eq!(doc.name, "invoice.pdf");
        assert_eq!(doc.content_type, "application/pdf");
        assert_eq!(doc.size_bytes, 10);
        assert!(doc.storage_key.is_some());
    }

    #[test]
    fn test_template_patch_bumps_updated_at() {
        let mut template = NewTemplate {
            name: "Progress report".into(),
            ..NewTemplate::default()
        }
        .into_template();
        let created = template.updated_at;

        template.apply(TemplatePatch {
            body: Some("## Summary".into()),
            ..TemplatePatch::default()
        });

        assert_eq!(template.body, "## Summary");
        assert!(template.updated_at >= created);
        assert_eq!(template.created_at, created);
    }
}
