//! Recall item records.

use serde::{Deserialize, Serialize};

use crate::phase::FlightPhase;

/// An opaque binary attachment (photo, diagram, PDF page) carried by a
/// recall item. Stored and returned byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// MIME type supplied by the caller, e.g. `image/png`.
    pub media_type: String,
    /// Raw contents.
    pub data: Vec<u8>,
}

impl Attachment {
    /// Create an attachment from a media type and raw bytes.
    #[must_use]
    pub fn new(media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            media_type: media_type.into(),
            data,
        }
    }

    /// Size of the contents in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the attachment has no contents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// BLAKE3 hex digest of the contents, for display and comparison.
    #[must_use]
    pub fn digest(&self) -> String {
        blake3::hash(&self.data).to_hex().to_string()
    }
}

/// A persisted recall item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecallItem {
    /// Identifier assigned by storage.
    pub id: i64,
    /// Short name of the item. Never blank once persisted.
    pub title: String,
    /// Free-form body text.
    pub description: String,
    /// Phases in which the item applies. Never empty once persisted.
    pub phases: Vec<FlightPhase>,
    /// Pointer into a manual or checklist, e.g. `OM-C 4.3.2`.
    pub reference: String,
    /// Threats the item guards against.
    pub threats: Vec<String>,
    /// Whether the item is shown in critical mode.
    pub is_tier1: bool,
    /// Whether the title is a URL or app link.
    pub is_deeplink: bool,
    /// Optional binary attachment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    /// Creation time, epoch milliseconds. Never changes.
    pub created_at: i64,
    /// Last modification time, epoch milliseconds.
    pub updated_at: i64,
}

impl RecallItem {
    /// Build a record from a draft plus the storage-assigned fields.
    #[must_use]
    pub fn from_draft(id: i64, draft: RecallItemDraft, created_at: i64, updated_at: i64) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            phases: draft.phases,
            reference: draft.reference,
            threats: draft.threats,
            is_tier1: draft.is_tier1,
            is_deeplink: draft.is_deeplink,
            attachment: draft.attachment,
            created_at,
            updated_at,
        }
    }

    /// Whether the item applies in the given phase.
    #[must_use]
    pub fn applies_to(&self, phase: FlightPhase) -> bool {
        self.phases.contains(&phase)
    }
}

/// A recall item that has not been stored yet.
///
/// Storage persists drafts verbatim; trimming and defaulting belong to
/// [`crate::validation`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecallItemDraft {
    /// Item title.
    pub title: String,
    /// Item description.
    pub description: String,
    /// Applicable phases.
    pub phases: Vec<FlightPhase>,
    /// Manual reference.
    pub reference: String,
    /// Threat list.
    pub threats: Vec<String>,
    /// Tier-1 flag.
    pub is_tier1: bool,
    /// Deep-link flag.
    pub is_deeplink: bool,
    /// Optional attachment.
    pub attachment: Option<Attachment>,
}

impl RecallItemDraft {
    /// Draft with a title and phases, everything else defaulted.
    #[must_use]
    pub fn new(title: impl Into<String>, phases: Vec<FlightPhase>) -> Self {
        Self {
            title: title.into(),
            phases,
            ..Self::default()
        }
    }
}

/// A partial update to a recall item. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecallItemChanges {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New phase list.
    pub phases: Option<Vec<FlightPhase>>,
    /// New reference.
    pub reference: Option<String>,
    /// New threat list.
    pub threats: Option<Vec<String>>,
    /// New tier-1 flag.
    pub is_tier1: Option<bool>,
    /// New deep-link flag.
    pub is_deeplink: Option<bool>,
    /// `Some(None)` removes the attachment.
    pub attachment: Option<Option<Attachment>>,
}

impl RecallItemChanges {
    /// Whether the changeset overrides nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the overrides into `item`. Timestamps are left to the caller.
    pub fn apply_to(&self, item: &mut RecallItem) {
        if let Some(title) = &self.title {
            item.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            item.description.clone_from(description);
        }
        if let Some(phases) = &self.phases {
            item.phases.clone_from(phases);
        }
        if let Some(reference) = &self.reference {
            item.reference.clone_from(reference);
        }
        if let Some(threats) = &self.threats {
            item.threats.clone_from(threats);
        }
        if let Some(is_tier1) = self.is_tier1 {
            item.is_tier1 = is_tier1;
        }
        if let Some(is_deeplink) = self.is_deeplink {
            item.is_deeplink = is_deeplink;
        }
        if let Some(attachment) = &self.attachment {
            item.attachment.clone_from(attachment);
        }
    }
}
