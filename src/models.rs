use serde::{Deserialize, Serialize};

/// Statuses with dedicated display treatment. Anything else renders with the
/// default treatment; the field itself is free text.
pub const KNOWN_STATUSES: &[&str] = &["Applied", "Pending", "Rejected", "Interview", "Almost!"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: String, // store-assigned, immutable
    pub company: String,
    pub position: String,
    pub status: String,
    pub applied_date: String, // store-assigned on create, never edited
    pub url: Option<String>,
    pub location: Option<String>,
    pub salary_range: Option<String>,
}

/// Fields bundled into a create request. The store assigns id and
/// applied_date; salary_range is only settable through an edit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewApplicationFields {
    pub company: String,
    pub position: String,
    pub status: String,
    pub url: Option<String>,
    pub location: Option<String>,
}

/// Full rewrite payload for an update, keyed by id at the call site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditableApplicationFields {
    pub company: String,
    pub position: String,
    pub status: String,
    pub url: Option<String>,
    pub location: Option<String>,
    pub salary_range: Option<String>,
}

impl ApplicationRecord {
    pub fn editable_fields(&self) -> EditableApplicationFields {
        EditableApplicationFields {
            company: self.company.clone(),
            position: self.position.clone(),
            status: self.status.clone(),
            url: self.url.clone(),
            location: self.location.clone(),
            salary_range: self.salary_range.clone(),
        }
    }
}
