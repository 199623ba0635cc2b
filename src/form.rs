use thiserror::Error;
use tracing::error;

use crate::models::NewApplicationFields;
use crate::store::RecordStore;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
}

/// Input fields of the entry form, in focus order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormField {
    Company,
    Position,
    Url,
    Location,
    Status,
}

pub const FORM_FIELDS: [FormField; 5] = [
    FormField::Company,
    FormField::Position,
    FormField::Url,
    FormField::Location,
    FormField::Status,
];

impl FormField {
    pub fn label(&self) -> &'static str {
        match self {
            FormField::Company => "Company",
            FormField::Position => "Position",
            FormField::Url => "URL",
            FormField::Location => "Location",
            FormField::Status => "Status",
        }
    }
}

/// Uncommitted local state of the entry form. Nothing here touches the store
/// until `submit`.
#[derive(Debug, Default)]
pub struct FormState {
    pub company: String,
    pub position: String,
    pub url: String,
    pub location: String,
    pub status: String,
    pub focused: usize,
    pub submitting: bool,
    pub alert: Option<String>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focused_field(&self) -> FormField {
        FORM_FIELDS[self.focused]
    }

    pub fn focus_next(&mut self) {
        self.focused = (self.focused + 1) % FORM_FIELDS.len();
    }

    pub fn focus_prev(&mut self) {
        self.focused = (self.focused + FORM_FIELDS.len() - 1) % FORM_FIELDS.len();
    }

    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::Company => &self.company,
            FormField::Position => &self.position,
            FormField::Url => &self.url,
            FormField::Location => &self.location,
            FormField::Status => &self.status,
        }
    }

    fn focused_value_mut(&mut self) -> &mut String {
        match self.focused_field() {
            FormField::Company => &mut self.company,
            FormField::Position => &mut self.position,
            FormField::Url => &mut self.url,
            FormField::Location => &mut self.location,
            FormField::Status => &mut self.status,
        }
    }

    pub fn insert_char(&mut self, c: char) {
        self.alert = None;
        self.focused_value_mut().push(c);
    }

    pub fn delete_char(&mut self) {
        self.alert = None;
        self.focused_value_mut().pop();
    }

    /// Required-presence check over company and position; the remaining
    /// fields submit as-is, empty optionals becoming None.
    pub fn validate(&self) -> Result<NewApplicationFields, ValidationError> {
        if self.company.trim().is_empty() {
            return Err(ValidationError::MissingField("company"));
        }
        if self.position.trim().is_empty() {
            return Err(ValidationError::MissingField("position"));
        }
        Ok(NewApplicationFields {
            company: self.company.trim().to_string(),
            position: self.position.trim().to_string(),
            status: self.status.trim().to_string(),
            url: opt(&self.url),
            location: opt(&self.location),
        })
    }

    /// Issues the create request. On success every field is cleared and the
    /// refresh handle is invoked so dependent views reload; on failure the
    /// fields are left untouched for retry and an alert is set. The
    /// submitting flag is cleared on both arms.
    pub fn submit(&mut self, store: &dyn RecordStore, refresh: &mut dyn FnMut()) -> bool {
        if self.submitting {
            return false;
        }
        let fields = match self.validate() {
            Ok(fields) => fields,
            Err(e) => {
                self.alert = Some(e.to_string());
                return false;
            }
        };

        self.submitting = true;
        let result = store.create(&fields);
        self.submitting = false;

        match result {
            Ok(_) => {
                self.clear();
                refresh();
                true
            }
            Err(e) => {
                error!(company = %fields.company, "failed to add application: {e}");
                self.alert = Some("Error adding application".to_string());
                false
            }
        }
    }

    pub fn clear(&mut self) {
        self.company.clear();
        self.position.clear();
        self.url.clear();
        self.location.clear();
        self.status.clear();
        self.focused = 0;
        self.alert = None;
    }
}

fn opt(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
