use tracing::error;

use crate::models::{ApplicationRecord, EditableApplicationFields};
use crate::store::RecordStore;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    Loading,
    Loaded,
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatusFilter {
    All,
    Status(String),
}

impl StatusFilter {
    pub fn matches(&self, record: &ApplicationRecord) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Status(status) => record.status == *status,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Status(status) => status,
        }
    }
}

/// An in-memory, uncommitted copy of one record's editable fields.
#[derive(Debug, Clone)]
pub struct EditDraft {
    pub id: String,
    pub fields: EditableApplicationFields,
}

/// View state of the application list. Records arrive ordered from the store
/// and are never re-sorted here; filtering is a read-side projection.
#[derive(Debug)]
pub struct ListView {
    records: Vec<ApplicationRecord>,
    pub phase: Phase,
    pub filter: StatusFilter,
    pub selected: usize,
    /// Delete candidate staged behind the confirmation step.
    pub confirming: Option<String>,
    /// Id of the record whose mutation is in flight.
    pub busy_id: Option<String>,
    pub draft: Option<EditDraft>,
    pub alert: Option<String>,
}

impl ListView {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            phase: Phase::Loading,
            filter: StatusFilter::All,
            selected: 0,
            confirming: None,
            busy_id: None,
            draft: None,
            alert: None,
        }
    }

    /// Full re-fetch from the store. A fetch failure is logged but not
    /// surfaced; the view resolves to whatever it already held.
    pub fn refresh(&mut self, store: &dyn RecordStore) {
        match store.list_all() {
            Ok(records) => {
                self.records = records;
            }
            Err(e) => {
                error!("failed to fetch applications: {e}");
            }
        }
        self.phase = if self.records.is_empty() {
            Phase::Empty
        } else {
            Phase::Loaded
        };
        self.clamp_selection();
    }

    pub fn records(&self) -> &[ApplicationRecord] {
        &self.records
    }

    /// The records visible under the current filter, in store order.
    pub fn filtered(&self) -> Vec<&ApplicationRecord> {
        self.records.iter().filter(|r| self.filter.matches(r)).collect()
    }

    pub fn set_filter(&mut self, filter: StatusFilter) {
        self.filter = filter;
        self.clamp_selection();
    }

    pub fn selected_record(&self) -> Option<&ApplicationRecord> {
        self.filtered().get(self.selected).copied()
    }

    pub fn select_next(&mut self) {
        let len = self.filtered().len();
        if len > 0 && self.selected < len - 1 {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.filtered().len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    // --- Delete flow ---

    /// Stages a delete candidate, to be confirmed or cancelled. Refused while
    /// another mutation is in flight; mutations are serialized.
    pub fn stage_delete(&mut self, id: &str) {
        if self.busy_id.is_some() {
            return;
        }
        self.confirming = Some(id.to_string());
    }

    pub fn cancel_delete(&mut self) {
        self.confirming = None;
    }

    pub fn confirming_record(&self) -> Option<&ApplicationRecord> {
        let id = self.confirming.as_deref()?;
        self.records.iter().find(|r| r.id == id)
    }

    /// Deletes the staged candidate. The candidate and busy id are cleared on
    /// both arms; a successful delete triggers a full re-fetch, a failure
    /// sets an alert and leaves the list as-is.
    pub fn confirm_delete(&mut self, store: &dyn RecordStore) -> bool {
        if self.busy_id.is_some() {
            return false;
        }
        let Some(id) = self.confirming.take() else {
            return false;
        };

        self.busy_id = Some(id.clone());
        let result = store.delete(&id);
        self.busy_id = None;

        match result {
            Ok(()) => {
                self.refresh(store);
                true
            }
            Err(e) => {
                error!(id = %id, "failed to delete application: {e}");
                self.alert = Some("Error deleting application".to_string());
                false
            }
        }
    }

    // --- Edit flow ---

    /// Stages a full copy of the record's editable fields into a draft.
    /// Only one draft exists at a time; a second begin_edit is refused.
    pub fn begin_edit(&mut self, id: &str) {
        if self.draft.is_some() {
            return;
        }
        if let Some(record) = self.records.iter().find(|r| r.id == id) {
            self.draft = Some(EditDraft {
                id: record.id.clone(),
                fields: record.editable_fields(),
            });
        }
    }

    pub fn cancel_edit(&mut self) {
        self.draft = None;
    }

    /// Issues the update for the draft. On success the draft is cleared and
    /// the list re-fetched; on failure the draft stays open for retry.
    pub fn save_edit(&mut self, store: &dyn RecordStore) -> bool {
        if self.busy_id.is_some() {
            return false;
        }
        let Some(draft) = self.draft.as_ref() else {
            return false;
        };
        let (id, fields) = (draft.id.clone(), draft.fields.clone());

        self.busy_id = Some(id.clone());
        let result = store.update(&id, &fields);
        self.busy_id = None;

        match result {
            Ok(()) => {
                self.draft = None;
                self.refresh(store);
                true
            }
            Err(e) => {
                error!(id = %id, "failed to update application: {e}");
                self.alert = Some("Error updating application".to_string());
                false
            }
        }
    }

    pub fn is_editing(&self, id: &str) -> bool {
        self.draft.as_ref().is_some_and(|d| d.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewApplicationFields;
    use crate::store::{SqliteStore, StoreError, StoreResult};

    struct FailingStore;

    impl RecordStore for FailingStore {
        fn create(&self, _: &NewApplicationFields) -> StoreResult<ApplicationRecord> {
            Err(StoreError::NotFound("create".into()))
        }
        fn list_all(&self) -> StoreResult<Vec<ApplicationRecord>> {
            Err(StoreError::NotFound("list".into()))
        }
        fn update(&self, id: &str, _: &EditableApplicationFields) -> StoreResult<()> {
            Err(StoreError::NotFound(id.into()))
        }
        fn delete(&self, id: &str) -> StoreResult<()> {
            Err(StoreError::NotFound(id.into()))
        }
    }

    fn seeded_store() -> (SqliteStore, Vec<ApplicationRecord>) {
        let store = SqliteStore::open_in_memory();
        let mut records = Vec::new();
        for (company, status) in [
            ("Acme", "Applied"),
            ("Globex", "Interview"),
            ("Initech", "Applied"),
        ] {
            records.push(
                store
                    .create(&NewApplicationFields {
                        company: company.into(),
                        position: "Engineer".into(),
                        status: status.into(),
                        url: None,
                        location: None,
                    })
                    .unwrap(),
            );
        }
        (store, records)
    }

    #[test]
    fn refresh_resolves_loading_to_loaded_or_empty() {
        let store = SqliteStore::open_in_memory();
        let mut list = ListView::new();
        assert_eq!(list.phase, Phase::Loading);

        list.refresh(&store);
        assert_eq!(list.phase, Phase::Empty);

        store
            .create(&NewApplicationFields {
                company: "Acme".into(),
                position: "Engineer".into(),
                ..Default::default()
            })
            .unwrap();
        list.refresh(&store);
        assert_eq!(list.phase, Phase::Loaded);
        assert_eq!(list.records().len(), 1);
    }

    #[test]
    fn fetch_failure_is_silent_and_keeps_prior_records() {
        let (store, _) = seeded_store();
        let mut list = ListView::new();
        list.refresh(&store);
        assert_eq!(list.records().len(), 3);

        list.refresh(&FailingStore);
        assert_eq!(list.phase, Phase::Loaded);
        assert_eq!(list.records().len(), 3);
        assert_eq!(list.alert, None);
    }

    #[test]
    fn filter_is_a_pure_projection() {
        let (store, _) = seeded_store();
        let mut list = ListView::new();
        list.refresh(&store);

        list.set_filter(StatusFilter::Status("Applied".into()));
        let applied = list.filtered();
        assert_eq!(applied.len(), 2);
        assert!(applied.iter().all(|r| r.status == "Applied"));
        // Underlying set untouched
        assert_eq!(list.records().len(), 3);

        list.set_filter(StatusFilter::All);
        assert_eq!(list.filtered().len(), 3);
    }

    #[test]
    fn filtering_clamps_the_selection() {
        let (store, _) = seeded_store();
        let mut list = ListView::new();
        list.refresh(&store);
        list.select_next();
        list.select_next();
        assert_eq!(list.selected, 2);

        list.set_filter(StatusFilter::Status("Interview".into()));
        assert_eq!(list.selected, 0);
        assert_eq!(list.selected_record().unwrap().company, "Globex");
    }

    #[test]
    fn delete_requires_confirmation() {
        let (store, records) = seeded_store();
        let mut list = ListView::new();
        list.refresh(&store);

        let target = &records[0].id;
        list.stage_delete(target);
        assert_eq!(list.confirming.as_deref(), Some(target.as_str()));
        assert_eq!(list.confirming_record().unwrap().company, "Acme");
        // Nothing deleted until confirmed
        assert_eq!(store.list_all().unwrap().len(), 3);

        assert!(list.confirm_delete(&store));
        assert_eq!(list.confirming, None);
        assert_eq!(list.busy_id, None);
        assert!(list.records().iter().all(|r| r.id != *target));
        assert_eq!(list.records().len(), 2);
    }

    #[test]
    fn cancel_returns_to_idle_without_a_request() {
        let (store, records) = seeded_store();
        let mut list = ListView::new();
        list.refresh(&store);

        list.stage_delete(&records[1].id);
        list.cancel_delete();
        assert_eq!(list.confirming, None);
        assert!(!list.confirm_delete(&store)); // nothing staged
        assert_eq!(store.list_all().unwrap().len(), 3);
    }

    #[test]
    fn delete_failure_alerts_and_clears_the_candidate() {
        let (store, records) = seeded_store();
        let mut list = ListView::new();
        list.refresh(&store);

        list.stage_delete(&records[0].id);
        assert!(!list.confirm_delete(&FailingStore));
        assert_eq!(list.confirming, None);
        assert_eq!(list.busy_id, None);
        assert!(list.alert.is_some());
        assert_eq!(list.records().len(), 3);
    }

    #[test]
    fn edit_stages_a_draft_copy() {
        let (store, records) = seeded_store();
        let mut list = ListView::new();
        list.refresh(&store);

        list.begin_edit(&records[0].id);
        assert!(list.is_editing(&records[0].id));
        let draft = list.draft.as_ref().unwrap();
        assert_eq!(draft.fields.company, "Acme");
        assert_eq!(draft.fields.status, "Applied");

        // Only one draft at a time
        list.begin_edit(&records[1].id);
        assert!(list.is_editing(&records[0].id));
    }

    #[test]
    fn save_edit_updates_and_refetches() {
        let (store, records) = seeded_store();
        let mut list = ListView::new();
        list.refresh(&store);

        list.begin_edit(&records[0].id);
        list.draft.as_mut().unwrap().fields.status = "Interview".into();
        assert!(list.save_edit(&store));
        assert!(list.draft.is_none());
        assert_eq!(list.busy_id, None);

        let saved = list.records().iter().find(|r| r.id == records[0].id).unwrap();
        assert_eq!(saved.status, "Interview");
        assert_eq!(saved.applied_date, records[0].applied_date);
    }

    #[test]
    fn save_failure_leaves_the_draft_open_for_retry() {
        let (store, records) = seeded_store();
        let mut list = ListView::new();
        list.refresh(&store);

        list.begin_edit(&records[0].id);
        list.draft.as_mut().unwrap().fields.status = "Interview".into();
        assert!(!list.save_edit(&FailingStore));
        assert!(list.is_editing(&records[0].id));
        assert_eq!(list.draft.as_ref().unwrap().fields.status, "Interview");
        assert!(list.alert.is_some());
        assert_eq!(list.busy_id, None);
    }

    #[test]
    fn cancel_edit_discards_the_draft_without_a_request() {
        let (store, records) = seeded_store();
        let mut list = ListView::new();
        list.refresh(&store);

        list.begin_edit(&records[0].id);
        list.draft.as_mut().unwrap().fields.company = "Changed".into();
        list.cancel_edit();
        assert!(list.draft.is_none());
        let untouched = store
            .list_all()
            .unwrap()
            .into_iter()
            .find(|r| r.id == records[0].id)
            .unwrap();
        assert_eq!(untouched.company, "Acme");
    }

    #[test]
    fn edit_and_delete_on_different_ids_do_not_interfere() {
        let (store, records) = seeded_store();
        let mut list = ListView::new();
        list.refresh(&store);

        list.begin_edit(&records[0].id);
        list.stage_delete(&records[1].id);
        assert!(list.is_editing(&records[0].id));
        assert_eq!(list.confirming.as_deref(), Some(records[1].id.as_str()));

        // Completing the delete leaves the draft intact
        assert!(list.confirm_delete(&store));
        assert!(list.is_editing(&records[0].id));
        assert_eq!(list.draft.as_ref().unwrap().fields.company, "Acme");

        // And the draft still saves against the surviving record
        list.draft.as_mut().unwrap().fields.status = "Pending".into();
        assert!(list.save_edit(&store));
        let saved = list.records().iter().find(|r| r.id == records[0].id).unwrap();
        assert_eq!(saved.status, "Pending");
    }
}
