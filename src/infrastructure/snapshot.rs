// Cache snapshot - last-known remote copy of a page plus local edits not yet settled

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::ent_schema::FieldMap;
use crate::entities::Page;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditState {
    /// Not yet acknowledged by a successful remote write; wins over remote values
    Unconfirmed,
    /// Accepted by the remote; pruned on the next successful reconciliation
    Acknowledged,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingEdit {
    pub value: Value,
    pub state: EditState,
    pub edited_at: DateTime<Utc>,
}

impl PendingEdit {
    pub fn unconfirmed(value: Value) -> Self {
        Self {
            value,
            state: EditState::Unconfirmed,
            edited_at: Utc::now(),
        }
    }

    pub fn is_unconfirmed(&self) -> bool {
        self.state == EditState::Unconfirmed
    }
}

/// Persisted per page id; survives process restarts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSnapshot {
    pub last_remote_snapshot: Option<Page>,
    #[serde(default)]
    pub unconfirmed_edits: BTreeMap<String, PendingEdit>,
}

impl CacheSnapshot {
    pub fn is_empty(&self) -> bool {
        self.last_remote_snapshot.is_none() && self.unconfirmed_edits.is_empty()
    }

    /// Record a local edit attempt; replaces any earlier edit of the field
    pub fn record_edit(&mut self, field: &str, value: Value) {
        self.unconfirmed_edits
            .insert(field.to_string(), PendingEdit::unconfirmed(value));
    }

    /// Mark an edit as accepted by the remote. Only applies when the cached
    /// edit still holds `value`; a newer edit of the same field stays
    /// unconfirmed. The accepted value also becomes the last-known remote value.
    pub fn acknowledge(&mut self, field: &str, value: &Value) -> bool {
        if let Some(page) = self.last_remote_snapshot.as_mut() {
            page.set_field(field, value.clone());
        }
        match self.unconfirmed_edits.get_mut(field) {
            Some(edit) if edit.value == *value => {
                edit.state = EditState::Acknowledged;
                true
            }
            _ => false,
        }
    }

    /// Drop an edit the remote rejected, unless it was superseded meanwhile
    pub fn discard_edit(&mut self, field: &str, value: &Value) -> bool {
        match self.unconfirmed_edits.get(field) {
            Some(edit) if edit.value == *value => {
                self.unconfirmed_edits.remove(field);
                true
            }
            _ => false,
        }
    }

    /// Values of edits the remote has not acknowledged yet
    pub fn unconfirmed(&self) -> FieldMap {
        self.unconfirmed_edits
            .iter()
            .filter(|(_, edit)| edit.is_unconfirmed())
            .map(|(field, edit)| (field.clone(), edit.value.clone()))
            .collect()
    }

    /// Last-known remote copy with every local edit overlaid
    pub fn local_view(&self) -> Option<Page> {
        let mut page = self.last_remote_snapshot.clone()?;
        for (field, edit) in &self.unconfirmed_edits {
            page.set_field(field, edit.value.clone());
        }
        Some(page)
    }
}
