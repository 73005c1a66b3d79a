//! Selection and filtering over a loaded session roster.
//!
//! [`RosterView`] owns the student list for one session together with the
//! active [`Filters`] and the per-row selection map. Everything the export
//! pipeline receives comes from [`RosterView::selected_students`].

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::StudentRecord;

// ---------------------------------------------------------------------------
// Row keys
// ---------------------------------------------------------------------------

/// Selection key for one row of a loaded roster.
///
/// The registration number is used when it is present and unique within the
/// roster. Blank or repeated registration numbers fall back to the row's
/// position so two records never share a selection slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowKey {
    RegNo(String),
    Position(usize),
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::RegNo(s) => write!(f, "{s}"),
            RowKey::Position(i) => write!(f, "#{}", i + 1),
        }
    }
}

/// Assign a key to every record, in order.
pub fn assign_keys(students: &[StudentRecord]) -> Vec<RowKey> {
    let mut seen: HashSet<&str> = HashSet::new();
    students
        .iter()
        .enumerate()
        .map(|(idx, s)| match s.reg_no() {
            Some(reg) if seen.insert(reg) => RowKey::RegNo(reg.to_string()),
            Some(reg) => {
                debug!(reg_no = %reg, row = idx, "duplicate registration number, using row position");
                RowKey::Position(idx)
            }
            None => RowKey::Position(idx),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Three independent case-insensitive substring filters. Empty filters match
/// everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filters {
    pub name: String,
    pub reg_no: String,
    pub activity: String,
}

impl Filters {
    pub fn is_empty(&self) -> bool {
        self.name.trim().is_empty()
            && self.reg_no.trim().is_empty()
            && self.activity.trim().is_empty()
    }

    pub fn matches(&self, student: &StudentRecord) -> bool {
        contains_ci(student.name.as_deref().unwrap_or(""), &self.name)
            && contains_ci(student.university_reg_no.as_deref().unwrap_or(""), &self.reg_no)
            && contains_ci(&student.sports_joined(), &self.activity)
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    let needle = needle.trim();
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

// ---------------------------------------------------------------------------
// Select-all state
// ---------------------------------------------------------------------------

/// State of the "select all" control for the currently visible rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectAllState {
    None,
    Some,
    All,
}

// ---------------------------------------------------------------------------
// RosterView
// ---------------------------------------------------------------------------

/// One session's students plus filter and selection state.
#[derive(Debug, Clone, Default)]
pub struct RosterView {
    students: Vec<StudentRecord>,
    keys: Vec<RowKey>,
    filters: Filters,
    selection: HashMap<RowKey, bool>,
}

impl RosterView {
    pub fn new(students: Vec<StudentRecord>) -> Self {
        let mut view = Self::default();
        view.load(students);
        view
    }

    /// Replace the roster. Selection is reset; filters are kept.
    pub fn load(&mut self, students: Vec<StudentRecord>) {
        self.keys = assign_keys(&students);
        self.students = students;
        self.selection = self.keys.iter().map(|k| (k.clone(), false)).collect();
        debug!(count = self.students.len(), "roster loaded, selection reset");
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn set_filters(&mut self, filters: Filters) {
        self.filters = filters;
    }

    /// Keys in roster order.
    pub fn keys(&self) -> &[RowKey] {
        &self.keys
    }

    /// Look up a key from user input: `#N` for the N-th row (1-based), or
    /// otherwise a registration number. A row addressed as `#N` is always
    /// the row at that position, whatever its registration number is.
    pub fn find_key(&self, input: &str) -> Option<&RowKey> {
        let input = input.trim();
        if let Some(n) = input.strip_prefix('#').and_then(|n| n.parse::<usize>().ok()) {
            let idx = n.checked_sub(1)?;
            return self.keys.get(idx);
        }
        self.keys
            .iter()
            .find(|k| matches!(k, RowKey::RegNo(reg) if reg == input))
    }

    fn rows(&self) -> impl Iterator<Item = (&RowKey, &StudentRecord)> {
        self.keys.iter().zip(self.students.iter())
    }

    fn visible_rows(&self) -> impl Iterator<Item = (&RowKey, &StudentRecord)> {
        self.rows().filter(|(_, s)| self.filters.matches(s))
    }

    /// Students passing all filters, in roster order.
    pub fn visible(&self) -> Vec<&StudentRecord> {
        self.visible_rows().map(|(_, s)| s).collect()
    }

    pub fn visible_keys(&self) -> Vec<RowKey> {
        self.visible_rows().map(|(k, _)| k.clone()).collect()
    }

    pub fn is_selected(&self, key: &RowKey) -> bool {
        self.selection.get(key).copied().unwrap_or(false)
    }

    /// Set one row's selection. Keys not in the current roster are ignored.
    pub fn set_selected(&mut self, key: &RowKey, selected: bool) -> bool {
        match self.selection.get_mut(key) {
            Some(slot) => {
                *slot = selected;
                true
            }
            None => false,
        }
    }

    pub fn toggle(&mut self, key: &RowKey) -> bool {
        let next = !self.is_selected(key);
        self.set_selected(key, next)
    }

    /// Set selection for exactly the visible rows.
    pub fn set_all_visible(&mut self, selected: bool) {
        for key in self.visible_keys() {
            self.selection.insert(key, selected);
        }
    }

    /// Select all visible rows, or clear them if they are all selected already.
    pub fn toggle_all_visible(&mut self) {
        let select = self.select_all_state() != SelectAllState::All;
        self.set_all_visible(select);
    }

    pub fn select_all_state(&self) -> SelectAllState {
        let mut total = 0usize;
        let mut selected = 0usize;
        for (key, _) in self.visible_rows() {
            total += 1;
            if self.is_selected(key) {
                selected += 1;
            }
        }
        match selected {
            0 => SelectAllState::None,
            n if n == total => SelectAllState::All,
            _ => SelectAllState::Some,
        }
    }

    /// Visible rows that are selected, in roster order.
    pub fn selected_students(&self) -> Vec<&StudentRecord> {
        self.visible_rows()
            .filter(|(k, _)| self.is_selected(k))
            .map(|(_, s)| s)
            .collect()
    }

    pub fn can_export(&self) -> bool {
        self.visible_rows().any(|(k, _)| self.is_selected(k))
    }
}
