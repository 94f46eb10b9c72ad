//! Daily attendance registry.
//!
//! Holds at most one [`AttendanceEntry`] per person for the current day and
//! discards everything when the calendar date advances. The state operations
//! on [`RegistryState`] are pure: the caller passes in `today` and `now`.
//! [`Registry`] wraps a state together with a [`KvStore`] and writes every
//! mutation through to it.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::directory::Directory;
use crate::error::{Error, Result};
use crate::model::{AttendanceEntry, EntryFields, PersonRecord};
use crate::store::KvStore;

pub const ENTRIES_KEY: &str = "attendance_entries";
pub const RESET_DATE_KEY: &str = "last_reset_date";
const RESET_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryState {
    pub entries: BTreeMap<String, AttendanceEntry>,
    pub last_reset_date: Option<NaiveDate>,
}

/// Outcome of [`RegistryState::reconcile_day`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayCheck {
    SameDay,
    RolledOver,
}

#[derive(Debug, Default)]
pub struct Classification<'a> {
    pub confirmed: Vec<&'a AttendanceEntry>,
    pub justified: Vec<&'a AttendanceEntry>,
    pub absent: Vec<&'a PersonRecord>,
}

impl RegistryState {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn reconcile_day(self, today: NaiveDate) -> (Self, DayCheck) {
        if self.last_reset_date == Some(today) {
            return (self, DayCheck::SameDay);
        }
        let fresh = Self {
            entries: BTreeMap::new(),
            last_reset_date: Some(today),
        };
        (fresh, DayCheck::RolledOver)
    }

    /// Insert or replace the entry for `person_id`. The id is not checked
    /// against any directory.
    pub fn upsert(mut self, person_id: &str, fields: EntryFields, now: NaiveDateTime) -> Self {
        let entry = AttendanceEntry {
            person_id: person_id.to_string(),
            justification: fields.justification,
            present: fields.present,
            timestamp: now,
        };
        self.entries.insert(person_id.to_string(), entry);
        self
    }

    pub fn find_today(&self, person_id: &str, today: NaiveDate) -> Option<&AttendanceEntry> {
        self.entries
            .get(person_id)
            .filter(|entry| entry.is_on(today))
    }

    /// Confirmed and justified are independent filters over the entries and
    /// may overlap. Absent is every directory member with no entry at all.
    pub fn classify<'a>(&'a self, directory: &'a Directory) -> Classification<'a> {
        let confirmed = self.entries.values().filter(|e| e.present).collect();
        let justified = self.entries.values().filter(|e| e.is_justified()).collect();
        let absent = directory
            .list_all()
            .iter()
            .filter(|p| !self.entries.contains_key(&p.id))
            .collect();
        Classification {
            confirmed,
            justified,
            absent,
        }
    }
}

/// Read the persisted state. Any failure degrades to the empty state.
pub fn load<S: KvStore>(store: &S) -> RegistryState {
    match try_load(store) {
        Ok(state) => state,
        Err(e) => {
            warn!(error = %e, "registry state unreadable, starting empty");
            RegistryState::empty()
        }
    }
}

fn try_load<S: KvStore>(store: &S) -> Result<RegistryState> {
    let mut state = RegistryState::empty();
    if let Some(raw) = store.get(ENTRIES_KEY)? {
        let list: Vec<AttendanceEntry> = serde_json::from_str(&raw)?;
        for entry in list {
            state.entries.insert(entry.person_id.clone(), entry);
        }
    }
    if let Some(raw) = store.get(RESET_DATE_KEY)? {
        let date = NaiveDate::parse_from_str(raw.trim(), RESET_DATE_FORMAT)
            .map_err(|e| Error::StoreUnavailable(format!("bad reset date {raw:?}: {e}")))?;
        state.last_reset_date = Some(date);
    }
    Ok(state)
}

/// Write both keys. An absent reset date removes its key.
pub fn save<S: KvStore>(store: &S, state: &RegistryState) -> Result<()> {
    save_entries(store, state)?;
    match state.last_reset_date {
        Some(date) => store.set(
            RESET_DATE_KEY,
            &date.format(RESET_DATE_FORMAT).to_string(),
        ),
        None => store.remove(RESET_DATE_KEY),
    }
}

fn save_entries<S: KvStore>(store: &S, state: &RegistryState) -> Result<()> {
    let list: Vec<&AttendanceEntry> = state.entries.values().collect();
    store.set(ENTRIES_KEY, &serde_json::to_string(&list)?)
}

/// The registry a session works against: the in-memory state is
/// authoritative, the store receives best-effort copies.
pub struct Registry<S: KvStore> {
    store: S,
    state: RegistryState,
    /// Reset date not yet stored because yesterday's entries are still there.
    pending_reset: Option<NaiveDate>,
}

impl<S: KvStore> Registry<S> {
    /// Load from `store` and reconcile against `today` before anything
    /// else can see the state.
    pub fn open(store: S, today: NaiveDate) -> Self {
        let state = load(&store);
        let mut registry = Self {
            store,
            state,
            pending_reset: None,
        };
        registry.reconcile_day(today);
        registry
    }

    pub fn state(&self) -> &RegistryState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn reconcile_day(&mut self, today: NaiveDate) -> DayCheck {
        let (state, check) = std::mem::take(&mut self.state).reconcile_day(today);
        self.state = state;
        if check == DayCheck::RolledOver {
            info!(%today, "new day, attendance cleared");
            // The stored date may only advance once the old entries are gone.
            match self.store.remove(ENTRIES_KEY) {
                Ok(()) => self.persist_reset_date(today),
                Err(e) => {
                    warn!(error = %e, "could not clear stored entries");
                    self.pending_reset = Some(today);
                }
            }
        }
        check
    }

    pub fn upsert(
        &mut self,
        person_id: &str,
        fields: EntryFields,
        now: NaiveDateTime,
    ) -> &AttendanceEntry {
        self.reconcile_day(now.date());
        self.state = std::mem::take(&mut self.state).upsert(person_id, fields, now);
        info!(person_id, "attendance recorded");
        match save_entries(&self.store, &self.state) {
            // the stored list now holds only today's entries
            Ok(()) => {
                if let Some(day) = self.pending_reset.take() {
                    self.persist_reset_date(day);
                }
            }
            Err(e) => warn!(error = %e, "could not persist entries, keeping them in memory"),
        }
        &self.state.entries[person_id]
    }

    pub fn find_today(&self, person_id: &str, today: NaiveDate) -> Option<&AttendanceEntry> {
        self.state.find_today(person_id, today)
    }

    pub fn classify<'a>(&'a self, directory: &'a Directory) -> Classification<'a> {
        self.state.classify(directory)
    }

    fn persist_reset_date(&mut self, today: NaiveDate) {
        self.pending_reset = None;
        let value = today.format(RESET_DATE_FORMAT).to_string();
        match self.store.set(RESET_DATE_KEY, &value) {
            Ok(()) => debug!(date = %value, "reset date stored"),
            Err(e) => warn!(error = %e, "could not persist reset date"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn at(d: u32, h: u32) -> NaiveDateTime {
        day(d).and_hms_opt(h, 0, 0).unwrap()
    }

    fn state_on(d: u32) -> RegistryState {
        RegistryState {
            entries: BTreeMap::new(),
            last_reset_date: Some(day(d)),
        }
    }

    /// Store whose every call fails.
    struct BrokenStore;

    impl KvStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(Error::StoreUnavailable("offline".into()))
        }
        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(Error::StoreUnavailable("offline".into()))
        }
        fn remove(&self, _key: &str) -> Result<()> {
            Err(Error::StoreUnavailable("offline".into()))
        }
    }

    #[test]
    fn second_upsert_replaces_first() {
        let state = state_on(1)
            .upsert("4", EntryFields::justified("dentista"), at(1, 8))
            .upsert("4", EntryFields::present(), at(1, 9));

        assert_eq!(state.entries.len(), 1);
        let entry = &state.entries["4"];
        assert!(entry.present);
        assert_eq!(entry.justification, "");
        assert_eq!(entry.timestamp, at(1, 9));
    }

    #[test]
    fn unknown_person_is_not_found() {
        let state = state_on(1).upsert("1", EntryFields::present(), at(1, 8));
        assert!(state.find_today("2", day(1)).is_none());
        assert!(state.find_today("1", day(1)).is_some());
    }

    #[test]
    fn find_today_ignores_entries_from_another_day() {
        let state = state_on(1).upsert("1", EntryFields::present(), at(1, 23));
        assert!(state.find_today("1", day(2)).is_none());
    }

    #[test]
    fn rollover_discards_entries() {
        let state = state_on(1)
            .upsert("1", EntryFields::present(), at(1, 8))
            .upsert("2", EntryFields::justified("férias"), at(1, 8));

        let (next, check) = state.reconcile_day(day(2));
        assert_eq!(check, DayCheck::RolledOver);
        assert!(next.entries.is_empty());
        assert_eq!(next.last_reset_date, Some(day(2)));
    }

    #[test]
    fn first_run_counts_as_rollover() {
        let (next, check) = RegistryState::empty().reconcile_day(day(5));
        assert_eq!(check, DayCheck::RolledOver);
        assert_eq!(next.last_reset_date, Some(day(5)));
    }

    #[test]
    fn same_day_reconcile_is_identity() {
        let state = state_on(1).upsert("9", EntryFields::present(), at(1, 6));
        let (next, check) = state.clone().reconcile_day(day(1));
        assert_eq!(check, DayCheck::SameDay);
        assert_eq!(next, state);
    }

    #[test]
    fn classify_one_present_out_of_ten() {
        let directory = Directory::builtin();
        let state = state_on(1).upsert("3", EntryFields::present(), at(1, 7));
        let c = state.classify(&directory);

        let confirmed: Vec<_> = c.confirmed.iter().map(|e| e.person_id.as_str()).collect();
        assert_eq!(confirmed, ["3"]);
        assert!(c.justified.is_empty());
        assert_eq!(c.absent.len(), 9);
        assert!(c.absent.iter().all(|p| p.id != "3"));
    }

    #[test]
    fn classify_justified_is_not_absent() {
        let directory = Directory::builtin();
        let state = state_on(1).upsert("7", EntryFields::justified("sick"), at(1, 7));
        let c = state.classify(&directory);

        assert!(c.confirmed.is_empty());
        assert_eq!(c.justified.len(), 1);
        assert_eq!(c.justified[0].person_id, "7");
        assert!(c.absent.iter().all(|p| p.id != "7"));
    }

    #[test]
    fn classify_partitions_directory() {
        let directory = Directory::builtin();
        let state = state_on(1)
            .upsert("1", EntryFields::present(), at(1, 7))
            .upsert("5", EntryFields::justified("curso"), at(1, 7))
            .upsert("ghost", EntryFields::present(), at(1, 7));
        let c = state.classify(&directory);

        let with_record = directory
            .list_all()
            .iter()
            .filter(|p| state.entries.contains_key(&p.id))
            .count();
        assert_eq!(c.absent.len() + with_record, directory.len());
        // the unknown id is confirmed but never touches the directory partition
        assert_eq!(c.confirmed.len(), 2);
    }

    #[test]
    fn present_and_justified_both_classify() {
        let directory = Directory::builtin();
        let fields = EntryFields {
            justification: "chegou atrasado".into(),
            present: true,
        };
        let state = state_on(1).upsert("2", fields, at(1, 10));
        let c = state.classify(&directory);
        assert_eq!(c.confirmed.len(), 1);
        assert_eq!(c.justified.len(), 1);
        assert_eq!(c.absent.len(), 9);
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = MemoryStore::new();
        let state = state_on(3)
            .upsert("1", EntryFields::present(), at(3, 7))
            .upsert("8", EntryFields::justified("missão"), at(3, 9));
        save(&store, &state).unwrap();
        assert_eq!(load(&store), state);

        let empty = state_on(3);
        save(&store, &empty).unwrap();
        assert_eq!(load(&store), empty);
    }

    #[test]
    fn load_without_data_is_empty() {
        assert_eq!(load(&MemoryStore::new()), RegistryState::empty());
    }

    #[test]
    fn load_degrades_on_garbage() {
        let store = MemoryStore::new();
        store.set(ENTRIES_KEY, "{not json").unwrap();
        assert_eq!(load(&store), RegistryState::empty());

        let store = MemoryStore::new();
        store.set(RESET_DATE_KEY, "01/01/2024").unwrap();
        assert_eq!(load(&store), RegistryState::empty());

        assert_eq!(load(&BrokenStore), RegistryState::empty());
    }

    #[test]
    fn open_rolls_over_stale_store() {
        let store = MemoryStore::new();
        save(&store, &state_on(1).upsert("1", EntryFields::present(), at(1, 7))).unwrap();

        let registry = Registry::open(&store, day(2));
        assert!(registry.state().entries.is_empty());
        assert_eq!(store.get(ENTRIES_KEY).unwrap(), None);
        assert_eq!(store.get(RESET_DATE_KEY).unwrap().as_deref(), Some("2024-01-02"));
    }

    #[test]
    fn upsert_writes_through() {
        let store = MemoryStore::new();
        let mut registry = Registry::open(&store, day(1));
        registry.upsert("6", EntryFields::justified("licença"), at(1, 11));

        let reloaded = Registry::open(&store, day(1));
        let entry = reloaded.find_today("6", day(1)).unwrap();
        assert_eq!(entry.justification, "licença");
    }

    #[test]
    fn upsert_after_midnight_starts_new_day() {
        let store = MemoryStore::new();
        let mut registry = Registry::open(&store, day(1));
        registry.upsert("1", EntryFields::present(), at(1, 23));
        registry.upsert("2", EntryFields::present(), at(2, 0));

        assert_eq!(registry.state().entries.len(), 1);
        assert_eq!(registry.state().last_reset_date, Some(day(2)));
    }

    /// Memory store that refuses to delete keys.
    #[derive(Default)]
    struct StickyStore {
        inner: MemoryStore,
    }

    impl KvStore for StickyStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }
        fn set(&self, key: &str, value: &str) -> Result<()> {
            self.inner.set(key, value)
        }
        fn remove(&self, _key: &str) -> Result<()> {
            Err(Error::StoreUnavailable("read-only".into()))
        }
    }

    #[test]
    fn failed_clear_does_not_carry_yesterday_into_today() {
        let directory = Directory::builtin();
        let store = StickyStore::default();
        Registry::open(&store, day(1)).upsert("3", EntryFields::present(), at(1, 7));

        let _ = Registry::open(&store, day(2));
        assert_eq!(store.get(RESET_DATE_KEY).unwrap().as_deref(), Some("2024-01-01"));

        let reopened = Registry::open(&store, day(2));
        let c = reopened.classify(&directory);
        assert!(c.confirmed.is_empty());
        assert_eq!(c.absent.len(), 10);
        assert!(reopened.find_today("3", day(2)).is_none());
    }

    #[test]
    fn pending_reset_date_stored_with_first_write() {
        let store = StickyStore::default();
        Registry::open(&store, day(1)).upsert("3", EntryFields::present(), at(1, 7));

        Registry::open(&store, day(2)).upsert("4", EntryFields::justified("escala"), at(2, 8));
        assert_eq!(store.get(RESET_DATE_KEY).unwrap().as_deref(), Some("2024-01-02"));

        let reopened = Registry::open(&store, day(2));
        assert_eq!(reopened.state().entries.len(), 1);
        assert!(reopened.find_today("4", day(2)).is_some());
        assert!(reopened.state().entries.get("3").is_none());
    }

    #[test]
    fn broken_store_keeps_session_in_memory() {
        let mut registry = Registry::open(BrokenStore, day(1));
        registry.upsert("3", EntryFields::present(), at(1, 7));
        assert!(registry.find_today("3", day(1)).is_some());
    }
}
