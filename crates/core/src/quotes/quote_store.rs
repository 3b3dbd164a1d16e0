use chrono::Utc;
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::sync::Arc;

use super::quotes_model::{validate_content, AddOutcome, Origin, QuoteId, QuoteRecord};
use crate::errors::Result;
use crate::storage::{KeyValueStore, QUOTES_KEY};

/// Records seeded when the persisted list is absent or unreadable.
pub const DEFAULT_QUOTES: [(&str, &str); 3] = [
    (
        "The best way to predict the future is to invent it.",
        "Motivation",
    ),
    ("Data is the new oil.", "Technology"),
    ("In difficulty lies opportunity.", "Inspiration"),
];

/// Outcome of moving a local record into the remote namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ReassignOutcome {
    Reassigned,
    /// The record was removed (or already reassigned) in the meantime.
    Missing,
    /// Another record already carries the target identifier.
    IdInUse,
}

/// Ordered in-memory list of quotes, persisted after every mutation.
pub struct QuoteStore {
    slots: Arc<dyn KeyValueStore>,
    quotes: Vec<QuoteRecord>,
    revision: u64,
}

impl std::fmt::Debug for QuoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteStore")
            .field("len", &self.quotes.len())
            .field("revision", &self.revision)
            .finish()
    }
}

impl QuoteStore {
    /// Read the persisted list, reseeding defaults when it is absent or malformed.
    pub fn load(slots: Arc<dyn KeyValueStore>) -> Result<Self> {
        let raw = slots.get(QUOTES_KEY)?;
        let mut store = Self {
            slots,
            quotes: Vec::new(),
            revision: 0,
        };

        match raw.as_deref().map(parse_quote_list) {
            Some(Ok(quotes)) => {
                debug!("[Store] loaded {} quotes", quotes.len());
                store.quotes = quotes;
            }
            Some(Err(reason)) => {
                warn!(
                    "[Store] persisted quotes are malformed ({}); seeding defaults",
                    reason
                );
                store.seed_defaults()?;
            }
            None => {
                info!("[Store] no persisted quotes; seeding defaults");
                store.seed_defaults()?;
            }
        }
        Ok(store)
    }

    fn seed_defaults(&mut self) -> Result<()> {
        self.quotes = DEFAULT_QUOTES
            .iter()
            .map(|(text, category)| QuoteRecord::new_local(*text, *category))
            .collect();
        self.commit()
    }

    /// Write the list back verbatim.
    pub fn save(&self) -> Result<()> {
        let document = serde_json::to_string(&self.quotes)?;
        self.slots.set(QUOTES_KEY, &document)
    }

    /// Bump the revision and persist. Every mutation path ends here.
    pub(crate) fn commit(&mut self) -> Result<()> {
        self.revision += 1;
        self.save()
    }

    pub fn all(&self) -> &[QuoteRecord] {
        &self.quotes
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Mutation counter; changes whenever the list changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn get(&self, id: &QuoteId) -> Option<&QuoteRecord> {
        self.quotes.iter().find(|q| &q.id == id)
    }

    pub fn contains_id(&self, id: &QuoteId) -> bool {
        self.get(id).is_some()
    }

    pub fn contains_content(&self, text: &str, category: &str) -> bool {
        self.quotes.iter().any(|q| q.has_content(text, category))
    }

    /// Sorted unique categories.
    pub fn categories(&self) -> Vec<String> {
        self.quotes
            .iter()
            .map(|q| q.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Append a new local quote unless it is empty or an exact duplicate.
    pub fn add(&mut self, text: &str, category: &str) -> Result<AddOutcome> {
        let (text, category) = validate_content(text, category)?;
        if self.contains_content(&text, &category) {
            debug!("[Store] duplicate quote ignored ({})", category);
            return Ok(AddOutcome::Duplicate);
        }

        let record = QuoteRecord::new_local(text, category);
        self.quotes.push(record.clone());
        self.commit()?;
        info!("[Store] added quote {}", record.id);
        Ok(AddOutcome::Added(record))
    }

    /// Delete by identifier. Returns `false` when no such record exists.
    pub fn remove(&mut self, id: &QuoteId) -> Result<bool> {
        let Some(index) = self.position(id) else {
            debug!("[Store] remove: no quote with id {}", id);
            return Ok(false);
        };
        self.quotes.remove(index);
        self.commit()?;
        info!("[Store] removed quote {}", id);
        Ok(true)
    }

    pub(crate) fn position(&self, id: &QuoteId) -> Option<usize> {
        self.quotes.iter().position(|q| &q.id == id)
    }

    pub(crate) fn records_mut(&mut self) -> &mut Vec<QuoteRecord> {
        &mut self.quotes
    }

    /// Append without saving; callers commit once after a batch.
    pub(crate) fn push_unsaved(&mut self, record: QuoteRecord) {
        self.quotes.push(record);
    }

    /// Move a pushed record into the remote namespace.
    ///
    /// `content`, when given, replaces the record's text and category in the
    /// same write.
    pub(crate) fn reassign_remote_id(
        &mut self,
        local_id: &QuoteId,
        remote_id: QuoteId,
        content: Option<(String, String)>,
    ) -> Result<ReassignOutcome> {
        if local_id != &remote_id && self.contains_id(&remote_id) {
            return Ok(ReassignOutcome::IdInUse);
        }
        let Some(index) = self.position(local_id) else {
            return Ok(ReassignOutcome::Missing);
        };

        let record = &mut self.quotes[index];
        record.id = remote_id;
        record.origin = Origin::Remote;
        record.last_modified = Utc::now();
        if let Some((text, category)) = content {
            record.text = text;
            record.category = category;
        }
        self.commit()?;
        Ok(ReassignOutcome::Reassigned)
    }
}

fn parse_quote_list(raw: &str) -> std::result::Result<Vec<QuoteRecord>, String> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    if !value.is_array() {
        return Err("not a list".to_string());
    }
    let quotes: Vec<QuoteRecord> = serde_json::from_value(value).map_err(|e| e.to_string())?;
    if let Some(bad) = quotes.iter().find(|q| !q.is_well_formed()) {
        return Err(format!("record {} has empty text or category", bad.id));
    }
    Ok(quotes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::QuoteError;
    use crate::storage::MemoryKeyValueStore;

    fn empty_store() -> (Arc<MemoryKeyValueStore>, QuoteStore) {
        let slots = Arc::new(MemoryKeyValueStore::new());
        let store = QuoteStore::load(slots.clone()).unwrap();
        (slots, store)
    }

    fn persisted(slots: &MemoryKeyValueStore) -> Vec<QuoteRecord> {
        let raw = slots.get(QUOTES_KEY).unwrap().expect("quotes persisted");
        serde_json::from_str(&raw).unwrap()
    }

    #[test]
    fn load_seeds_defaults_when_absent() {
        let (slots, store) = empty_store();
        assert_eq!(store.len(), DEFAULT_QUOTES.len());
        assert_eq!(persisted(&slots).len(), DEFAULT_QUOTES.len());
        assert!(store.all().iter().all(|q| q.origin == Origin::Local));
    }

    #[test]
    fn load_reseeds_over_malformed_data() {
        for corrupt in [
            r#"{"not":"a list"}"#,
            r#"[{"id":"local-1","text":"missing category","source":"local","updatedAt":0}]"#,
            r#"[{"id":"local-1","text":"","category":"C","source":"local","updatedAt":0}]"#,
            r#"[{"id":"bogus","text":"T","category":"C","source":"local","updatedAt":0}]"#,
            "not json at all",
        ] {
            let slots = Arc::new(MemoryKeyValueStore::new());
            slots.set(QUOTES_KEY, corrupt).unwrap();

            let store = QuoteStore::load(slots.clone()).unwrap();
            assert_eq!(store.len(), DEFAULT_QUOTES.len(), "input: {}", corrupt);
            assert_ne!(slots.get(QUOTES_KEY).unwrap().as_deref(), Some(corrupt));
        }
    }

    #[test]
    fn load_keeps_valid_persisted_list() {
        let slots = Arc::new(MemoryKeyValueStore::new());
        slots
            .set(
                QUOTES_KEY,
                r#"[{"id":"server-1","text":"T","category":"C","source":"server","updatedAt":5}]"#,
            )
            .unwrap();
        let store = QuoteStore::load(slots).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.all()[0].id, QuoteId::remote("1"));
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn add_appends_and_persists() {
        let (slots, mut store) = empty_store();
        let before = store.len();
        let revision = store.revision();

        let outcome = store.add(" Stay hungry. ", " Wisdom ").unwrap();
        let AddOutcome::Added(record) = outcome else {
            panic!("expected Added");
        };
        assert_eq!(record.text, "Stay hungry.");
        assert_eq!(record.category, "Wisdom");
        assert_eq!(store.len(), before + 1);
        assert!(store.revision() > revision);
        assert_eq!(persisted(&slots).len(), before + 1);
    }

    #[test]
    fn add_rejects_empty_fields_without_change() {
        let (_slots, mut store) = empty_store();
        let before = store.all().to_vec();

        for (text, category) in [("", "C"), ("T", ""), ("  ", "  ")] {
            let err = store.add(text, category).unwrap_err();
            assert!(matches!(err, QuoteError::Validation(_)));
        }
        assert_eq!(store.all(), before.as_slice());
    }

    #[test]
    fn add_suppresses_exact_duplicates() {
        let (_slots, mut store) = empty_store();
        let before = store.len();
        let outcome = store
            .add("Data is the new oil.", "Technology")
            .unwrap();
        assert_eq!(outcome, AddOutcome::Duplicate);
        assert_eq!(store.len(), before);

        // Same text in another category is a different quote.
        assert!(matches!(
            store.add("Data is the new oil.", "Economics").unwrap(),
            AddOutcome::Added(_)
        ));
    }

    #[test]
    fn remove_reports_missing_ids() {
        let (slots, mut store) = empty_store();
        let id = store.all()[0].id.clone();

        assert!(store.remove(&id).unwrap());
        assert!(!store.contains_id(&id));
        assert_eq!(persisted(&slots).len(), DEFAULT_QUOTES.len() - 1);

        let revision = store.revision();
        assert!(!store.remove(&id).unwrap());
        assert_eq!(store.revision(), revision);
    }

    #[test]
    fn categories_are_sorted_and_unique() {
        let (_slots, mut store) = empty_store();
        store.add("Another one", "Motivation").unwrap();
        assert_eq!(
            store.categories(),
            vec!["Inspiration", "Motivation", "Technology"]
        );
    }

    #[test]
    fn reassign_refuses_identifier_already_in_use() {
        let (_slots, mut store) = empty_store();
        let first = store.all()[0].id.clone();
        let second = store.all()[1].id.clone();

        let outcome = store
            .reassign_remote_id(&first, QuoteId::remote("101"), None)
            .unwrap();
        assert_eq!(outcome, ReassignOutcome::Reassigned);
        assert_eq!(store.get(&QuoteId::remote("101")).unwrap().origin, Origin::Remote);

        let outcome = store
            .reassign_remote_id(&second, QuoteId::remote("101"), None)
            .unwrap();
        assert_eq!(outcome, ReassignOutcome::IdInUse);
        assert!(store.contains_id(&second));

        let outcome = store
            .reassign_remote_id(&first, QuoteId::remote("102"), None)
            .unwrap();
        assert_eq!(outcome, ReassignOutcome::Missing);
    }
}
