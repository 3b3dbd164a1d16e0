//! Import and export of the quote list as a JSON document.

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde_json::{Map, Value};

use super::quote_store::QuoteStore;
use super::quotes_model::{validate_content, Origin, QuoteId, QuoteRecord};
use crate::errors::{QuoteError, Result};

/// Counts gathered while importing a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub added: usize,
    pub duplicates: usize,
    pub invalid: usize,
}

/// What an import amounted to, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    Added(usize),
    /// Valid elements existed but every one was already present.
    AllDuplicates,
    /// The list held no usable element.
    NothingToImport,
}

impl ImportReport {
    pub fn outcome(&self) -> ImportOutcome {
        if self.added > 0 {
            ImportOutcome::Added(self.added)
        } else if self.duplicates > 0 {
            ImportOutcome::AllDuplicates
        } else {
            ImportOutcome::NothingToImport
        }
    }
}

/// Serialize the full list as a formatted document.
pub fn export_document(records: &[QuoteRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Suggested file name for an export taken at `now`.
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("quotes_export_{}.json", now.format("%Y-%m-%d-%H-%M-%S"))
}

/// Append the valid, non-duplicate elements of `document` to the store.
///
/// Fails without touching the store when the document is not a JSON list.
pub fn import_document(store: &mut QuoteStore, document: &str) -> Result<ImportReport> {
    let value: Value = serde_json::from_str(document)
        .map_err(|e| QuoteError::validation(format!("Import document is not valid JSON: {}", e)))?;
    let Value::Array(items) = value else {
        return Err(QuoteError::validation("Imported document must be a list"));
    };

    let mut report = ImportReport::default();
    for item in &items {
        let Some(fields) = item.as_object() else {
            report.invalid += 1;
            continue;
        };
        let content = match (string_field(fields, "text"), string_field(fields, "category")) {
            (Some(text), Some(category)) => validate_content(text, category).ok(),
            _ => None,
        };
        let Some((text, category)) = content else {
            report.invalid += 1;
            continue;
        };

        if store.contains_content(&text, &category) {
            report.duplicates += 1;
            continue;
        }

        let record = imported_record(store, fields, text, category);
        store.push_unsaved(record);
        report.added += 1;
    }

    if report.added > 0 {
        store.commit()?;
    }
    info!(
        "[Import] {} added, {} duplicates, {} invalid",
        report.added, report.duplicates, report.invalid
    );
    Ok(report)
}

fn string_field<'a>(fields: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    fields.get(name).and_then(Value::as_str)
}

/// Keep a well-formed, unused identifier from the document; otherwise mint one.
fn imported_record(
    store: &QuoteStore,
    fields: &Map<String, Value>,
    text: String,
    category: String,
) -> QuoteRecord {
    let kept_id = string_field(fields, "id")
        .and_then(|raw| raw.parse::<QuoteId>().ok())
        .filter(|id| !store.contains_id(id));

    let mut record = QuoteRecord::new_local(text, category);
    if let Some(id) = kept_id {
        let namespace_origin = if id.is_remote() {
            Origin::Remote
        } else {
            Origin::Local
        };
        record.origin = string_field(fields, "source")
            .or_else(|| string_field(fields, "origin"))
            .and_then(parse_origin)
            .unwrap_or(namespace_origin);
        debug!("[Import] keeping id {}", id);
        record.id = id;
    }
    record
}

fn parse_origin(raw: &str) -> Option<Origin> {
    match raw {
        "local" => Some(Origin::Local),
        "server" | "remote" => Some(Origin::Remote),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKeyValueStore;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn store() -> QuoteStore {
        QuoteStore::load(Arc::new(MemoryKeyValueStore::new())).unwrap()
    }

    #[test]
    fn export_file_name_is_timestamped() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            export_file_name(now),
            "quotes_export_2024-03-09-14-05-07.json"
        );
    }

    #[test]
    fn import_rejects_non_list_documents() {
        let mut store = store();
        let before = store.all().to_vec();
        for document in [r#"{"text":"a","category":"b"}"#, "nope", "42"] {
            let err = import_document(&mut store, document).unwrap_err();
            assert!(matches!(err, QuoteError::Validation(_)));
        }
        assert_eq!(store.all(), before.as_slice());
    }

    #[test]
    fn import_skips_invalid_elements_and_counts_them() {
        let mut store = store();
        let document = r#"[
            {"text": "Fresh", "category": "New"},
            {"text": "No category"},
            {"text": "", "category": "Empty"},
            {"text": 5, "category": "Number"},
            "just a string"
        ]"#;
        let report = import_document(&mut store, document).unwrap();
        assert_eq!(
            report,
            ImportReport {
                added: 1,
                duplicates: 0,
                invalid: 4
            }
        );
        assert_eq!(report.outcome(), ImportOutcome::Added(1));
        assert!(store.contains_content("Fresh", "New"));
    }

    #[test]
    fn import_of_known_quotes_reports_all_duplicates() {
        let mut store = store();
        let revision = store.revision();
        let document = r#"[{"text": "Data is the new oil.", "category": "Technology"}]"#;
        let report = import_document(&mut store, document).unwrap();
        assert_eq!(report.outcome(), ImportOutcome::AllDuplicates);
        assert_eq!(store.revision(), revision);
    }

    #[test]
    fn import_of_empty_list_has_nothing_to_import() {
        let mut store = store();
        let report = import_document(&mut store, "[]").unwrap();
        assert_eq!(report.outcome(), ImportOutcome::NothingToImport);
    }

    #[test]
    fn import_dedups_within_the_same_document() {
        let mut store = store();
        let document = r#"[
            {"text": "Twice", "category": "Echo"},
            {"text": "Twice", "category": "Echo"}
        ]"#;
        let report = import_document(&mut store, document).unwrap();
        assert_eq!(report.added, 1);
        assert_eq!(report.duplicates, 1);
    }

    #[test]
    fn import_keeps_unused_ids_and_mints_fresh_ones_otherwise() {
        let mut store = store();
        let taken = store.all()[0].id.to_string();
        let document = format!(
            r#"[
                {{"id": "server-9", "text": "From server", "category": "S", "source": "server"}},
                {{"id": "{}", "text": "Collides", "category": "S"}},
                {{"id": "garbage", "text": "Bad id", "category": "S"}}
            ]"#,
            taken
        );
        let report = import_document(&mut store, &document).unwrap();
        assert_eq!(report.added, 3);

        let kept = store.get(&QuoteId::remote("9")).expect("kept remote id");
        assert_eq!(kept.origin, Origin::Remote);

        let collided = store
            .all()
            .iter()
            .find(|q| q.text == "Collides")
            .unwrap();
        assert_ne!(collided.id.to_string(), taken);
        assert_eq!(collided.origin, Origin::Local);

        let bad = store.all().iter().find(|q| q.text == "Bad id").unwrap();
        assert!(!bad.id.is_remote());
    }

    #[test]
    fn export_then_import_loses_nothing_and_adds_no_duplicates() {
        let mut source = store();
        source.add("Extra", "Misc").unwrap();
        let document = export_document(source.all()).unwrap();

        let report = import_document(&mut source, &document).unwrap();
        assert_eq!(report.outcome(), ImportOutcome::AllDuplicates);

        let mut target =
            QuoteStore::load(Arc::new(MemoryKeyValueStore::new())).unwrap();
        import_document(&mut target, &document).unwrap();
        for record in source.all() {
            assert!(target.contains_content(&record.text, &record.category));
        }
        assert_eq!(target.len(), source.len());
    }
}
