use std::sync::Arc;

use quotesync_core::quotes::{export_document, import_document, ImportOutcome, DEFAULT_QUOTES};
use quotesync_core::storage::QUOTES_KEY;
use quotesync_core::{
    AddOutcome, CategoryFilter, FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, Pick,
    QuoteError, QuoteStore, QuoteViewer,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn open(dir: &std::path::Path) -> (Arc<FileKeyValueStore>, QuoteStore) {
    let slots = Arc::new(FileKeyValueStore::open(dir).unwrap());
    let store = QuoteStore::load(slots.clone()).unwrap();
    (slots, store)
}

#[test]
fn quotes_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let added = {
        let (_slots, mut store) = open(dir.path());
        match store.add("Simplicity is prerequisite for reliability.", "Engineering") {
            Ok(AddOutcome::Added(record)) => record,
            other => panic!("unexpected outcome: {:?}", other),
        }
    };

    let (_slots, store) = open(dir.path());
    assert_eq!(store.len(), DEFAULT_QUOTES.len() + 1);
    assert_eq!(store.get(&added.id), Some(&added));
}

#[test]
fn corrupt_file_is_replaced_by_defaults() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("quotes.json"), "{\"oops\": true}").unwrap();

    let (slots, store) = open(dir.path());
    assert_eq!(store.len(), DEFAULT_QUOTES.len());

    let raw = slots.get(QUOTES_KEY).unwrap().unwrap();
    let reread: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(reread.as_array().map(Vec::len), Some(DEFAULT_QUOTES.len()));
}

#[test]
fn every_new_pair_grows_the_list_by_one() {
    let dir = tempfile::tempdir().unwrap();
    let (_slots, mut store) = open(dir.path());

    for i in 0..10 {
        let before = store.len();
        let outcome = store.add(&format!("Quote {}", i), "Numbers").unwrap();
        assert!(matches!(outcome, AddOutcome::Added(_)));
        assert_eq!(store.len(), before + 1);
    }

    let (_slots, reloaded) = open(dir.path());
    assert_eq!(reloaded.len(), store.len());
}

#[test]
fn empty_fields_are_rejected_everywhere() {
    let dir = tempfile::tempdir().unwrap();
    let (_slots, mut store) = open(dir.path());
    let before = store.all().to_vec();

    for (text, category) in [("", ""), ("text", " "), ("\t", "cat")] {
        assert!(matches!(
            store.add(text, category),
            Err(QuoteError::Validation(_))
        ));
    }
    assert_eq!(store.all(), before.as_slice());
}

#[test]
fn export_import_round_trip_into_fresh_store() {
    let source_dir = tempfile::tempdir().unwrap();
    let (_slots, mut source) = open(source_dir.path());
    source.add("Less is more.", "Design").unwrap();
    source.add("Ship it.", "Engineering").unwrap();
    let document = export_document(source.all()).unwrap();

    let target_dir = tempfile::tempdir().unwrap();
    let (_slots, mut target) = open(target_dir.path());
    let report = import_document(&mut target, &document).unwrap();

    assert_eq!(report.outcome(), ImportOutcome::Added(2));
    assert_eq!(report.duplicates, DEFAULT_QUOTES.len());
    for record in source.all() {
        assert!(target.contains_content(&record.text, &record.category));
    }

    let again = import_document(&mut target, &document).unwrap();
    assert_eq!(again.outcome(), ImportOutcome::AllDuplicates);
}

#[test]
fn viewer_remembers_last_pick_for_the_session_only() {
    let dir = tempfile::tempdir().unwrap();
    let (slots, store) = open(dir.path());
    let mut rng = StdRng::seed_from_u64(3);

    let session = Arc::new(MemoryKeyValueStore::new());
    let viewer = QuoteViewer::new(slots.clone(), session);
    let Pick::Shown(picked) = viewer
        .pick_random(&store, &CategoryFilter::All, &mut rng)
        .unwrap()
    else {
        panic!("defaults should be pickable");
    };
    assert_eq!(
        viewer.last_viewed(&CategoryFilter::All).unwrap(),
        Some(picked)
    );

    let next_session = QuoteViewer::new(slots, Arc::new(MemoryKeyValueStore::new()));
    assert_eq!(next_session.last_viewed(&CategoryFilter::All).unwrap(), None);
}
