use std::sync::Arc;
use std::thread;

use controller::store::{ConfigDocument, ConfigStore};
use serde_json::json;

#[test]
fn test_bootstrap_document() {
    let store = ConfigStore::bootstrap().unwrap();
    let current = store.current();

    assert_eq!(current.root(), &json!({"sockets": {}, "applications": {}}));
    assert_eq!(current.generation(), 1);
}

#[test]
fn test_lookup_paths() {
    let doc = ConfigDocument::parse(br#"{"a": {"b": [10, {"c": "x"}]}, "d": null}"#).unwrap();

    assert_eq!(doc.lookup("/"), Some(doc.root()));
    assert_eq!(doc.lookup(""), Some(doc.root()));
    assert_eq!(doc.lookup("/a/b/0"), Some(&json!(10)));
    assert_eq!(doc.lookup("/a/b/1/c"), Some(&json!("x")));
    assert_eq!(doc.lookup("/a/b/1/c/"), Some(&json!("x")));
    assert_eq!(doc.lookup("/d"), Some(&json!(null)));
    assert_eq!(doc.lookup("/a/b/2"), None);
    assert_eq!(doc.lookup("/a/b/x"), None);
    assert_eq!(doc.lookup("/a/missing"), None);
    assert_eq!(doc.lookup("/d/deeper"), None);
}

#[test]
fn test_snapshot_lookup_found_and_missing() {
    let store = ConfigStore::bootstrap().unwrap();
    let snapshot = store.current();

    assert_eq!(snapshot.lookup("/sockets"), Some(&json!({})));
    assert!(snapshot.lookup("/does-not-exist").is_none());
}

#[test]
fn test_store_lookup_resolves_pointer_once() {
    let store = ConfigStore::bootstrap().unwrap();
    store.replace(ConfigDocument::parse(br#"{"a~b": {"list": [1, {"c": 2}]}}"#).unwrap());

    let found = store.lookup("//a~b/list/1/").unwrap();
    assert_eq!(found.pointer(), "/a~0b/list/1");
    assert_eq!(found.value(), Some(&json!({"c": 2})));
    assert_eq!(found.document().generation(), 2);

    assert!(store.lookup("/a~b/list/2").is_none());
    assert!(store.lookup("/a~b/list/01").is_none());
}

#[test]
fn test_value_ref_outlives_replace() {
    let store = ConfigStore::bootstrap().unwrap();
    let held = store.lookup("/sockets").unwrap();

    store.replace(ConfigDocument::parse(b"[1, 2, 3]").unwrap());

    assert_eq!(held.value(), Some(&json!({})));
    assert_eq!(held.document().generation(), 1);
    assert!(store.lookup("/sockets").is_none());
}

#[test]
fn test_replace_is_whole_document() {
    let store = ConfigStore::bootstrap().unwrap();
    let staged = ConfigDocument::parse(br#"{"applications": {"app": 1}}"#).unwrap();
    assert_eq!(staged.generation(), 0);

    let generation = store.replace(staged);
    assert_eq!(generation, 2);

    let current = store.current();
    assert_eq!(current.lookup("/applications/app"), Some(&json!(1)));
    assert!(current.lookup("/sockets").is_none());
}

#[test]
fn test_snapshot_outlives_replace() {
    let store = ConfigStore::bootstrap().unwrap();
    let held = store.current();
    let sockets = held.lookup("/sockets").unwrap();

    store.replace(ConfigDocument::parse(b"[1, 2, 3]").unwrap());

    assert_eq!(sockets, &json!({}));
    assert_eq!(held.root(), &json!({"sockets": {}, "applications": {}}));
    assert_eq!(held.generation(), 1);
    assert_eq!(store.current().root(), &json!([1, 2, 3]));
}

#[test]
fn test_invalid_json_never_reaches_store() {
    let store = ConfigStore::bootstrap().unwrap();
    let before = store.current();

    assert!(ConfigDocument::parse(b"{\"sockets\": ").is_err());
    assert!(ConfigDocument::parse(b"").is_err());

    assert!(Arc::ptr_eq(&before, &store.current()));
}

#[test]
fn test_member_order_preserved() {
    let doc = ConfigDocument::parse(br#"{"z": 1, "a": 2, "m": 3}"#).unwrap();
    let keys: Vec<&String> = doc.root().as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["z", "a", "m"]);
}

#[test]
fn test_concurrent_replace_and_lookup_never_tears() {
    // Each document is internally consistent: every key maps to the same id.
    let document = |id: u64| {
        ConfigDocument::from_value(json!({
            "sockets": {"id": id},
            "applications": {"id": id},
        }))
    };

    let store = Arc::new(ConfigStore::new(document(0)));

    let writers: Vec<_> = (1..=4)
        .map(|w| {
            let store = store.clone();
            thread::spawn(move || {
                for i in 0..250 {
                    store.replace(document(w * 1000 + i));
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = store.clone();
            thread::spawn(move || {
                let mut last_generation = 0;
                for _ in 0..2000 {
                    let snapshot = store.current();
                    let sockets = snapshot.lookup("/sockets/id").unwrap();
                    let applications = snapshot.lookup("/applications/id").unwrap();
                    assert_eq!(sockets, applications);

                    assert!(snapshot.generation() >= last_generation);
                    last_generation = snapshot.generation();
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }

    assert_eq!(store.current().generation(), 1 + 4 * 250);
}
