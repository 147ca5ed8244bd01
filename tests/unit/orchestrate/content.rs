use super::*;

#[test]
fn page_table_has_three_images() {
    let table = ContentTable::default();
    assert_eq!(table.len(), 3);
    let m2 = table.lookup("2").unwrap();
    assert_eq!(m2.kind, MediaKind::Image);
    assert_eq!(m2.source_url, "assets/memories/m2.jpg");
    assert_eq!(m2.caption, "Caption number 2");
    assert!(table.lookup("4").is_none());
    assert!(table.lookup("memory-1").is_none());
}

#[test]
fn table_reads_keyed_json() {
    let table: ContentTable = serde_json::from_value(serde_json::json!({
        "memory-7": { "kind": "video", "src": "clips/seven.mp4" }
    }))
    .unwrap();
    let m = table.lookup("7").unwrap();
    assert_eq!(m.kind, MediaKind::Video);
    assert_eq!(m.source_url, "clips/seven.mp4");
    assert!(m.caption.is_empty());
}

#[test]
fn insert_prefixes_the_key() {
    let mut table = ContentTable::new(BTreeMap::new());
    assert!(table.is_empty());
    table.insert(
        "9",
        MemoryContent {
            kind: MediaKind::Image,
            source_url: "x.jpg".to_owned(),
            caption: String::new(),
        },
    );
    assert!(table.lookup("9").is_some());
}
