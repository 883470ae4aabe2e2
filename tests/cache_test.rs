//! キャッシュ機能テスト
//!
//! JSONファイルキャッシュの保存・読み込み・破損時の挙動を検証

use eco_scan::analyzer::{barcode_key, receipt_key, JsonFileStore};
use eco_scan::scanner::hash_bytes;
use eco_scan_common::{get_json, set_json, KeyValueStore, ProductIdentification, ReceiptExtraction};
use serde_json::json;
use tempfile::tempdir;

fn extraction(items: &[&str]) -> ReceiptExtraction {
    ReceiptExtraction {
        store_name: "Fresh Market".to_string(),
        items: items.iter().map(|s| s.to_string()).collect(),
        extracted_text: "GRND BEEF 8.99".to_string(),
    }
}

/// 空のキャッシュファイル
#[test]
fn test_cache_file_empty() {
    let dir = tempdir().expect("Failed to create temp dir");
    let cache = JsonFileStore::open(dir.path());

    assert_eq!(cache.len(), 0);
    assert!(cache.is_empty());
    assert!(!cache.path().exists());
}

/// キャッシュの保存と読み込み
#[test]
fn test_cache_save_and_load() {
    let dir = tempdir().expect("Failed to create temp dir");
    let key = receipt_key(&hash_bytes(b"receipt image bytes"));

    let mut cache = JsonFileStore::open(dir.path());
    set_json(&mut cache, &key, &extraction(&["Ground Beef", "Bananas"])).expect("save failed");
    assert!(cache.path().exists());

    // 再読み込み
    let loaded = JsonFileStore::open(dir.path());
    assert_eq!(loaded.len(), 1);

    let cached: ReceiptExtraction = get_json(&loaded, &key).expect("cache entry missing");
    assert_eq!(cached.items, vec!["Ground Beef", "Bananas"]);
    assert_eq!(cached.store_name, "Fresh Market");
}

/// 複数種類のエントリ
#[test]
fn test_cache_mixed_entries() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut cache = JsonFileStore::open(dir.path());

    let product = ProductIdentification {
        product_name: "Nutella".to_string(),
        brand: "Ferrero".to_string(),
        likely_category: "Spreads".to_string(),
        confidence: 0.95,
    };
    set_json(&mut cache, &barcode_key("3017620422003"), &product).unwrap();
    set_json(&mut cache, &receipt_key("abc"), &extraction(&["Oat Milk"])).unwrap();

    let loaded = JsonFileStore::open(dir.path());
    assert_eq!(loaded.len(), 2);
    let cached: ProductIdentification = get_json(&loaded, &barcode_key("3017620422003")).unwrap();
    assert_eq!(cached, product);
    assert!(get_json::<_, ProductIdentification>(&loaded, &barcode_key("000")).is_none());
}

/// キャッシュの上書き
#[test]
fn test_cache_overwrite() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut cache = JsonFileStore::open(dir.path());

    cache.set("same", json!({"v": 1})).unwrap();
    cache.set("same", json!({"v": 2})).unwrap();

    assert_eq!(cache.get("same"), Some(json!({"v": 2})));
    assert_eq!(cache.len(), 1);
}

/// キャッシュファイルが破損している場合
#[test]
fn test_cache_corrupted_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::write(JsonFileStore::cache_path(dir.path()), "{ invalid json }").unwrap();

    // 破損したキャッシュは空として扱われ、次の書き込みで作り直される
    let mut cache = JsonFileStore::open(dir.path());
    assert!(cache.is_empty());

    cache.set("k", json!(true)).unwrap();
    assert_eq!(JsonFileStore::open(dir.path()).len(), 1);
}

/// キャッシュの削除
#[test]
fn test_cache_clear() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut cache = JsonFileStore::open(dir.path());
    cache.set("k", json!(1)).unwrap();

    assert!(JsonFileStore::clear(dir.path()).unwrap());
    assert!(!JsonFileStore::clear(dir.path()).unwrap());
    assert!(JsonFileStore::open(dir.path()).is_empty());
}
