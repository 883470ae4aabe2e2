//! エラーケーステスト
//!
//! 各種エラー条件でのエラーハンドリングを検証

use eco_scan::error::EcoScanError;
use eco_scan::scanner;
use eco_scan::store::ScanStore;
use std::path::Path;
use tempfile::tempdir;

/// 存在しないフォルダをスキャンした場合
#[test]
fn test_scan_nonexistent_folder() {
    let result = scanner::scan_folder(Path::new("/nonexistent/path/12345"), false);
    assert!(matches!(result, Err(EcoScanError::FolderNotFound(_))));
}

/// 画像のないフォルダをスキャンした場合
#[test]
fn test_scan_folder_no_images() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("test.txt"), "hello").unwrap();
    std::fs::write(dir.path().join("data.json"), "{}").unwrap();

    let result = scanner::scan_folder(dir.path(), true);
    assert!(result.unwrap().is_empty());
}

/// 画像として読めないファイル
#[test]
fn test_prepare_non_image() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("receipt.jpg");
    std::fs::write(&path, b"plain text").unwrap();

    let result = scanner::prepare_image(&path, 1600);
    assert!(matches!(result, Err(EcoScanError::ImageLoad(_))));
}

/// 不正なユーザーID
#[test]
fn test_invalid_user_id() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store = ScanStore::new(dir.path());

    assert!(matches!(store.history("../other"), Err(EcoScanError::InvalidUserId(_))));
    assert!(matches!(store.history(""), Err(EcoScanError::InvalidUserId(_))));
}

/// 存在しないスキャンID
#[test]
fn test_scan_not_found() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store = ScanStore::new(dir.path());
    assert!(matches!(store.get("alice", "scan_1"), Err(EcoScanError::ScanNotFound(_))));
}

/// 壊れた履歴ファイル
#[test]
fn test_corrupted_history_is_an_error() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::create_dir_all(dir.path().join("scans")).unwrap();
    std::fs::write(dir.path().join("scans").join("alice.json"), "[{ broken").unwrap();

    let store = ScanStore::new(dir.path());
    assert!(matches!(store.history("alice"), Err(EcoScanError::JsonParse(_))));
}

/// EcoScanErrorのDisplay実装確認
#[test]
fn test_error_display() {
    let errors = vec![
        EcoScanError::Config("bad config".to_string()),
        EcoScanError::FileNotFound("test.jpg".to_string()),
        EcoScanError::FolderNotFound("/path/to/folder".to_string()),
        EcoScanError::ApiCall("timeout".to_string()),
        EcoScanError::ApiParse("no JSON".to_string()),
        EcoScanError::NoItemsFound("receipt.jpg".to_string()),
        EcoScanError::ExcelGeneration("disk full".to_string()),
        EcoScanError::NoImagesFound("folder".to_string()),
    ];

    for err in errors {
        let display = format!("{}", err);
        assert!(!display.is_empty(), "empty error message: {:?}", err);
    }
}

/// MissingApiKeyエラーのメッセージ確認
#[test]
fn test_missing_api_key_message() {
    let display = EcoScanError::MissingApiKey.to_string();
    assert!(display.contains("eco-scan config"));
    assert!(display.contains("GEMINI_API_KEY"));
}

/// IOエラーからの変換
#[test]
fn test_io_error_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err: EcoScanError = io_err.into();

    assert!(matches!(err, EcoScanError::Io(_)));
    assert!(err.to_string().contains("IO"));
}

/// JSONエラーからの変換
#[test]
fn test_json_error_conversion() {
    let json_err = serde_json::from_str::<serde_json::Value>("{ invalid }").unwrap_err();
    let err: EcoScanError = json_err.into();

    assert!(matches!(err, EcoScanError::JsonParse(_)));
}

/// common::Errorからの変換（透過的）
#[test]
fn test_common_error_conversion() {
    let common_err = eco_scan_common::Error::Parse("catalog entry".to_string());
    let err: EcoScanError = common_err.into();

    assert!(matches!(err, EcoScanError::Core(_)));
    assert!(err.to_string().contains("catalog entry"));
}
