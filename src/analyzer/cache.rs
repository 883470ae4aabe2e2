//! 解析結果キャッシュモジュール
//!
//! レシート画像のSHA-256やバーコード値をキーにしてAPI結果を保存し、
//! 同じ入力の再問い合わせをスキップする。読み込み→書き込みは非アトミックで、
//! 単一ユーザーでの利用を前提とする。

use chrono::{DateTime, Utc};
use eco_scan_common::KeyValueStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

const CACHE_FILE_NAME: &str = ".eco-scan-cache.json";

/// レシート解析結果のキー
pub fn receipt_key(image_hash: &str) -> String {
    format!("receipt:{}", image_hash)
}

/// バーコード照会結果のキー
pub fn barcode_key(code: &str) -> String {
    format!("barcode:{}", code.trim())
}

/// キャッシュファイルの構造
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheFile {
    /// バージョン（互換性チェック用）
    version: u32,
    entries: HashMap<String, CacheEntry>,
}

/// キャッシュエントリ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub stored_at: DateTime<Utc>,
    pub value: Value,
}

impl CacheFile {
    const CURRENT_VERSION: u32 = 1;
}

impl Default for CacheFile {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            entries: HashMap::new(),
        }
    }
}

/// JSONファイルに永続化するキー・バリューストア
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    file: CacheFile,
}

impl JsonFileStore {
    /// キャッシュファイルのパス
    pub fn cache_path(dir: &Path) -> PathBuf {
        dir.join(CACHE_FILE_NAME)
    }

    /// キャッシュを開く（存在しない・壊れている・バージョン違いは空から開始）
    pub fn open(dir: &Path) -> Self {
        let path = Self::cache_path(dir);
        let file = Self::read(&path).unwrap_or_default();
        Self { path, file }
    }

    fn read(path: &Path) -> Option<CacheFile> {
        if !path.exists() {
            return None;
        }

        let reader = BufReader::new(File::open(path).ok()?);
        match serde_json::from_reader::<_, CacheFile>(reader) {
            Ok(cache) if cache.version == CacheFile::CURRENT_VERSION => Some(cache),
            Ok(cache) => {
                tracing::warn!(found = cache.version, "cache version mismatch, starting fresh");
                None
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable cache, starting fresh");
                None
            }
        }
    }

    fn save(&self) -> eco_scan_common::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(writer, &self.file)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// キャッシュ件数
    pub fn len(&self) -> usize {
        self.file.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file.entries.is_empty()
    }

    /// キャッシュを削除
    pub fn clear(dir: &Path) -> std::io::Result<bool> {
        let path = Self::cache_path(dir);
        if path.exists() {
            std::fs::remove_file(&path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.file.entries.get(key).map(|e| e.value.clone())
    }

    fn set(&mut self, key: &str, value: Value) -> eco_scan_common::Result<()> {
        self.file.entries.insert(
            key.to_string(),
            CacheEntry {
                stored_at: Utc::now(),
                value,
            },
        );
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_keys() {
        assert_eq!(receipt_key("abc"), "receipt:abc");
        assert_eq!(barcode_key(" 123 "), "barcode:123");
    }

    #[test]
    fn test_version_mismatch_starts_fresh() {
        let dir = tempdir().unwrap();
        std::fs::write(
            JsonFileStore::cache_path(dir.path()),
            r#"{"version": 99, "entries": {"k": {"stored_at": "2024-01-01T00:00:00Z", "value": 1}}}"#,
        )
        .unwrap();

        let store = JsonFileStore::open(dir.path());
        assert!(store.is_empty());
    }
}
