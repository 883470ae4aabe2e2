//! スキャン履歴の保存
//!
//! ユーザーごとに `<data_dir>/scans/<user_id>.json` へ配列として保存する。

use crate::error::{EcoScanError, Result};
use eco_scan_common::ScanResult;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

pub struct ScanStore {
    root: PathBuf,
}

/// ユーザーIDの検証（英数字・`_`・`-` のみ）
pub fn validate_user_id(user_id: &str) -> Result<()> {
    let valid = !user_id.is_empty()
        && user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(EcoScanError::InvalidUserId(user_id.to_string()))
    }
}

impl ScanStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            root: data_dir.join("scans"),
        }
    }

    fn user_path(&self, user_id: &str) -> Result<PathBuf> {
        validate_user_id(user_id)?;
        Ok(self.root.join(format!("{}.json", user_id)))
    }

    /// 保存順（古い順）のまま読み込む
    fn load(&self, user_id: &str) -> Result<Vec<ScanResult>> {
        let path = self.user_path(user_id)?;
        if !path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(File::open(&path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// スキャン結果を追加保存し、保存したIDを返す
    ///
    /// 既存のIDと重なった場合は `_2`, `_3` … を付けて保存する
    pub fn save(&self, scan: &ScanResult) -> Result<String> {
        let path = self.user_path(&scan.user_id)?;
        let mut scans = self.load(&scan.user_id)?;

        let mut stored = scan.clone();
        stored.id = unique_id(&scans, &scan.id);
        if stored.id != scan.id {
            tracing::debug!(requested = %scan.id, assigned = %stored.id, "scan id already taken");
        }
        let id = stored.id.clone();
        scans.push(stored);

        std::fs::create_dir_all(&self.root)?;
        let writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(writer, &scans)?;

        tracing::info!(user = %scan.user_id, id = %id, total = scans.len(), "scan saved");
        Ok(id)
    }

    /// 履歴（新しい順）
    pub fn history(&self, user_id: &str) -> Result<Vec<ScanResult>> {
        let mut scans = self.load(user_id)?;
        // 同時刻なら後から保存したものを先に
        scans.reverse();
        scans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(scans)
    }

    pub fn get(&self, user_id: &str, scan_id: &str) -> Result<ScanResult> {
        self.load(user_id)?
            .into_iter()
            .find(|s| s.id == scan_id)
            .ok_or_else(|| EcoScanError::ScanNotFound(scan_id.to_string()))
    }

    pub fn latest(&self, user_id: &str) -> Result<Option<ScanResult>> {
        Ok(self.history(user_id)?.into_iter().next())
    }
}

fn unique_id(scans: &[ScanResult], requested: &str) -> String {
    let taken = |id: &str| scans.iter().any(|s| s.id == id);
    if !taken(requested) {
        return requested.to_string();
    }
    (2..)
        .map(|n| format!("{}_{}", requested, n))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| requested.to_string())
}

/// 履歴の平均スコア（四捨五入、履歴なしは0）
pub fn average_score(history: &[ScanResult]) -> u8 {
    if history.is_empty() {
        return 0;
    }
    let sum: u32 = history.iter().map(|s| u32::from(s.total_score)).sum();
    (f64::from(sum) / history.len() as f64).round() as u8
}
