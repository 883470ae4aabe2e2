//! エイリアス変換モジュール
//!
//! レシート上の略記（"GRND BEEF" など）を正規の商品名に置き換える。
//! 照合は前後の空白を除いた完全一致（大文字小文字は無視）。

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// エイリアス定義
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AliasTable {
    /// 略記（小文字） → 正規名
    #[serde(default)]
    pub items: HashMap<String, String>,
}

impl AliasTable {
    /// 組み込みプリセットを取得
    pub fn from_preset(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "receipt" | "grocery" => Some(Self::receipt_preset()),
            "none" => Some(Self::default()),
            _ => None,
        }
    }

    /// JSONファイルから読み込み
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// JSON文字列から読み込み（キーは小文字化して保持）
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: Self = serde_json::from_str(json)?;
        let mut table = Self::default();
        for (alias, canonical) in raw.items {
            table.insert(&alias, &canonical);
        }
        Ok(table)
    }

    /// エイリアスを追加
    pub fn insert(&mut self, alias: &str, canonical: &str) {
        self.items
            .insert(alias.trim().to_lowercase(), canonical.to_string());
    }

    /// レシート略記プリセット
    fn receipt_preset() -> Self {
        let mut table = Self::default();

        // 肉・魚
        table.insert("grnd beef", "ground beef");
        table.insert("gr beef", "ground beef");
        table.insert("chk breast", "chicken breast");
        table.insert("chkn breast", "chicken breast");
        table.insert("bnls chkn", "chicken");
        table.insert("chkn", "chicken");
        table.insert("atl salmon", "salmon");

        // 乳製品・代替
        table.insert("whl milk", "dairy milk");
        table.insert("2% milk", "dairy milk");
        table.insert("alm milk", "almond milk");
        table.insert("ched chs", "cheese");
        table.insert("yog", "yogurt");
        table.insert("lg eggs", "eggs");

        // 青果
        table.insert("bnna", "bananas");
        table.insert("org bananas", "organic bananas");
        table.insert("avo", "avocados");

        // 飲料
        table.insert("btl water", "bottled water");
        table.insert("oj", "juice");
        table.insert("tea bgs", "tea bags");

        // 日用品
        table.insert("tp", "toilet paper");
        table.insert("ppr towel", "paper towels");
        table.insert("ppr towels", "paper towels");
        table.insert("lndry det", "laundry detergent");
        table.insert("dish liq", "dish soap");
        table.insert("alum foil", "aluminum foil");
        table.insert("plst wrap", "plastic wrap");

        table
    }

    /// 名前を正規化（一致しなければそのまま返す）
    pub fn normalize(&self, name: &str) -> String {
        match self.items.get(&name.trim().to_lowercase()) {
            Some(canonical) => canonical.clone(),
            None => name.to_string(),
        }
    }

    /// 設定をマージ（後から追加した設定が優先）
    pub fn merge(&mut self, other: &AliasTable) {
        self.items.extend(other.items.clone());
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// プリセットとカスタムJSONからエイリアス表を構築
pub fn build_alias_table(preset: Option<&str>, alias_json: Option<&str>) -> Result<AliasTable> {
    let mut table = AliasTable::default();

    if let Some(preset_name) = preset {
        if let Some(preset_table) = AliasTable::from_preset(preset_name) {
            table.merge(&preset_table);
        } else {
            tracing::warn!(preset = preset_name, "unknown alias preset (receipt/none)");
        }
    }

    // カスタムエイリアスJSONを適用（プリセットを上書き）
    if let Some(json) = alias_json {
        let custom = AliasTable::from_json(json)?;
        table.merge(&custom);
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_preset() {
        let table = AliasTable::from_preset("receipt").unwrap();
        assert_eq!(table.items.get("grnd beef"), Some(&"ground beef".to_string()));
        assert!(AliasTable::from_preset("unknown").is_none());
    }

    #[test]
    fn test_normalize_exact_case_insensitive() {
        let table = AliasTable::receipt_preset();
        assert_eq!(table.normalize("GRND BEEF"), "ground beef");
        assert_eq!(table.normalize("  Chk Breast "), "chicken breast");
    }

    #[test]
    fn test_normalize_is_not_partial() {
        // 部分一致では置換しない
        let table = AliasTable::receipt_preset();
        assert_eq!(table.normalize("GRND BEEF 30% 2LB"), "GRND BEEF 30% 2LB");
    }

    #[test]
    fn test_normalize_passthrough() {
        let table = AliasTable::receipt_preset();
        assert_eq!(table.normalize("Sourdough Loaf"), "Sourdough Loaf");
    }

    #[test]
    fn test_build_alias_table_custom_overrides_preset() {
        let json = r#"{"items": {"OJ": "orange juice", "KMBCHA": "kombucha"}}"#;
        let table = build_alias_table(Some("receipt"), Some(json)).unwrap();
        assert_eq!(table.normalize("oj"), "orange juice");
        assert_eq!(table.normalize("kmbcha"), "kombucha");
        assert_eq!(table.normalize("tp"), "toilet paper");
    }

    #[test]
    fn test_build_alias_table_unknown_preset_is_empty() {
        let table = build_alias_table(Some("pavement"), None).unwrap();
        assert!(table.is_empty());
    }
}
