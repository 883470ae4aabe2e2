//! 商品テーブル
//!
//! 既知の商品名ごとのサステナビリティデータ。起動時に一度だけ構築し、
//! 以後は変更しない。照合は大文字小文字を無視した双方向の部分一致で、
//! テーブル順で最初に一致したエントリを採用する。

use crate::error::{Error, Result};
use crate::types::{Category, ImpactTier, ProductRecord};
use std::collections::HashSet;

/// 商品テーブル
#[derive(Debug, Clone)]
pub struct ProductCatalog {
    records: Vec<ProductRecord>,
    /// 照合用に小文字化した正規名（records と同順）
    lowered: Vec<String>,
}

impl ProductCatalog {
    /// レコード列からテーブルを構築（正規名の重複はエラー）
    pub fn new(records: Vec<ProductRecord>) -> Result<Self> {
        let mut seen = HashSet::new();
        for record in &records {
            let key = record.name.trim().to_lowercase();
            if key.is_empty() {
                return Err(Error::Config("catalog entry with empty name".into()));
            }
            if record.score > 100 {
                return Err(Error::Config(format!(
                    "catalog entry '{}' has score {} (expected 0-100)",
                    record.name, record.score
                )));
            }
            if !seen.insert(key) {
                return Err(Error::Config(format!(
                    "duplicate catalog entry '{}'",
                    record.name
                )));
            }
        }
        let lowered = records.iter().map(|r| r.name.to_lowercase()).collect();
        Ok(Self { records, lowered })
    }

    /// JSON配列から読み込み
    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<ProductRecord> = serde_json::from_str(json)?;
        Self::new(records)
    }

    /// JSONファイルから読み込み
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// 観測名に一致するエントリを検索
    pub fn lookup(&self, name: &str) -> Option<&ProductRecord> {
        let observed = name.trim().to_lowercase();
        if observed.is_empty() {
            return None;
        }

        self.lowered
            .iter()
            .position(|canonical| observed.contains(canonical.as_str()) || canonical.contains(&observed))
            .map(|idx| &self.records[idx])
    }

    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for ProductCatalog {
    fn default() -> Self {
        let records = default_records();
        let lowered = records.iter().map(|r| r.name.to_lowercase()).collect();
        Self { records, lowered }
    }
}

fn record(name: &str, category: Category, score: u8, impact: ImpactTier, alternatives: &[&str]) -> ProductRecord {
    ProductRecord {
        name: name.to_string(),
        category,
        score,
        impact,
        alternatives: alternatives.iter().map(|s| s.to_string()).collect(),
    }
}

/// 組み込みテーブル（順序は照合優先度を兼ねる）
fn default_records() -> Vec<ProductRecord> {
    use Category::*;
    use ImpactTier::{High, Low, Medium};

    vec![
        record("bottled water", Beverages, 20, High, &["Reusable water bottle", "Filtered tap water"]),
        record("plastic bags", Packaging, 10, High, &["Reusable cloth bags", "Paper bags"]),
        record("paper towels", Household, 40, Medium, &["Reusable cloth towels", "Bamboo towels"]),
        record("beef", Meat, 15, High, &["Plant-based protein", "Chicken", "Tofu"]),
        record("chicken", Meat, 40, Medium, &["Plant-based protein", "Tofu", "Beans"]),
        record("almond milk", DairyAlternatives, 60, Medium, &["Oat milk", "Soy milk"]),
        record("dairy milk", Dairy, 30, High, &["Oat milk", "Soy milk", "Almond milk"]),
        record("bananas", Fruits, 85, Low, &[]),
        record("apples", Fruits, 80, Low, &[]),
        record("avocados", Fruits, 65, Medium, &["Local seasonal fruits"]),
        record("toilet paper", Household, 35, Medium, &["Recycled toilet paper", "Bamboo toilet paper"]),
        record("laundry detergent", Household, 40, Medium, &["Eco-friendly detergent", "Detergent sheets"]),
        record("dish soap", Household, 45, Medium, &["Eco-friendly dish soap", "Solid dish soap"]),
        record("aluminum foil", Household, 30, High, &["Reusable silicone lids", "Beeswax wraps"]),
        record("plastic wrap", Household, 15, High, &["Beeswax wraps", "Silicone food covers"]),
        record("coffee", Beverages, 50, Medium, &["Fair trade coffee", "Shade-grown coffee"]),
        record("tea bags", Beverages, 55, Medium, &["Loose leaf tea", "Compostable tea bags"]),
        record("rice", Grains, 70, Low, &[]),
        record("pasta", Grains, 75, Low, &[]),
        record("bread", Bakery, 65, Medium, &["Local bakery bread", "Homemade bread"]),
        record("eggs", Dairy, 55, Medium, &["Free-range eggs", "Plant-based egg alternatives"]),
        record("yogurt", Dairy, 45, Medium, &["Plant-based yogurt", "Glass jar yogurt"]),
        record("cheese", Dairy, 25, High, &["Plant-based cheese", "Nutritional yeast"]),
        record("salmon", Seafood, 50, Medium, &["Sustainable certified seafood", "Plant-based seafood"]),
        record("tuna", Seafood, 40, Medium, &["Pole-caught tuna", "Plant-based seafood"]),
        record("shrimp", Seafood, 20, High, &["Sustainable certified seafood", "Plant-based seafood"]),
        record("chocolate", Snacks, 30, High, &["Fair trade chocolate", "Organic chocolate"]),
        record("chips", Snacks, 25, High, &["Bulk snacks", "Homemade snacks"]),
        record("soda", Beverages, 15, High, &["Sparkling water", "Homemade beverages"]),
        record("juice", Beverages, 40, Medium, &["Fresh squeezed juice", "Whole fruits"]),
    ]
}
