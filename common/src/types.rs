//! スコアリングの型定義
//!
//! - ProductRecord: 商品テーブルの静的エントリ
//! - ProductEstimate: 1品目の解決結果（テーブル一致または推定）
//! - ScannedItem / ScanResult: スキャン1回分の結果
//! - SustainabilityMetrics: フル版集計の出力

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};

/// 商品カテゴリ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Meat,
    Seafood,
    Dairy,
    #[serde(alias = "dairy alternatives")]
    DairyAlternatives,
    Vegetables,
    Fruits,
    Grains,
    Bakery,
    Snacks,
    Beverages,
    Household,
    Packaging,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Meat => "meat",
            Category::Seafood => "seafood",
            Category::Dairy => "dairy",
            Category::DairyAlternatives => "dairy-alternatives",
            Category::Vegetables => "vegetables",
            Category::Fruits => "fruits",
            Category::Grains => "grains",
            Category::Bakery => "bakery",
            Category::Snacks => "snacks",
            Category::Beverages => "beverages",
            Category::Household => "household",
            Category::Packaging => "packaging",
            Category::Other => "other",
        }
    }

    /// カテゴリ既定の環境負荷（テーブル一致時に使用）
    pub fn profile(&self) -> EnvironmentalProfile {
        let (carbon_footprint, water_usage, packaging) = match self {
            Category::Meat => (15.0, 1000, Packaging::Moderate),
            Category::Seafood => (8.0, 300, Packaging::Moderate),
            Category::Dairy => (6.0, 600, Packaging::Moderate),
            Category::DairyAlternatives => (1.0, 150, Packaging::Moderate),
            Category::Vegetables => (1.0, 50, Packaging::Minimal),
            Category::Fruits => (1.2, 80, Packaging::Minimal),
            Category::Grains => (2.5, 250, Packaging::Moderate),
            Category::Bakery => (1.5, 120, Packaging::Moderate),
            Category::Snacks => (4.0, 200, Packaging::Excessive),
            Category::Beverages => (1.5, 150, Packaging::Excessive),
            Category::Household => (3.0, 50, Packaging::Excessive),
            Category::Packaging => (2.0, 20, Packaging::Excessive),
            Category::Other => return EnvironmentalProfile::baseline(),
        };
        EnvironmentalProfile {
            carbon_footprint,
            water_usage,
            packaging,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 影響度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactTier {
    Low,
    Medium,
    High,
}

impl ImpactTier {
    /// スコアから影響度を導出（70以上: low, 40以上: medium, それ未満: high）
    pub fn from_score(score: u8) -> Self {
        if score >= 70 {
            ImpactTier::Low
        } else if score >= 40 {
            ImpactTier::Medium
        } else {
            ImpactTier::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImpactTier::Low => "low",
            ImpactTier::Medium => "medium",
            ImpactTier::High => "high",
        }
    }
}

impl std::fmt::Display for ImpactTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 包装の度合い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Packaging {
    Minimal,
    Moderate,
    Excessive,
}

impl Packaging {
    /// 包装廃棄物の重み
    pub fn weight(&self) -> u32 {
        match self {
            Packaging::Minimal => 1,
            Packaging::Moderate => 2,
            Packaging::Excessive => 3,
        }
    }
}

/// 環境負荷の3要素
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentalProfile {
    /// kg CO2e
    pub carbon_footprint: f64,
    /// リットル
    pub water_usage: u32,
    pub packaging: Packaging,
}

impl EnvironmentalProfile {
    pub fn baseline() -> Self {
        Self {
            carbon_footprint: 10.0,
            water_usage: 100,
            packaging: Packaging::Moderate,
        }
    }
}

/// 商品テーブルのエントリ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub name: String,
    pub category: Category,
    pub score: u8,
    pub impact: ImpactTier,
    #[serde(default)]
    pub alternatives: Vec<String>,
}

/// 1品目の解決結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductEstimate {
    pub record: ProductRecord,
    pub carbon_footprint: f64,
    pub water_usage: u32,
    pub packaging: Packaging,
    pub reasons: Vec<String>,
}

/// スキャンで検出された1品目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedItem {
    /// 観測された名前（正規名とは限らない）
    pub name: String,
    pub score: u8,
    pub impact: ImpactTier,
    #[serde(default)]
    pub alternatives: Vec<String>,
}

impl ScannedItem {
    pub fn from_record(observed: &str, record: &ProductRecord) -> Self {
        Self {
            name: observed.to_string(),
            score: record.score,
            impact: record.impact,
            alternatives: record.alternatives.clone(),
        }
    }
}

/// 近隣店舗
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyStore {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub distance_km: Option<f64>,
}

/// ユーザー位置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserLocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// スキャン1回分の結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub id: String,
    pub user_id: String,
    pub items: Vec<ScannedItem>,
    pub total_score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nearby_stores: Option<Vec<NearbyStore>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_location: Option<UserLocation>,
    pub created_at: DateTime<Utc>,
}

impl ScanResult {
    /// 新しいスキャン結果を作成（totalScoreは items から算出）
    pub fn new(user_id: &str, items: Vec<ScannedItem>) -> Self {
        let created_at = Utc::now();
        Self {
            id: next_scan_id(&created_at),
            user_id: user_id.to_string(),
            total_score: total_score_of(&items),
            items,
            image_url: None,
            feedback: None,
            nearby_stores: None,
            user_location: None,
            created_at,
        }
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback = Some(feedback.into());
        self
    }
}

static SCAN_SEQ: AtomicU32 = AtomicU32::new(0);

/// `scan_<ミリ秒>_<連番>`（同一ミリ秒内でも重複しない）
fn next_scan_id(created_at: &DateTime<Utc>) -> String {
    let seq = SCAN_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("scan_{}_{}", created_at.timestamp_millis(), seq)
}

/// 品目スコアの平均を四捨五入（品目なしは50）
pub fn total_score_of(items: &[ScannedItem]) -> u8 {
    if items.is_empty() {
        return 50;
    }
    let sum: u32 = items.iter().map(|i| u32::from(i.score)).sum();
    (f64::from(sum) / items.len() as f64).round() as u8
}

/// テーブル版集計の出力
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableScore {
    pub matched_items: Vec<ScannedItem>,
    pub total_score: u8,
}

/// 影響度別の品目数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemBreakdown {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl ItemBreakdown {
    pub fn record(&mut self, impact: ImpactTier) {
        match impact {
            ImpactTier::High => self.high += 1,
            ImpactTier::Medium => self.medium += 1,
            ImpactTier::Low => self.low += 1,
        }
    }
}

/// 代替品の提案
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeSuggestion {
    pub item: String,
    pub alternatives: Vec<String>,
    /// kg CO2e
    pub potential_savings: f64,
}

/// フル版集計の出力
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SustainabilityMetrics {
    pub total_score: u8,
    pub average_score: f64,
    pub carbon_footprint: f64,
    pub water_usage: u32,
    pub packaging_waste: u32,
    pub item_breakdown: ItemBreakdown,
    pub improvements: Vec<String>,
    pub alternatives: Vec<AlternativeSuggestion>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, score: u8) -> ScannedItem {
        ScannedItem {
            name: name.to_string(),
            score,
            impact: ImpactTier::from_score(score),
            alternatives: Vec::new(),
        }
    }

    #[test]
    fn test_impact_from_score_thresholds() {
        assert_eq!(ImpactTier::from_score(100), ImpactTier::Low);
        assert_eq!(ImpactTier::from_score(70), ImpactTier::Low);
        assert_eq!(ImpactTier::from_score(69), ImpactTier::Medium);
        assert_eq!(ImpactTier::from_score(40), ImpactTier::Medium);
        assert_eq!(ImpactTier::from_score(39), ImpactTier::High);
        assert_eq!(ImpactTier::from_score(0), ImpactTier::High);
    }

    #[test]
    fn test_packaging_weight() {
        let total: u32 = [Packaging::Excessive, Packaging::Moderate, Packaging::Minimal]
            .iter()
            .map(Packaging::weight)
            .sum();
        assert_eq!(total, 6);
    }

    #[test]
    fn test_total_score_of_empty_is_neutral() {
        assert_eq!(total_score_of(&[]), 50);
    }

    #[test]
    fn test_total_score_of_rounds_half_up() {
        // (15 + 40) / 2 = 27.5
        let items = vec![item("beef", 15), item("chicken", 40)];
        assert_eq!(total_score_of(&items), 28);
    }

    #[test]
    fn test_scan_result_recomputes_total() {
        let scan = ScanResult::new("user-1", vec![item("bananas", 85), item("soda", 15)]);
        assert_eq!(scan.total_score, 50);
        assert!(scan.id.starts_with("scan_"));
        assert_eq!(scan.user_id, "user-1");

        let next = ScanResult::new("user-1", vec![]);
        assert_ne!(scan.id, next.id);
    }

    #[test]
    fn test_scan_result_serialize_camel_case() {
        let scan = ScanResult::new("u", vec![item("rice", 70)]).with_feedback("ok");
        let json = serde_json::to_string(&scan).expect("シリアライズ失敗");
        assert!(json.contains("\"userId\":\"u\""));
        assert!(json.contains("\"totalScore\":70"));
        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"impact\":\"low\""));
        assert!(!json.contains("imageUrl"));
    }

    #[test]
    fn test_category_deserialize_labels() {
        let c: Category = serde_json::from_str("\"dairy alternatives\"").unwrap();
        assert_eq!(c, Category::DairyAlternatives);
        let c: Category = serde_json::from_str("\"dairy-alternatives\"").unwrap();
        assert_eq!(c, Category::DairyAlternatives);
    }

    #[test]
    fn test_other_category_uses_baseline_profile() {
        assert_eq!(Category::Other.profile(), EnvironmentalProfile::baseline());
    }
}
