//! スコアリングエンジン
//!
//! 商品テーブル・エイリアス表・推定器を構築時に受け取り、以後は
//! 純粋関数として品目名のリストを集計する。
//!
//! - テーブル版 (`score_table`): テーブルに一致しない品目は黙って除外
//! - フル版 (`assess`): エイリアス → テーブル → 推定 の順に解決し、品目を落とさない

use crate::alias::AliasTable;
use crate::catalog::ProductCatalog;
use crate::estimator::Estimator;
use crate::types::{
    total_score_of, AlternativeSuggestion, ImpactTier, ItemBreakdown, Packaging, ProductEstimate,
    ScannedItem, SustainabilityMetrics, TableScore,
};

/// 代替品に切り替えたときに削減できるCO2の割合
const SWITCH_SAVINGS_RATIO: f64 = 0.5;

/// 1品目あたりの平均CO2がこれを超えたら改善提案を出す（kg CO2e）
const HIGH_CARBON_PER_ITEM: f64 = 10.0;

/// 品目の解決元
#[derive(Debug, Clone, PartialEq)]
pub enum MatchSource {
    /// テーブルのエントリに一致（正規名）
    Catalog(String),
    /// ヒューリスティック推定
    Estimated,
}

/// 1品目の解決結果
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub observed: String,
    pub source: MatchSource,
    pub estimate: ProductEstimate,
}

impl Resolution {
    pub fn to_scanned_item(&self) -> ScannedItem {
        ScannedItem::from_record(&self.observed, &self.estimate.record)
    }
}

/// スコアリングエンジン
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    catalog: ProductCatalog,
    aliases: AliasTable,
    estimator: Estimator,
}

impl ScoringEngine {
    pub fn new(catalog: ProductCatalog, aliases: AliasTable, estimator: Estimator) -> Self {
        Self {
            catalog,
            aliases,
            estimator,
        }
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// テーブル版: 一致した品目のみを集計（一致なしは50）
    pub fn score_table(&self, items: &[String]) -> TableScore {
        let matched_items: Vec<ScannedItem> = items
            .iter()
            .filter_map(|name| {
                self.catalog
                    .lookup(name)
                    .map(|record| ScannedItem::from_record(name, record))
            })
            .collect();

        if matched_items.len() < items.len() {
            tracing::debug!(
                total = items.len(),
                matched = matched_items.len(),
                "unmatched items dropped from table score"
            );
        }

        TableScore {
            total_score: total_score_of(&matched_items),
            matched_items,
        }
    }

    /// 1品目を解決（エイリアス → テーブル → 推定）
    pub fn resolve(&self, observed: &str) -> Resolution {
        let normalized = self.aliases.normalize(observed);

        let (source, estimate) = match self.catalog.lookup(&normalized) {
            Some(record) => {
                let profile = record.category.profile();
                // 影響度は推定と同じくスコアから導出
                let mut record = record.clone();
                record.impact = ImpactTier::from_score(record.score);
                (
                    MatchSource::Catalog(record.name.clone()),
                    ProductEstimate {
                        carbon_footprint: profile.carbon_footprint,
                        water_usage: profile.water_usage,
                        packaging: profile.packaging,
                        reasons: vec![format!("listed in product catalog as '{}'", record.name)],
                        record,
                    },
                )
            }
            None => (MatchSource::Estimated, self.estimator.estimate(&normalized)),
        };

        Resolution {
            observed: observed.to_string(),
            source,
            estimate,
        }
    }

    pub fn resolve_all(&self, items: &[String]) -> Vec<Resolution> {
        items.iter().map(|name| self.resolve(name)).collect()
    }

    /// フル版の品目リスト（ScanResult用）
    pub fn scan_items(&self, items: &[String]) -> Vec<ScannedItem> {
        self.resolve_all(items)
            .iter()
            .map(Resolution::to_scanned_item)
            .collect()
    }

    /// フル版: 環境負荷を含む集計
    pub fn assess(&self, items: &[String]) -> SustainabilityMetrics {
        metrics_from(&self.resolve_all(items))
    }
}

/// 解決済み品目から集計値を算出
pub fn metrics_from(resolutions: &[Resolution]) -> SustainabilityMetrics {
    let scanned: Vec<ScannedItem> = resolutions.iter().map(Resolution::to_scanned_item).collect();

    let mut breakdown = ItemBreakdown::default();
    let mut carbon_footprint = 0.0;
    let mut water_usage = 0u32;
    let mut packaging_waste = 0u32;
    let mut alternatives = Vec::new();

    for r in resolutions {
        let est = &r.estimate;
        breakdown.record(est.record.impact);
        carbon_footprint += est.carbon_footprint;
        water_usage = water_usage.saturating_add(est.water_usage);
        packaging_waste += est.packaging.weight();

        if est.record.impact == ImpactTier::High && !est.record.alternatives.is_empty() {
            alternatives.push(AlternativeSuggestion {
                item: r.observed.clone(),
                alternatives: est.record.alternatives.clone(),
                potential_savings: round1(est.carbon_footprint * SWITCH_SAVINGS_RATIO),
            });
        }
    }

    let average_score = if scanned.is_empty() {
        50.0
    } else {
        scanned.iter().map(|i| f64::from(i.score)).sum::<f64>() / scanned.len() as f64
    };
    let total_score = total_score_of(&scanned);
    let carbon_footprint = round1(carbon_footprint);

    let improvements = improvements_for(
        resolutions,
        total_score,
        carbon_footprint,
        packaging_waste,
        &breakdown,
    );

    SustainabilityMetrics {
        total_score,
        average_score,
        carbon_footprint,
        water_usage,
        packaging_waste,
        item_breakdown: breakdown,
        improvements,
        alternatives,
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn improvements_for(
    resolutions: &[Resolution],
    total_score: u8,
    carbon_footprint: f64,
    packaging_waste: u32,
    breakdown: &ItemBreakdown,
) -> Vec<String> {
    let count = resolutions.len();
    if count == 0 {
        return Vec::new();
    }

    let mut improvements = Vec::new();

    if breakdown.high > 0 {
        let noun = if breakdown.high == 1 { "item" } else { "items" };
        improvements.push(format!(
            "Swap {} high-impact {} for the suggested alternatives",
            breakdown.high, noun
        ));
    }

    let has_meat = resolutions
        .iter()
        .any(|r| r.estimate.record.category == crate::types::Category::Meat);
    if has_meat {
        improvements.push("Try a plant-based protein for a few meals each week".into());
    }

    // 平均で moderate を超える包装
    if packaging_waste > Packaging::Moderate.weight() * count as u32 {
        improvements.push("Choose products with minimal or recyclable packaging".into());
    }

    if carbon_footprint / count as f64 > HIGH_CARBON_PER_ITEM {
        improvements.push("Favor local, seasonal produce to cut your basket's carbon footprint".into());
    }

    if improvements.is_empty() && total_score >= 75 {
        improvements.push("Keep it up! Your basket is already low impact".into());
    }

    improvements
}
