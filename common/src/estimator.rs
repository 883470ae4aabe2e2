//! ヒューリスティック推定
//!
//! 商品テーブルにない品目について、もっともらしいサステナビリティデータを
//! 合成する。処理は決定的で順序に依存する:
//!
//! 1. 基準値（score 50 / medium / 10.0 kg / 100 L / moderate）から開始
//! 2. キーワード補正（organic +20, local +15, processed -15 & carbon +5）
//! 3. カテゴリ別ブロックで環境値・代替品・影響度を上書き
//! 4. 最終スコアから影響度を再導出（ブロックの影響度は常に上書きされる）

use crate::categorizer::CategoryRules;
use crate::types::{Category, ImpactTier, Packaging, ProductEstimate, ProductRecord};

const ORGANIC_KEYWORDS: &[&str] = &["organic", "biodynamic", "pesticide-free", "pesticide free"];
const LOCAL_KEYWORDS: &[&str] = &["local", "farmers market", "homegrown", "regional", "seasonal"];
const PROCESSED_KEYWORDS: &[&str] = &[
    "processed", "frozen", "canned", "instant", "packaged", "ready meal", "microwave",
];
const RED_MEAT_KEYWORDS: &[&str] = &["beef", "steak", "veal", "lamb"];

const DEFAULT_REASON: &str = "general environmental considerations";

/// 推定中の状態
struct Draft {
    score: i32,
    impact: ImpactTier,
    carbon_footprint: f64,
    water_usage: u32,
    packaging: Packaging,
    alternatives: Vec<String>,
    reasons: Vec<String>,
}

impl Draft {
    fn baseline() -> Self {
        Self {
            score: 50,
            impact: ImpactTier::Medium,
            carbon_footprint: 10.0,
            water_usage: 100,
            packaging: Packaging::Moderate,
            alternatives: Vec::new(),
            reasons: Vec::new(),
        }
    }

    /// カテゴリブロックの上書き
    #[allow(clippy::too_many_arguments)]
    fn overwrite(
        &mut self,
        score_delta: i32,
        impact: ImpactTier,
        carbon_footprint: f64,
        water_usage: u32,
        packaging: Packaging,
        alternatives: &[&str],
        reason: &str,
    ) {
        self.score += score_delta;
        self.impact = impact;
        self.carbon_footprint = carbon_footprint;
        self.water_usage = water_usage;
        self.packaging = packaging;
        self.alternatives = alternatives.iter().map(|s| s.to_string()).collect();
        self.reasons.push(reason.to_string());
    }
}

fn contains_any(name: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| name.contains(k))
}

/// ヒューリスティック推定器
#[derive(Debug, Clone, Default)]
pub struct Estimator {
    rules: CategoryRules,
}

impl Estimator {
    pub fn new(rules: CategoryRules) -> Self {
        Self { rules }
    }

    /// 商品名から推定レコードを生成
    pub fn estimate(&self, name: &str) -> ProductEstimate {
        let lowered = name.to_lowercase();
        let mut draft = Draft::baseline();

        // キーワード補正（複数成立しうる）
        if contains_any(&lowered, ORGANIC_KEYWORDS) {
            draft.score += 20;
            draft.reasons.push("organic farming avoids synthetic pesticides".into());
        }
        if contains_any(&lowered, LOCAL_KEYWORDS) {
            draft.score += 15;
            draft.reasons.push("locally sourced with fewer transport miles".into());
        }
        let processed = contains_any(&lowered, PROCESSED_KEYWORDS);
        if processed {
            draft.score -= 15;
            draft.carbon_footprint += 5.0;
            draft.reasons.push("processing and packaging add emissions".into());
        }

        let category = self.rules.categorize(&lowered);
        apply_category_block(&mut draft, category, &lowered, processed);

        let score = draft.score.clamp(0, 100) as u8;
        // ブロックが設定した影響度は最終スコアで置き換える
        draft.impact = ImpactTier::from_score(score);

        if draft.reasons.is_empty() {
            draft.reasons.push(DEFAULT_REASON.into());
        }

        tracing::trace!(name, %category, score, impact = %draft.impact, "estimated product");

        ProductEstimate {
            record: ProductRecord {
                name: name.to_string(),
                category,
                score,
                impact: draft.impact,
                alternatives: draft.alternatives,
            },
            carbon_footprint: draft.carbon_footprint,
            water_usage: draft.water_usage,
            packaging: draft.packaging,
            reasons: draft.reasons,
        }
    }
}

fn apply_category_block(draft: &mut Draft, category: Category, name: &str, processed: bool) {
    // 青果は加工品ならボーナスなし、包装は過剰扱い
    let produce_packaging = if processed {
        Packaging::Excessive
    } else {
        Packaging::Minimal
    };

    match category {
        Category::Meat if contains_any(name, RED_MEAT_KEYWORDS) => draft.overwrite(
            -35,
            ImpactTier::High,
            27.0,
            1500,
            Packaging::Moderate,
            &["Plant-based protein", "Chicken", "Lentils"],
            "red meat has a very high carbon footprint",
        ),
        Category::Meat => draft.overwrite(
            -15,
            ImpactTier::Medium,
            6.9,
            430,
            Packaging::Moderate,
            &["Plant-based protein", "Tofu", "Beans"],
            "meat production is resource intensive",
        ),
        Category::Dairy => draft.overwrite(
            -10,
            ImpactTier::Medium,
            3.2,
            630,
            Packaging::Moderate,
            &["Oat milk", "Soy milk", "Plant-based yogurt"],
            "dairy farming drives emissions and water use",
        ),
        Category::Vegetables => draft.overwrite(
            if processed { 0 } else { 20 },
            ImpactTier::Low,
            0.5,
            40,
            produce_packaging,
            &[],
            "vegetables have a low footprint",
        ),
        Category::Fruits => draft.overwrite(
            if processed { 0 } else { 15 },
            ImpactTier::Low,
            0.8,
            70,
            produce_packaging,
            &[],
            "fresh fruit has a low footprint",
        ),
        Category::Snacks => draft.overwrite(
            -15,
            ImpactTier::High,
            3.5,
            150,
            Packaging::Excessive,
            &["Bulk snacks", "Homemade snacks", "Fresh fruit"],
            "snacks are heavily processed and packaged",
        ),
        Category::Beverages if name.contains("soda") || name.contains("cola") => draft.overwrite(
            -25,
            ImpactTier::High,
            1.8,
            250,
            Packaging::Excessive,
            &["Sparkling water", "Homemade beverages"],
            "single-use soft drink bottles",
        ),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_baseline_for_unclassifiable_name() {
        let estimate = Estimator::default().estimate("AA Batteries");
        assert_eq!(estimate.record.score, 50);
        assert_eq!(estimate.record.impact, ImpactTier::Medium);
        assert_eq!(estimate.record.category, Category::Other);
        assert_eq!(estimate.carbon_footprint, 10.0);
        assert_eq!(estimate.water_usage, 100);
        assert_eq!(estimate.packaging, Packaging::Moderate);
        assert!(estimate.record.alternatives.is_empty());
        assert_eq!(estimate.reasons, vec!["general environmental considerations"]);
    }

    #[test]
    fn test_estimate_keyword_adjustments_stack() {
        // organic +20, local +15 → 85（カテゴリなし）
        let estimate = Estimator::default().estimate("Organic Local Honey");
        assert_eq!(estimate.record.score, 85);
        assert_eq!(estimate.record.impact, ImpactTier::Low);
        assert_eq!(estimate.reasons.len(), 2);
    }

    #[test]
    fn test_estimate_processed_penalty() {
        let estimate = Estimator::default().estimate("Instant Ramen Cup");
        assert_eq!(estimate.record.score, 35);
        assert_eq!(estimate.carbon_footprint, 15.0);
        assert_eq!(estimate.record.impact, ImpactTier::High);
    }

    #[test]
    fn test_estimate_final_impact_overrides_block() {
        // 野菜ブロックは low を設定するが、加工品のためボーナスなし → 35 → high
        let estimate = Estimator::default().estimate("Canned Vegetables");
        assert_eq!(estimate.record.category, Category::Vegetables);
        assert_eq!(estimate.record.score, 35);
        assert_eq!(estimate.record.impact, ImpactTier::High);
        assert_eq!(estimate.packaging, Packaging::Excessive);
    }

    #[test]
    fn test_estimate_red_meat_block() {
        let estimate = Estimator::default().estimate("Ribeye Steak");
        assert_eq!(estimate.record.category, Category::Meat);
        assert_eq!(estimate.record.score, 15);
        assert_eq!(estimate.record.impact, ImpactTier::High);
        assert_eq!(estimate.carbon_footprint, 27.0);
        assert_eq!(estimate.record.alternatives[0], "Plant-based protein");
    }

    #[test]
    fn test_estimate_organic_produce_clamped() {
        // 50 + 20 + 15 + 20 = 105 → 100
        let estimate = Estimator::default().estimate("Organic Local Carrots");
        assert_eq!(estimate.record.score, 100);
        assert_eq!(estimate.record.impact, ImpactTier::Low);
    }

    #[test]
    fn test_estimate_soda_block_only_for_soda_or_cola() {
        let estimator = Estimator::default();
        let cola = estimator.estimate("Diet Cola 2L");
        assert_eq!(cola.record.score, 25);
        assert_eq!(cola.packaging, Packaging::Excessive);

        // その他の飲料は基準値のまま
        let wine = estimator.estimate("Red Wine");
        assert_eq!(wine.record.category, Category::Beverages);
        assert_eq!(wine.record.score, 50);
        assert_eq!(wine.packaging, Packaging::Moderate);
    }

    #[test]
    fn test_estimate_is_deterministic() {
        let estimator = Estimator::default();
        assert_eq!(estimator.estimate("Frozen Pizza"), estimator.estimate("Frozen Pizza"));
    }
}
