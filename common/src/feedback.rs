//! フィードバック文面の生成
//!
//! 集計結果と品目リストから表示用テキストを組み立てる。副作用なしの純粋関数。

use crate::types::{ImpactTier, ScanResult, ScannedItem, SustainabilityMetrics};
use std::fmt::Write;

/// 一般的なサステナビリティのヒント（固定）
pub const GENERAL_TIPS: &[&str] = &[
    "Bring reusable bags and produce sacks when you shop.",
    "Buy seasonal produce from local growers.",
    "Choose products with minimal or recyclable packaging.",
    "Plan meals ahead to cut food waste.",
    "Swap one meat-based meal a week for a plant-based one.",
];

/// スコアの評価ラベル（75/50/25区切り）
pub fn rating_label(score: u8) -> &'static str {
    if score >= 75 {
        "Excellent"
    } else if score >= 50 {
        "Good"
    } else if score >= 25 {
        "Fair"
    } else {
        "Poor"
    }
}

/// スコアに応じた一言
pub fn summary_message(score: u8) -> &'static str {
    if score >= 75 {
        "Great job! Your shopping habits are eco-friendly."
    } else if score >= 50 {
        "Good progress! There's room for improvement."
    } else {
        "Let's work on making more sustainable choices."
    }
}

/// 前回スコアとの比較
pub fn trend_note(current: u8, previous: u8) -> String {
    let delta = i16::from(current) - i16::from(previous);
    match delta {
        d if d > 0 => format!("Your score improved by {} points since your last scan.", d),
        d if d < 0 => format!("Your score dropped by {} points since your last scan.", -d),
        _ => "Your score is unchanged since your last scan.".to_string(),
    }
}

/// 集計結果をフィードバック文面に整形
///
/// # Arguments
/// * `metrics` - フル版の集計結果
/// * `items` - スキャンした品目（検出順）
/// * `previous_score` - 前回スキャンのスコア（あればトレンドを追記）
pub fn format_feedback(
    metrics: &SustainabilityMetrics,
    items: &[ScannedItem],
    previous_score: Option<u8>,
) -> String {
    let mut out = String::new();

    // writeln! to String never fails
    let _ = writeln!(
        out,
        "Sustainability score: {}/100 ({})",
        metrics.total_score,
        rating_label(metrics.total_score)
    );
    let _ = writeln!(out, "{}", summary_message(metrics.total_score));

    let b = &metrics.item_breakdown;
    let _ = writeln!(out);
    let _ = writeln!(out, "Footprint");
    let _ = writeln!(out, "- Carbon: {:.1} kg CO2e", metrics.carbon_footprint);
    let _ = writeln!(out, "- Water: {} L", metrics.water_usage);
    let _ = writeln!(out, "- Packaging waste index: {}", metrics.packaging_waste);
    let _ = writeln!(
        out,
        "- Impact mix: {} high / {} medium / {} low",
        b.high, b.medium, b.low
    );

    let _ = writeln!(out);
    let _ = writeln!(out, "High-impact items");
    let high: Vec<&ScannedItem> = items
        .iter()
        .filter(|i| i.impact == ImpactTier::High)
        .collect();
    if high.is_empty() {
        let _ = writeln!(out, "- None, nice work!");
    }
    for item in high {
        let _ = writeln!(out, "- {} (score {})", item.name, item.score);
    }

    if !metrics.alternatives.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Suggested alternatives");
        for alt in &metrics.alternatives {
            let _ = writeln!(
                out,
                "- {}: {} (saves ~{:.1} kg CO2e)",
                alt.item,
                alt.alternatives.join(", "),
                alt.potential_savings
            );
        }
    }

    if !metrics.improvements.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Ways to improve");
        for improvement in &metrics.improvements {
            let _ = writeln!(out, "- {}", improvement);
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "General tips");
    for tip in GENERAL_TIPS {
        let _ = writeln!(out, "- {}", tip);
    }

    if let Some(previous) = previous_score {
        let _ = writeln!(out);
        let _ = writeln!(out, "Trend: {}", trend_note(metrics.total_score, previous));
    }

    out.trim_end().to_string()
}

/// 共有用メッセージ
pub fn share_message(scan: &ScanResult) -> String {
    let lines: Vec<String> = scan
        .items
        .iter()
        .map(|item| format!("• {} ({} impact)", item.name, item.impact))
        .collect();

    format!(
        "My EcoScan Sustainability Score: {}/100\n\nItems scanned:\n{}\n\nScanned with EcoScan - Make sustainable shopping choices!",
        scan.total_score,
        lines.join("\n")
    )
}

/// バーコードスキャン時の見出し
pub fn barcode_feedback(
    format: &str,
    code: &str,
    product_name: &str,
    brand: &str,
    category: &str,
    confidence: Option<f64>,
) -> String {
    let mut lines = vec![format!("Detected {}: {}", format, code)];
    if brand.is_empty() {
        lines.push(format!("Product: {}", product_name));
    } else {
        lines.push(format!("Product: {} ({})", product_name, brand));
    }
    if !category.is_empty() {
        lines.push(format!("Category: {}", category));
    }
    if let Some(confidence) = confidence {
        lines.push(format!("Confidence: {:.0}%", confidence * 100.0));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AlternativeSuggestion, ItemBreakdown};

    fn sample_items() -> Vec<ScannedItem> {
        vec![
            ScannedItem {
                name: "Ground Beef".into(),
                score: 15,
                impact: ImpactTier::High,
                alternatives: vec!["Plant-based protein".into(), "Chicken".into()],
            },
            ScannedItem {
                name: "Bananas".into(),
                score: 85,
                impact: ImpactTier::Low,
                alternatives: vec![],
            },
        ]
    }

    fn sample_metrics() -> SustainabilityMetrics {
        SustainabilityMetrics {
            total_score: 50,
            average_score: 50.0,
            carbon_footprint: 16.2,
            water_usage: 1080,
            packaging_waste: 3,
            item_breakdown: ItemBreakdown { high: 1, medium: 0, low: 1 },
            improvements: vec!["Swap 1 high-impact item for the suggested alternatives".into()],
            alternatives: vec![AlternativeSuggestion {
                item: "Ground Beef".into(),
                alternatives: vec!["Plant-based protein".into(), "Chicken".into()],
                potential_savings: 7.5,
            }],
        }
    }

    #[test]
    fn test_rating_label() {
        assert_eq!(rating_label(75), "Excellent");
        assert_eq!(rating_label(74), "Good");
        assert_eq!(rating_label(50), "Good");
        assert_eq!(rating_label(25), "Fair");
        assert_eq!(rating_label(24), "Poor");
    }

    #[test]
    fn test_format_feedback_sections() {
        let text = format_feedback(&sample_metrics(), &sample_items(), None);
        assert!(text.starts_with("Sustainability score: 50/100 (Good)"));
        assert!(text.contains("- Carbon: 16.2 kg CO2e"));
        assert!(text.contains("- Water: 1080 L"));
        assert!(text.contains("- Ground Beef (score 15)"));
        assert!(!text.contains("- Bananas (score"));
        assert!(text.contains("- Ground Beef: Plant-based protein, Chicken (saves ~7.5 kg CO2e)"));
        assert!(text.contains("Ways to improve"));
        assert!(text.contains(GENERAL_TIPS[0]));
        assert!(!text.contains("Trend:"));
    }

    #[test]
    fn test_format_feedback_is_pure() {
        let metrics = sample_metrics();
        let items = sample_items();
        assert_eq!(
            format_feedback(&metrics, &items, Some(40)),
            format_feedback(&metrics, &items, Some(40))
        );
    }

    #[test]
    fn test_format_feedback_omits_empty_sections() {
        let mut metrics = sample_metrics();
        metrics.alternatives.clear();
        metrics.improvements.clear();
        let text = format_feedback(&metrics, &[], None);
        assert!(!text.contains("Suggested alternatives"));
        assert!(!text.contains("Ways to improve"));
        assert!(text.contains("- None, nice work!"));
    }

    #[test]
    fn test_format_feedback_trend() {
        let text = format_feedback(&sample_metrics(), &sample_items(), Some(45));
        assert!(text.ends_with("Trend: Your score improved by 5 points since your last scan."));
        assert_eq!(trend_note(40, 52), "Your score dropped by 12 points since your last scan.");
        assert_eq!(trend_note(60, 60), "Your score is unchanged since your last scan.");
    }

    #[test]
    fn test_share_message() {
        let scan = ScanResult::new("u", sample_items());
        let message = share_message(&scan);
        assert!(message.starts_with("My EcoScan Sustainability Score: 50/100"));
        assert!(message.contains("• Ground Beef (high impact)"));
        assert!(message.contains("• Bananas (low impact)"));
    }

    #[test]
    fn test_barcode_feedback() {
        let text = barcode_feedback("EAN", "3017620422003", "Nutella", "Ferrero", "Spreads", Some(0.95));
        assert_eq!(
            text,
            "Detected EAN: 3017620422003\nProduct: Nutella (Ferrero)\nCategory: Spreads\nConfidence: 95%"
        );
        let bare = barcode_feedback("UNKNOWN", "abc", "product", "", "", None);
        assert_eq!(bare, "Detected UNKNOWN: abc\nProduct: product");
    }
}
