//! スキャン処理の組み立て
//!
//! 品目名 → 採点 → フィードバック → ScanResult の流れと、
//! レシート・バーコード・フォルダ一括の各入口をまとめる。

use crate::analyzer::{analyze_receipt, receipt_items, GeminiClient};
use crate::error::Result;
use crate::product_lookup::{identify_product, BarcodeLookup, LookupSource, OpenFoodFactsClient};
use crate::scanner::{prepare_all, PreparedImage, ReceiptImage};
use crate::store::ScanStore;
use dialoguer::Confirm;
use eco_scan_common::feedback::barcode_feedback;
use eco_scan_common::{format_feedback, KeyValueStore, ScanResult, ScoringEngine, SustainabilityMetrics};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;

/// 1回のスキャンの結果
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub scan: ScanResult,
    pub metrics: SustainabilityMetrics,
    pub store_name: Option<String>,
}

/// 保存方針
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavePolicy {
    Always,
    Never,
    Ask,
}

impl SavePolicy {
    pub fn from_flags(save: bool, no_save: bool) -> Self {
        match (save, no_save) {
            (true, _) => SavePolicy::Always,
            (false, true) => SavePolicy::Never,
            (false, false) => SavePolicy::Ask,
        }
    }
}

/// 品目名からスキャン結果を組み立てる（純粋処理）
///
/// # Arguments
/// * `previous_score` - 前回スキャンのスコア（フィードバックにトレンドを追記）
pub fn assemble_scan(
    engine: &ScoringEngine,
    user_id: &str,
    items: &[String],
    previous_score: Option<u8>,
) -> ScanOutcome {
    let resolutions = engine.resolve_all(items);
    let metrics = eco_scan_common::metrics_from(&resolutions);
    let scanned: Vec<_> = resolutions.iter().map(|r| r.to_scanned_item()).collect();
    let feedback = format_feedback(&metrics, &scanned, previous_score);

    ScanOutcome {
        scan: ScanResult::new(user_id, scanned).with_feedback(feedback),
        metrics,
        store_name: None,
    }
}

fn append_feedback(scan: &mut ScanResult, extra: &str) {
    if extra.trim().is_empty() {
        return;
    }
    let combined = match scan.feedback.take() {
        Some(existing) => format!("{}\n\n{}", existing, extra.trim()),
        None => extra.trim().to_string(),
    };
    scan.feedback = Some(combined);
}

/// AIのアドバイスを追記
pub async fn append_tips(outcome: &mut ScanOutcome, client: &GeminiClient) {
    let names: Vec<String> = outcome.scan.items.iter().map(|i| i.name.clone()).collect();
    let tips = client.sustainability_tips(&names).await;
    append_feedback(&mut outcome.scan, &format!("AI tips\n{}", tips));
}

/// レシート1枚を処理
pub async fn process_receipt(
    engine: &ScoringEngine,
    client: &GeminiClient,
    cache: Option<&mut (dyn KeyValueStore + '_)>,
    image: &ReceiptImage,
    prepared: &PreparedImage,
    user_id: &str,
    previous_score: Option<u8>,
) -> Result<ScanOutcome> {
    let extraction = analyze_receipt(client, prepared, cache).await?;
    let items = receipt_items(&extraction, &image.file_name)?;

    let outcome = assemble_scan(engine, user_id, &items, previous_score);
    Ok(ScanOutcome {
        scan: outcome.scan.with_image_url(image.path.display().to_string()),
        store_name: Some(extraction.store_name),
        ..outcome
    })
}

/// バーコードを処理
#[allow(clippy::too_many_arguments)]
pub async fn process_barcode(
    engine: &ScoringEngine,
    code: &str,
    kind: Option<&str>,
    cache: Option<&mut (dyn KeyValueStore + '_)>,
    off: &OpenFoodFactsClient,
    gemini: Option<&GeminiClient>,
    user_id: &str,
    previous_score: Option<u8>,
) -> (BarcodeLookup, ScanOutcome) {
    let lookup = identify_product(code, kind, cache, off, gemini).await;
    let product = &lookup.product;

    let mut outcome = assemble_scan(
        engine,
        user_id,
        std::slice::from_ref(&product.product_name),
        previous_score,
    );

    let confidence = (lookup.source != LookupSource::Fallback).then_some(product.confidence);
    let header = barcode_feedback(
        lookup.format.as_str(),
        &lookup.code,
        &product.product_name,
        &product.brand,
        &product.likely_category,
        confidence,
    );
    let body = outcome.scan.feedback.take().unwrap_or_default();
    outcome.scan.feedback = Some(format!("{}\n\n{}", header, body));

    (lookup, outcome)
}

/// フォルダ一括処理の1件分
pub struct BatchEntry {
    pub image: ReceiptImage,
    pub result: Result<ScanOutcome>,
}

/// 複数のレシートを処理（画像準備は並列、API呼び出しは順次）
pub async fn run_batch(
    engine: &ScoringEngine,
    client: &GeminiClient,
    mut cache: Option<&mut (dyn KeyValueStore + '_)>,
    images: &[ReceiptImage],
    max_image_size: u32,
    user_id: &str,
) -> Vec<BatchEntry> {
    let prepared = prepare_all(images, max_image_size);

    let pb = ProgressBar::new(prepared.len() as u64);
    if let Ok(style) =
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {wide_msg}")
    {
        pb.set_style(style.progress_chars("=> "));
    }

    let mut entries = Vec::with_capacity(prepared.len());
    for (image, ready) in prepared {
        pb.set_message(image.file_name.clone());
        let result = match ready {
            Ok(prepared) => {
                process_receipt(
                    engine,
                    client,
                    cache.as_deref_mut(),
                    &image,
                    &prepared,
                    user_id,
                    None,
                )
                .await
            }
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            tracing::warn!(file = %image.file_name, error = %e, "receipt skipped");
        }
        entries.push(BatchEntry { image, result });
        pb.inc(1);
    }
    pb.finish_and_clear();

    entries
}

/// 保存方針に従ってスキャンを保存（保存したらそのID）
pub fn save_with_policy(
    store: &ScanStore,
    scan: &ScanResult,
    policy: SavePolicy,
) -> Result<Option<String>> {
    let save = match policy {
        SavePolicy::Always => true,
        SavePolicy::Never => false,
        SavePolicy::Ask => {
            if !std::io::stdin().is_terminal() {
                tracing::debug!("stdin is not a terminal, not saving");
                false
            } else {
                Confirm::new()
                    .with_prompt("Save this scan to your history?")
                    .default(true)
                    .interact()
                    .unwrap_or(false)
            }
        }
    };

    if !save {
        return Ok(None);
    }
    Ok(Some(store.save(scan)?))
}
