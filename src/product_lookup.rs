//! バーコードからの商品特定
//!
//! 照会順: キャッシュ → Open Food Facts → Gemini → 形式ごとの既定名

use crate::analyzer::{barcode_key, GeminiClient};
use crate::error::{EcoScanError, Result};
use eco_scan_common::{
    fallback_product_name, format_from_type, get_json, infer_format, parse_open_food_facts,
    set_json, BarcodeFormat, KeyValueStore, ProductIdentification, UNKNOWN_PRODUCT,
};
use std::time::Duration;

pub const OPEN_FOOD_FACTS_BASE: &str = "https://world.openfoodfacts.org";

/// 商品名の取得元
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupSource {
    Cache,
    OpenFoodFacts,
    Gemini,
    Fallback,
}

impl std::fmt::Display for LookupSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LookupSource::Cache => "cache",
            LookupSource::OpenFoodFacts => "Open Food Facts",
            LookupSource::Gemini => "Gemini",
            LookupSource::Fallback => "fallback",
        };
        f.write_str(s)
    }
}

/// 照会結果
#[derive(Debug, Clone)]
pub struct BarcodeLookup {
    pub code: String,
    pub format: BarcodeFormat,
    pub product: ProductIdentification,
    pub source: LookupSource,
}

pub struct OpenFoodFactsClient {
    client: reqwest::Client,
    base_url: String,
}

impl OpenFoodFactsClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| EcoScanError::ApiCall(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: OPEN_FOOD_FACTS_BASE.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// 商品を照会（見つからない・失敗はすべて None）
    pub async fn lookup(&self, code: &str) -> Option<ProductIdentification> {
        let code = code.trim();
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }

        let url = format!("{}/api/v2/product/{}.json", self.base_url, code);
        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(code, error = %e, "open food facts request failed");
                return None;
            }
        };
        if !response.status().is_success() {
            tracing::debug!(code, status = %response.status(), "open food facts miss");
            return None;
        }

        let payload: serde_json::Value = response.json().await.ok()?;
        parse_open_food_facts(&payload)
    }
}

/// 形式を決定（スキャナー種別が分かればそちらを優先）
pub fn resolve_format(code: &str, kind: Option<&str>) -> BarcodeFormat {
    kind.map(format_from_type)
        .filter(|f| *f != BarcodeFormat::Unknown)
        .unwrap_or_else(|| infer_format(code))
}

/// 既定名による結果
pub fn fallback_identification(format: BarcodeFormat) -> ProductIdentification {
    ProductIdentification {
        product_name: fallback_product_name(format).to_string(),
        ..ProductIdentification::default()
    }
}

/// 商品が実際に特定できた結果か（名前が不明・確信度0はキャッシュしない）
pub fn should_cache(product: &ProductIdentification) -> bool {
    let name = product.product_name.trim();
    !name.is_empty() && name != UNKNOWN_PRODUCT && product.confidence > 0.0
}

/// バーコードから商品を特定
///
/// 特定できた結果のみキャッシュに保存する
pub async fn identify_product(
    code: &str,
    kind: Option<&str>,
    cache: Option<&mut (dyn KeyValueStore + '_)>,
    off: &OpenFoodFactsClient,
    gemini: Option<&GeminiClient>,
) -> BarcodeLookup {
    let code = code.trim().to_string();
    let format = resolve_format(&code, kind);
    let key = barcode_key(&code);

    let cache = match cache {
        Some(store) => {
            if let Some(product) = get_json::<_, ProductIdentification>(&*store, &key) {
                return BarcodeLookup {
                    code,
                    format,
                    product,
                    source: LookupSource::Cache,
                };
            }
            Some(store)
        }
        None => None,
    };

    let mut found = off
        .lookup(&code)
        .await
        .map(|p| (p, LookupSource::OpenFoodFacts));

    if found.is_none() {
        if let Some(client) = gemini {
            match client.identify_barcode(&code, format.as_str()).await {
                Ok(p) if !p.product_name.trim().is_empty() => found = Some((p, LookupSource::Gemini)),
                Ok(_) => {}
                Err(e) => tracing::warn!(code = %code, error = %e, "gemini barcode lookup failed"),
            }
        }
    }

    let (product, source) = match found {
        Some((product, source)) => {
            match cache {
                Some(store) if should_cache(&product) => {
                    if let Err(e) = set_json(store, &key, &product) {
                        tracing::warn!(error = %e, "failed to write barcode cache");
                    }
                }
                Some(_) => tracing::debug!(code = %code, %source, "unidentified product not cached"),
                None => {}
            }
            (product, source)
        }
        None => (fallback_identification(format), LookupSource::Fallback),
    };

    tracing::info!(code = %code, %format, %source, product = %product.product_name, "barcode identified");

    BarcodeLookup {
        code,
        format,
        product,
        source,
    }
}
