mod cache;
mod gemini;

pub use cache::{barcode_key, receipt_key, CacheEntry, JsonFileStore};
pub use gemini::{GeminiClient, GEMINI_API_BASE, TIPS_UNAVAILABLE};

use crate::error::{EcoScanError, Result};
use crate::scanner::PreparedImage;
use eco_scan_common::{get_json, parse_receipt_items, set_json, KeyValueStore, ReceiptExtraction};

/// レシートを解析（キャッシュにあればAPIを呼ばない）
pub async fn analyze_receipt(
    client: &GeminiClient,
    image: &PreparedImage,
    cache: Option<&mut (dyn KeyValueStore + '_)>,
) -> Result<ReceiptExtraction> {
    let key = receipt_key(&image.hash);

    let cache = match cache {
        Some(store) => {
            if let Some(hit) = get_json::<_, ReceiptExtraction>(&*store, &key) {
                tracing::debug!(file = %image.file_name, "receipt cache hit");
                return Ok(hit);
            }
            Some(store)
        }
        None => None,
    };

    let extraction = client.extract_receipt(image).await?;
    tracing::info!(
        file = %image.file_name,
        store = %extraction.store_name,
        items = extraction.items.len(),
        "receipt analyzed"
    );

    if let Some(store) = cache {
        if let Err(e) = set_json(store, &key, &extraction) {
            tracing::warn!(error = %e, "failed to write receipt cache");
        }
    }

    Ok(extraction)
}

/// 抽出結果から品目名を決定
///
/// AIが品目を返さなければ生テキストを行単位で解析し、それでも空なら NoItemsFound
pub fn receipt_items(extraction: &ReceiptExtraction, source: &str) -> Result<Vec<String>> {
    if !extraction.items.is_empty() {
        return Ok(extraction.items.clone());
    }

    let fallback = parse_receipt_items(&extraction.extracted_text);
    if fallback.is_empty() {
        return Err(EcoScanError::NoItemsFound(source.to_string()));
    }
    tracing::debug!(count = fallback.len(), "using line-based receipt fallback");
    Ok(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use eco_scan_common::MemoryStore;
    use std::time::Duration;

    fn extraction(items: &[&str], text: &str) -> ReceiptExtraction {
        ReceiptExtraction {
            store_name: "Fresh Market".into(),
            items: items.iter().map(|s| s.to_string()).collect(),
            extracted_text: text.into(),
        }
    }

    #[test]
    fn test_receipt_items_prefers_ai_items() {
        let ex = extraction(&["Bananas"], "GRND BEEF 8.99");
        assert_eq!(receipt_items(&ex, "r.jpg").unwrap(), vec!["Bananas"]);
    }

    #[test]
    fn test_receipt_items_line_fallback() {
        let ex = extraction(&[], "GRND BEEF 8.99\nTOTAL 8.99");
        assert_eq!(receipt_items(&ex, "r.jpg").unwrap(), vec!["GRND BEEF"]);
    }

    #[test]
    fn test_receipt_items_none_found() {
        let ex = extraction(&[], "TOTAL 0.00");
        assert!(matches!(
            receipt_items(&ex, "r.jpg"),
            Err(EcoScanError::NoItemsFound(_))
        ));
    }

    #[tokio::test]
    async fn test_analyze_receipt_uses_cache() {
        let image = PreparedImage {
            file_name: "r.jpg".into(),
            mime_type: "image/jpeg".into(),
            data: String::new(),
            hash: "deadbeef".into(),
        };
        let mut store = MemoryStore::new();
        let cached = extraction(&["Oat Milk"], "OAT MILK 3.49");
        set_json(&mut store, &receipt_key("deadbeef"), &cached).unwrap();

        // キャッシュヒットなのでAPIには到達しない
        let client = GeminiClient::new("k".into(), "m", Duration::from_millis(100))
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        let result = analyze_receipt(&client, &image, Some(&mut store)).await.unwrap();
        assert_eq!(result, cached);
    }
}
