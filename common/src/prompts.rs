//! プロンプト生成モジュール
//!
//! - build_receipt_prompt: レシート画像からの品目抽出
//! - build_barcode_prompt: バーコードからの商品特定
//! - build_feedback_prompt: 品目リストへのアドバイス生成

/// レシート解析用プロンプト
pub fn build_receipt_prompt() -> String {
    r#"Analyze this receipt image and extract product information. Please:

1. First, read all the text you can see in the receipt image
2. Then extract product information in this JSON format:
{
  "storeName": "Name of the store (if visible)",
  "items": ["Product 1", "Product 2", "Product 3"],
  "extractedText": "All text you can read from the receipt"
}

Rules for extraction:
- Extract ONLY actual product/item names that were purchased
- Clean up abbreviated names (e.g., "GRND BEEF 30% 2LB" → "Ground Beef")
- Ignore prices, totals, taxes, dates, receipt numbers, store addresses
- Focus on food, beverages, household goods, personal care, clothing, electronics
- Return clear, readable product names
- Include the raw text you extracted in "extractedText"
- If no clear products found, return: {"storeName": "", "items": [], "extractedText": ""}"#
        .to_string()
}

/// バーコード特定用プロンプト
///
/// # Arguments
/// * `code` - バーコード値
/// * `format` - 形式名（UPC, EAN など）
pub fn build_barcode_prompt(code: &str, format: &str) -> String {
    format!(
        r#"You are a product identification assistant. Given a barcode value and format, infer the most likely retail product name.
Return ONLY valid JSON with fields: {{"productName": string, "brand": string, "likelyCategory": string, "confidence": number}}
If unknown, set productName to "Unknown Product", brand to "", likelyCategory to "", confidence to 0.

Input:
- Barcode: {code}
- Format: {format}

Rules:
- Prefer globally known brands/products associated with the barcode.
- Do not include marketing fluff, only the most likely canonical product name.
- confidence is 0-1."#
    )
}

/// アドバイス生成用プロンプト
///
/// 空白のみの品目は除外し、何も残らなければ "Unknown product" とする
pub fn build_feedback_prompt(items: &[String]) -> String {
    let names: Vec<&str> = items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    let list = if names.is_empty() {
        "Unknown product".to_string()
    } else {
        names.join(", ")
    };

    format!(
        r#"Analyze these grocery items for sustainability and provide eco-friendly alternatives:

Items: {list}

Please provide:
1. A brief sustainability assessment
2. Specific eco-friendly alternatives for high-impact items
3. General tips for more sustainable shopping

Keep the response concise and actionable."#
    )
}
