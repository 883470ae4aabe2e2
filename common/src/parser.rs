//! APIレスポンスパーサー
//!
//! Gemini などのレスポンスからJSONを抽出し、型付きの結果に変換する。
//! フィールドへのアクセスは必ず型を確認してから行い、パースできなかった
//! 場合は生テキストを保持した `ParseOutcome::Invalid` を返す。

use crate::error::{Error, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// レシートから抽出する品目数の上限
pub const MAX_RECEIPT_ITEMS: usize = 20;

/// 商品名が得られなかったときの名前
pub const UNKNOWN_PRODUCT: &str = "Unknown Product";

/// パース結果（成功 or 生テキストつき失敗）
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome<T> {
    Parsed(T),
    Invalid { raw: String, reason: String },
}

impl<T> ParseOutcome<T> {
    fn invalid(raw: &str, reason: impl Into<String>) -> Self {
        ParseOutcome::Invalid {
            raw: raw.to_string(),
            reason: reason.into(),
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, ParseOutcome::Parsed(_))
    }

    pub fn ok(self) -> Option<T> {
        match self {
            ParseOutcome::Parsed(value) => Some(value),
            ParseOutcome::Invalid { .. } => None,
        }
    }

    /// 失敗を Error::Parse に変換
    pub fn into_result(self) -> Result<T> {
        match self {
            ParseOutcome::Parsed(value) => Ok(value),
            ParseOutcome::Invalid { raw, reason } => {
                Err(Error::Parse(format!("{} (response was: {})", reason, raw)))
            }
        }
    }
}

/// レシート解析の結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptExtraction {
    pub store_name: String,
    pub items: Vec<String>,
    pub extracted_text: String,
}

/// 商品特定の結果（バーコード）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductIdentification {
    pub product_name: String,
    pub brand: String,
    pub likely_category: String,
    pub confidence: f64,
}

/// APIレスポンスからJSON部分を抽出
///
/// 抽出優先順位:
/// 1. ```json ... ``` または ``` ... ``` ブロック
/// 2. 生の {...} オブジェクト
/// 3. 生の [...] 配列
///
/// # Examples
/// ```
/// use eco_scan_common::extract_json;
///
/// let response = "Sure! {\"items\": []}";
/// assert_eq!(extract_json(response).unwrap(), "{\"items\": []}");
/// ```
pub fn extract_json(response: &str) -> Result<&str> {
    // ```json ... ``` ブロックを探す
    if let Some(start_marker) = response.find("```") {
        let mut start = start_marker + 3;
        if response[start..].starts_with("json") {
            start += 4;
        }
        if let Some(end_offset) = response[start..].find("```") {
            return Ok(response[start..start + end_offset].trim());
        }
    }

    for (open, close) in [('{', '}'), ('[', ']')] {
        if let (Some(start), Some(end)) = (response.find(open), response.rfind(close)) {
            if end > start {
                return Ok(&response[start..=end]);
            }
        }
    }

    Err(Error::Parse("no JSON found in response".into()))
}

fn parse_object(response: &str) -> std::result::Result<serde_json::Map<String, Value>, String> {
    let json_str = extract_json(response).map_err(|e| e.to_string())?;
    match serde_json::from_str::<Value>(json_str) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("expected a JSON object".into()),
        Err(e) => Err(format!("invalid JSON: {}", e)),
    }
}

fn string_field<'a>(map: &'a serde_json::Map<String, Value>, key: &str) -> Option<&'a str> {
    match map.get(key) {
        Some(Value::String(s)) => Some(s.as_str()),
        _ => None,
    }
}

/// レシート解析レスポンスをパース
///
/// - items: 2文字以上の文字列のみ、先頭20件
/// - storeName: 空なら "Unknown Store"
/// - extractedText: なければレスポンス全体
pub fn parse_receipt_response(response: &str) -> ParseOutcome<ReceiptExtraction> {
    let map = match parse_object(response) {
        Ok(map) => map,
        Err(reason) => return ParseOutcome::invalid(response, reason),
    };

    let items: Vec<String> = match map.get("items") {
        Some(Value::Array(values)) => values
            .iter()
            .filter_map(|v| match v {
                Value::String(s) if s.chars().count() > 1 => Some(s.clone()),
                _ => None,
            })
            .take(MAX_RECEIPT_ITEMS)
            .collect(),
        _ => Vec::new(),
    };

    let store_name = string_field(&map, "storeName")
        .filter(|s| !s.is_empty())
        .unwrap_or("Unknown Store")
        .to_string();
    let extracted_text = string_field(&map, "extractedText")
        .unwrap_or(response)
        .to_string();

    ParseOutcome::Parsed(ReceiptExtraction {
        store_name,
        items,
        extracted_text,
    })
}

/// バーコード特定レスポンスをパース
pub fn parse_barcode_response(response: &str) -> ParseOutcome<ProductIdentification> {
    let map = match parse_object(response) {
        Ok(map) => map,
        Err(reason) => return ParseOutcome::invalid(response, reason),
    };

    let confidence = match map.get("confidence") {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        _ => 0.0,
    };

    ParseOutcome::Parsed(ProductIdentification {
        product_name: string_field(&map, "productName")
            .unwrap_or(UNKNOWN_PRODUCT)
            .to_string(),
        brand: string_field(&map, "brand").unwrap_or_default().to_string(),
        likely_category: string_field(&map, "likelyCategory")
            .unwrap_or_default()
            .to_string(),
        confidence,
    })
}

/// Open Food Facts の商品レスポンスをパース
///
/// status == 1 かつ商品名（product_name → generic_name）がある場合のみ Some
pub fn parse_open_food_facts(payload: &Value) -> Option<ProductIdentification> {
    if payload.get("status").and_then(Value::as_i64) != Some(1) {
        return None;
    }
    let product = payload.get("product")?.as_object()?;

    let product_name = string_field(product, "product_name")
        .or_else(|| string_field(product, "generic_name"))
        .unwrap_or_default();
    if product_name.is_empty() {
        return None;
    }

    let likely_category = string_field(product, "categories")
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or_default();

    Some(ProductIdentification {
        product_name: product_name.to_string(),
        brand: string_field(product, "brands").unwrap_or_default().to_string(),
        likely_category: likely_category.to_string(),
        confidence: 0.95,
    })
}

lazy_static! {
    /// 品目ではない行
    static ref SKIP_PATTERNS: Vec<Regex> = [
        r"(?i)total",
        r"(?i)subtotal",
        r"(?i)tax",
        r"(?i)change",
        r"(?i)cash",
        r"(?i)credit",
        r"(?i)debit",
        r"(?i)card",
        r"(?i)payment",
        r"(?i)balance",
        r"(?i)due",
        r"^\s*$",
        r"^\d+/\d+/\d+",
        r"^\d+:\d+",
        r"(?i)thank you",
        r"(?i)receipt",
        r"(?i)store",
        r"(?i)location",
        r"(?i)address",
        r"(?i)phone",
        r"^\d+\.\d{2}$",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect();
    static ref PRICE_RE: Regex = Regex::new(r"\$?\d+\.\d{2}").unwrap();
    static ref QUANTITY_PREFIX_RE: Regex = Regex::new(r"(?i)^\d+\s*[@x]\s*").unwrap();
    static ref TRAILING_NUMBER_RE: Regex = Regex::new(r"\s+\d+$").unwrap();
}

/// レシートの生テキストから品目名を行単位で抽出
///
/// AIが品目を返さなかった場合のフォールバック
pub fn parse_receipt_items(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| !SKIP_PATTERNS.iter().any(|re| re.is_match(line)))
        .map(|line| {
            let name = PRICE_RE.replace_all(line, "");
            let name = QUANTITY_PREFIX_RE.replace(name.trim(), "");
            let name = TRAILING_NUMBER_RE.replace(name.trim(), "");
            name.trim().to_string()
        })
        .filter(|name| !name.is_empty())
        .collect()
}
