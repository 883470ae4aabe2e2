//! バーコード形式の判定

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

lazy_static! {
    static ref UPC_RE: Regex = Regex::new(r"^\d{12}$").unwrap();
    static ref EAN_RE: Regex = Regex::new(r"^(\d{8}|\d{13})$").unwrap();
    static ref ISBN_RE: Regex = Regex::new(r"^(97[89])?\d{9}[\dX]$").unwrap();
}

/// バーコード形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BarcodeFormat {
    Upc,
    Ean,
    Isbn,
    Jan,
    Unknown,
}

impl BarcodeFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            BarcodeFormat::Upc => "UPC",
            BarcodeFormat::Ean => "EAN",
            BarcodeFormat::Isbn => "ISBN",
            BarcodeFormat::Jan => "JAN",
            BarcodeFormat::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for BarcodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// コード文字列から形式を推定
///
/// 8/13桁はJANと同じ桁数だが、EANとして扱う。
/// 13桁のISBN（978/979始まり）もEANになる。
pub fn infer_format(code: &str) -> BarcodeFormat {
    let code = code.trim();
    if UPC_RE.is_match(code) {
        BarcodeFormat::Upc
    } else if EAN_RE.is_match(code) {
        BarcodeFormat::Ean
    } else if ISBN_RE.is_match(code) {
        BarcodeFormat::Isbn
    } else {
        BarcodeFormat::Unknown
    }
}

/// スキャナーが返す種別名（upc_a, ean13 など）から形式を決める
pub fn format_from_type(kind: &str) -> BarcodeFormat {
    let kind = kind.to_lowercase();
    if kind.starts_with("upc") {
        BarcodeFormat::Upc
    } else if kind.starts_with("ean") {
        BarcodeFormat::Ean
    } else if kind.starts_with("isbn") {
        BarcodeFormat::Isbn
    } else if kind.contains("jan") {
        BarcodeFormat::Jan
    } else {
        BarcodeFormat::Unknown
    }
}

/// 商品を特定できなかったときの名称
pub fn fallback_product_name(format: BarcodeFormat) -> &'static str {
    match format {
        BarcodeFormat::Isbn => "book",
        _ => "product",
    }
}
