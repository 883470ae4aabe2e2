//! EcoScan Common Library
//!
//! サステナビリティ採点のコア（商品テーブル・別名・推定・集計・フィードバック）と
//! AIレスポンスのパーサー。I/Oを持たない純粋なロジックのみを置く。

pub mod types;
pub mod error;
pub mod catalog;
pub mod alias;
pub mod categorizer;
pub mod estimator;
pub mod scoring;
pub mod feedback;
pub mod parser;
pub mod prompts;
pub mod barcode;
pub mod kv;

pub use types::{
    AlternativeSuggestion, Category, EnvironmentalProfile, ImpactTier, ItemBreakdown,
    NearbyStore, Packaging, ProductEstimate, ProductRecord, ScanResult, ScannedItem,
    SustainabilityMetrics, TableScore, UserLocation, total_score_of,
};
pub use error::{Error, Result};
pub use catalog::ProductCatalog;
pub use alias::{AliasTable, build_alias_table};
pub use categorizer::CategoryRules;
pub use estimator::Estimator;
pub use scoring::{MatchSource, Resolution, ScoringEngine, metrics_from};
pub use feedback::{format_feedback, rating_label, share_message};
pub use parser::{
    ParseOutcome, ProductIdentification, ReceiptExtraction, UNKNOWN_PRODUCT, extract_json,
    parse_barcode_response, parse_open_food_facts, parse_receipt_items, parse_receipt_response,
};
pub use barcode::{BarcodeFormat, fallback_product_name, format_from_type, infer_format};
pub use kv::{KeyValueStore, MemoryStore, get_json, set_json};
