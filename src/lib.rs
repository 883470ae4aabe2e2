//! EcoScan CLI
//!
//! レシート画像・バーコードから品目を特定し、サステナビリティを採点する。
//! 採点ロジックは `eco_scan_common`、ここではI/O（API・画像・履歴・エクスポート）を扱う。

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod product_lookup;
pub mod scanner;
pub mod store;
