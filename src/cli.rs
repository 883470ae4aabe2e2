use crate::export::ExportFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "eco-scan")]
#[command(version, about = "Score grocery receipts and barcodes for sustainability", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力（RUST_LOG が優先）
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 商品テーブルJSON（組み込みテーブルを置き換え）
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// カスタムエイリアスJSON（プリセットに追加）
    #[arg(long, global = true)]
    pub aliases: Option<PathBuf>,

    /// ユーザーID（省略時は設定ファイルの user_id）
    #[arg(short, long, global = true)]
    pub user: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// レシート画像を解析して採点
    Scan {
        /// レシート画像のパス
        #[arg(required = true)]
        image: PathBuf,

        /// 確認なしで履歴に保存
        #[arg(long)]
        save: bool,

        /// 保存しない
        #[arg(long, conflicts_with = "save")]
        no_save: bool,

        /// AIによるアドバイスを追記
        #[arg(long)]
        tips: bool,

        /// キャッシュを使わない
        #[arg(long)]
        no_cache: bool,

        /// 結果をJSONで出力
        #[arg(long)]
        json: bool,
    },

    /// フォルダ内のレシートを一括処理
    Batch {
        /// レシート画像フォルダ
        #[arg(required = true)]
        folder: PathBuf,

        /// サブフォルダも再帰的にスキャン
        #[arg(short = 'r', long)]
        recursive: bool,

        /// 結果を履歴に保存
        #[arg(long)]
        save: bool,

        /// キャッシュを使わない
        #[arg(long)]
        no_cache: bool,

        /// 結果JSONの出力先
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// バーコードから商品を特定して採点
    Barcode {
        /// バーコード値
        #[arg(required = true)]
        code: String,

        /// スキャナーの種別名（upc_a, ean13 など）
        #[arg(long = "type")]
        kind: Option<String>,

        /// 確認なしで履歴に保存
        #[arg(long)]
        save: bool,

        /// 保存しない
        #[arg(long, conflicts_with = "save")]
        no_save: bool,

        /// AIによるアドバイスを追記
        #[arg(long)]
        tips: bool,

        /// キャッシュを使わない
        #[arg(long)]
        no_cache: bool,
    },

    /// 品目名を直接採点（オフライン）
    Score {
        /// 品目名
        #[arg(required = true)]
        items: Vec<String>,

        /// テーブルに一致した品目のみで採点
        #[arg(long)]
        table_only: bool,

        /// 結果をJSONで出力
        #[arg(long)]
        json: bool,
    },

    /// スキャン履歴を表示
    History {
        /// 表示件数
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// 指定したスキャンの詳細を表示
        #[arg(long)]
        id: Option<String>,

        /// 共有用メッセージを表示（--id と併用、省略時は最新）
        #[arg(long)]
        share: bool,

        /// 結果をJSONで出力
        #[arg(long)]
        json: bool,
    },

    /// スキャン履歴をエクスポート
    Export {
        /// 出力ファイル/ディレクトリ
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 出力形式 (excel/json/both)
        #[arg(short, long, default_value = "excel")]
        format: ExportFormat,

        /// ファイル名（拡張子なし）
        #[arg(short, long, default_value = "eco-scan-history")]
        title: String,
    },

    /// 設定を表示/編集
    Config {
        /// APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// 既定のユーザーIDを設定
        #[arg(long)]
        set_user: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },

    /// キャッシュ管理
    Cache {
        /// キャッシュを削除
        #[arg(long)]
        clear: bool,

        /// キャッシュ情報を表示
        #[arg(long)]
        info: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_score() {
        let cli = Cli::parse_from(["eco-scan", "score", "Beef", "Oat Milk", "--table-only", "-v"]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Score { items, table_only, json } => {
                assert_eq!(items, vec!["Beef", "Oat Milk"]);
                assert!(table_only);
                assert!(!json);
            }
            _ => panic!("Expected score"),
        }
    }

    #[test]
    fn test_parse_barcode_type() {
        let cli = Cli::parse_from(["eco-scan", "--user", "alice", "barcode", "3017620422003", "--type", "ean13"]);
        assert_eq!(cli.user.as_deref(), Some("alice"));
        match cli.command {
            Commands::Barcode { code, kind, .. } => {
                assert_eq!(code, "3017620422003");
                assert_eq!(kind.as_deref(), Some("ean13"));
            }
            _ => panic!("Expected barcode"),
        }
    }

    #[test]
    fn test_save_flags_conflict() {
        let result = Cli::try_parse_from(["eco-scan", "scan", "r.jpg", "--save", "--no-save"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_export_format() {
        let cli = Cli::parse_from(["eco-scan", "export", "-f", "json"]);
        match cli.command {
            Commands::Export { format, title, .. } => {
                assert_eq!(format, ExportFormat::Json);
                assert_eq!(title, "eco-scan-history");
            }
            _ => panic!("Expected export"),
        }
    }
}
