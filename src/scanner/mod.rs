mod exif;
mod prepare;

pub use prepare::{hash_bytes, prepare_all, prepare_image, PreparedImage};

use crate::error::{EcoScanError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// レシート画像
#[derive(Debug, Clone)]
pub struct ReceiptImage {
    pub path: PathBuf,
    pub file_name: String,
    pub date: Option<String>,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
}

/// 単一ファイルを読み込み対象として確認
pub fn receipt_image(path: &Path) -> Result<ReceiptImage> {
    if !path.is_file() {
        return Err(EcoScanError::FileNotFound(path.display().to_string()));
    }
    Ok(to_receipt_image(path))
}

fn to_receipt_image(path: &Path) -> ReceiptImage {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    ReceiptImage {
        path: path.to_path_buf(),
        file_name,
        date: exif::extract_date(path).ok(),
    }
}

/// フォルダ内のレシート画像を列挙（ファイル名順）
pub fn scan_folder(folder: &Path, recursive: bool) -> Result<Vec<ReceiptImage>> {
    if !folder.is_dir() {
        return Err(EcoScanError::FolderNotFound(folder.display().to_string()));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut images: Vec<ReceiptImage> = WalkDir::new(folder)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .map(|ext| is_image_extension(&ext.to_string_lossy()))
                .unwrap_or(false)
        })
        .map(|e| to_receipt_image(e.path()))
        .collect();

    images.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::debug!(folder = %folder.display(), count = images.len(), "scanned receipt folder");

    Ok(images)
}
