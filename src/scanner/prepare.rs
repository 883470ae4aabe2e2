//! 画像の送信準備（縮小・Base64化・ハッシュ）

use super::ReceiptImage;
use crate::error::{EcoScanError, Result};
use base64::Engine;
use image::{imageops::FilterType, DynamicImage, ImageFormat};
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::io::Cursor;
use std::path::Path;

/// API送信用に準備した画像
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub file_name: String,
    pub mime_type: String,
    /// Base64エンコード済みデータ
    pub data: String,
    /// 元ファイルのSHA-256（キャッシュキー）
    pub hash: String,
}

/// バイト列のSHA-256（16進）
pub fn hash_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// 画像を読み込み、長辺が max_size を超えていれば縮小してJPEG化
pub fn prepare_image(path: &Path, max_size: u32) -> Result<PreparedImage> {
    let bytes = std::fs::read(path)?;
    let hash = hash_bytes(&bytes);
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let format = image::guess_format(&bytes)
        .map_err(|e| EcoScanError::ImageLoad(format!("{}: {}", file_name, e)))?;
    let img = image::load_from_memory_with_format(&bytes, format)
        .map_err(|e| EcoScanError::ImageLoad(format!("{}: {}", file_name, e)))?;

    let (mime_type, payload) = if img.width() > max_size || img.height() > max_size {
        let resized = img.resize(max_size, max_size, FilterType::Triangle);
        tracing::debug!(
            file = %file_name,
            from = %format!("{}x{}", img.width(), img.height()),
            to = %format!("{}x{}", resized.width(), resized.height()),
            "resized receipt image"
        );
        ("image/jpeg".to_string(), encode_jpeg(resized, &file_name)?)
    } else {
        (format.to_mime_type().to_string(), bytes)
    };

    Ok(PreparedImage {
        file_name,
        mime_type,
        data: base64::engine::general_purpose::STANDARD.encode(payload),
        hash,
    })
}

fn encode_jpeg(img: DynamicImage, file_name: &str) -> Result<Vec<u8>> {
    // JPEGはアルファ非対応
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buf = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
        .map_err(|e| EcoScanError::ImageLoad(format!("{}: {}", file_name, e)))?;
    Ok(buf)
}

/// 複数画像を並列に準備（入力順を保持）
pub fn prepare_all(
    images: &[ReceiptImage],
    max_size: u32,
) -> Vec<(ReceiptImage, Result<PreparedImage>)> {
    images
        .par_iter()
        .map(|img| (img.clone(), prepare_image(&img.path, max_size)))
        .collect()
}
