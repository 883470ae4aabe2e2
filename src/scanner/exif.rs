use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// 撮影日時（DateTimeOriginal → DateTime）を取得
pub fn extract_date(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let mut bufreader = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut bufreader)?;

    [exif::Tag::DateTimeOriginal, exif::Tag::DateTime]
        .iter()
        .find_map(|tag| exif.get_field(*tag, exif::In::PRIMARY))
        .map(|field| field.display_value().to_string())
        .ok_or_else(|| "No date found in EXIF".into())
}
