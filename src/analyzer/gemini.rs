//! Gemini API連携
//!
//! - extract_receipt: レシート画像 → 品目リスト（画像をinline dataで送信）
//! - identify_barcode: バーコード値 → 商品名（テキストのみ）
//! - sustainability_tips: 品目リスト → アドバイス文（失敗時は固定文）

use crate::config::Config;
use crate::error::{EcoScanError, Result};
use crate::scanner::PreparedImage;
use eco_scan_common::prompts::{build_barcode_prompt, build_feedback_prompt, build_receipt_prompt};
use eco_scan_common::{
    parse_barcode_response, parse_receipt_response, ParseOutcome, ProductIdentification,
    ReceiptExtraction,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// アドバイス生成に失敗したときの文面
pub const TIPS_UNAVAILABLE: &str = "Unable to generate sustainability feedback at this time.";

/// Gemini APIリクエスト
#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

/// Gemini APIレスポンス
#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| EcoScanError::ApiCall(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            model: model.to_string(),
            base_url: GEMINI_API_BASE.to_string(),
        })
    }

    /// 設定から作成（APIキー必須）
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.get_api_key()?,
            &config.model,
            Duration::from_secs(config.timeout_seconds),
        )
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// generateContent 呼び出し（共通処理）
    async fn generate(&self, parts: Vec<Part>, json_mode: bool) -> Result<String> {
        let url = format!("{}/{}:generateContent", self.base_url, self.model);
        let request = GeminiRequest {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                temperature: 0.1,
                response_mime_type: json_mode.then(|| "application/json".to_string()),
            },
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| EcoScanError::ApiCall(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EcoScanError::ApiCall(format!("HTTP {}: {}", status, body)));
        }

        let payload: GeminiResponse = response
            .json()
            .await
            .map_err(|e| EcoScanError::ApiParse(e.to_string()))?;

        let text = payload
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| EcoScanError::ApiParse("Gemini returned no text".into()))?;

        tracing::debug!(model = %self.model, chars = text.len(), "gemini response received");
        Ok(text)
    }

    /// レシート画像から品目を抽出
    pub async fn extract_receipt(&self, image: &PreparedImage) -> Result<ReceiptExtraction> {
        let parts = vec![
            Part::Text {
                text: build_receipt_prompt(),
            },
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type.clone(),
                    data: image.data.clone(),
                },
            },
        ];

        let text = self.generate(parts, true).await?;
        into_api_result(parse_receipt_response(&text))
    }

    /// バーコードから商品を推定
    pub async fn identify_barcode(&self, code: &str, format: &str) -> Result<ProductIdentification> {
        let parts = vec![Part::Text {
            text: build_barcode_prompt(code, format),
        }];

        let text = self.generate(parts, true).await?;
        into_api_result(parse_barcode_response(&text))
    }

    /// 品目リストへのアドバイス（失敗しても固定文を返す）
    pub async fn sustainability_tips(&self, items: &[String]) -> String {
        let parts = vec![Part::Text {
            text: build_feedback_prompt(items),
        }];

        match self.generate(parts, false).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "sustainability tips unavailable");
                TIPS_UNAVAILABLE.to_string()
            }
        }
    }
}

fn into_api_result<T>(outcome: ParseOutcome<T>) -> Result<T> {
    match outcome {
        ParseOutcome::Parsed(value) => Ok(value),
        ParseOutcome::Invalid { raw, reason } => {
            tracing::debug!(%raw, "unparseable gemini response");
            Err(EcoScanError::ApiParse(format!(
                "{}. Response was: {}",
                reason, raw
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text { text: "hi".into() },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/png".into(),
                            data: "AAAA".into(),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: 0.1,
                response_mime_type: None,
            },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(json["contents"][0]["parts"][1]["inline_data"]["mime_type"], "image/png");
        assert!(json["generationConfig"].get("responseMimeType").is_none());
    }

    #[test]
    fn test_response_deserialization() {
        let payload = r#"{"candidates":[{"content":{"parts":[{"text":"{\"items\":[]}"}]}}]}"#;
        let response: GeminiResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(response.candidates[0].content.parts[0].text, "{\"items\":[]}");

        let empty: GeminiResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.candidates.is_empty());
    }

    #[test]
    fn test_into_api_result() {
        let invalid: ParseOutcome<u8> = ParseOutcome::Invalid {
            raw: "nope".into(),
            reason: "no JSON found".into(),
        };
        match into_api_result(invalid) {
            Err(EcoScanError::ApiParse(msg)) => assert!(msg.contains("Response was: nope")),
            other => panic!("Expected ApiParse, got {:?}", other.is_ok()),
        }
        assert_eq!(into_api_result(ParseOutcome::Parsed(3u8)).unwrap(), 3);
    }

    #[tokio::test]
    async fn test_tips_fall_back_on_failure() {
        // 接続できないアドレス
        let client = GeminiClient::new("k".into(), "m", Duration::from_millis(200))
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        let tips = client.sustainability_tips(&["Beef".into()]).await;
        assert_eq!(tips, TIPS_UNAVAILABLE);
    }
}
