//! services/api/src/adapters/diary_llm.rs
//!
//! This module contains the adapter for the diary-writing LLM.
//! It implements the `DiaryGenerationService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImageArgs,
        ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContentPart,
        CreateChatCompletionRequestArgs, CreateChatCompletionResponse, ImageDetail, ImageUrlArgs,
    },
    Client,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use pet_diary_core::ports::{DiaryGenerationService, PortError, PortResult};

const USER_REQUEST_WITH_IMAGE: &str =
    "これは今日のあなたの写真です。写真に写っている様子をよく見て、今日の日記を書いてください。";

const USER_REQUEST_TEXT_ONLY: &str =
    "今日の写真はありません。いつもの一日を思い浮かべて、今日の日記を書いてください。";

/// Identifies the payload's MIME type from its magic bytes, defaulting to
/// PNG for anything unrecognized.
pub fn detect_mime_type(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        "image/gif"
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "image/png"
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `DiaryGenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiDiaryAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiDiaryAdapter {
    /// Creates a new `OpenAiDiaryAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    async fn request_diary(
        &self,
        messages: Vec<ChatCompletionRequestMessage>,
    ) -> PortResult<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.7)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Generation(e.to_string()))?;

        extract_diary_text(response)
    }
}

/// Pulls the generated diary out of the first text content of the response.
/// A missing or blank text is a generation failure, never an empty diary.
fn extract_diary_text(response: CreateChatCompletionResponse) -> PortResult<String> {
    if let Some(choice) = response.choices.into_iter().next() {
        if let Some(content) = choice.message.content {
            let text = content.trim();
            if text.is_empty() {
                Err(PortError::Generation(
                    "diary LLM returned an empty diary".to_string(),
                ))
            } else {
                Ok(text.to_string())
            }
        } else {
            Err(PortError::Generation(
                "diary LLM response contained no text content".to_string(),
            ))
        }
    } else {
        Err(PortError::Generation(
            "diary LLM returned no choices in its response".to_string(),
        ))
    }
}

//=========================================================================================
// `DiaryGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DiaryGenerationService for OpenAiDiaryAdapter {
    /// Generates a diary entry from the persona instruction and the pet's
    /// photo, embedded as a base64 `data:` URL tagged with its MIME type.
    async fn generate_with_image(
        &self,
        prompt: &str,
        image: &[u8],
        mime_type: &str,
    ) -> PortResult<String> {
        let data_url = format!("data:{};base64,{}", mime_type, BASE64.encode(image));

        let user_parts: Vec<ChatCompletionRequestUserMessageContentPart> = vec![
            ChatCompletionRequestMessageContentPartTextArgs::default()
                .text(USER_REQUEST_WITH_IMAGE)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestMessageContentPartImageArgs::default()
                .image_url(
                    ImageUrlArgs::default()
                        .url(data_url)
                        .detail(ImageDetail::Auto)
                        .build()
                        .map_err(|e| PortError::Unexpected(e.to_string()))?,
                )
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_parts)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        self.request_diary(messages).await
    }

    /// Text-only variant for records whose photo cannot be read back.
    async fn generate(&self, prompt: &str) -> PortResult<String> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(USER_REQUEST_TEXT_ONLY)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        self.request_diary(messages).await
    }
}
