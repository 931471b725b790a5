//! LLM-based script generation.

use super::ScriptDocument;
use crate::config::{Prompts, ScriptSettings};
use crate::error::{FortellError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs,
};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error, info};

/// Generates video scripts through the chat-completion API.
pub struct ScriptGenerator {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    settings: ScriptSettings,
    prompts: Prompts,
}

impl ScriptGenerator {
    pub fn new(settings: ScriptSettings, prompts: Prompts) -> Self {
        Self {
            client: create_client(),
            settings,
            prompts,
        }
    }

    /// Generate a complete video script for a book.
    pub async fn generate(&self, book_name: &str, language: &str) -> Result<ScriptDocument> {
        info!("Generating video script for '{}'", book_name);

        let mut vars = HashMap::new();
        vars.insert("book".to_string(), book_name.to_string());
        vars.insert("language".to_string(), language.to_string());

        let system_message = self
            .prompts
            .render_with_custom(&self.prompts.script.system, &vars);
        let user_message = self
            .prompts
            .render_with_custom(&self.prompts.script.user, &vars);

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_message)
                .build()
                .map_err(|e| FortellError::Script(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_message)
                .build()
                .map_err(|e| FortellError::Script(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.settings.model)
            .messages(messages)
            .temperature(self.settings.temperature)
            .max_tokens(self.settings.max_tokens)
            .top_p(self.settings.top_p)
            .build()
            .map_err(|e| FortellError::Script(e.to_string()))?;

        let content = self.call_with_backoff(request).await?;
        debug!("Script response: {}", &content.chars().take(500).collect::<String>());

        ScriptDocument::from_llm_response(&content)
    }

    /// Call the API with fixed exponential backoff (2^attempt seconds).
    ///
    /// An empty response counts as a failure and is retried like any other.
    async fn call_with_backoff(&self, request: CreateChatCompletionRequest) -> Result<String> {
        let retries = self.settings.max_retries.max(1);

        for attempt in 0..retries {
            let outcome = match self.client.chat().create(request.clone()).await {
                Ok(response) => match response
                    .choices
                    .first()
                    .and_then(|c| c.message.content.clone())
                {
                    Some(content) if !content.trim().is_empty() => return Ok(content),
                    _ => "empty response from API".to_string(),
                },
                Err(e) => e.to_string(),
            };

            error!(
                "API call failed (attempt {}/{}): {}",
                attempt + 1,
                retries,
                outcome
            );

            if attempt + 1 < retries {
                tokio::time::sleep(Duration::from_secs(1u64 << attempt)).await;
            } else {
                return Err(FortellError::Llm(outcome));
            }
        }

        unreachable!("retry loop always returns")
    }
}
