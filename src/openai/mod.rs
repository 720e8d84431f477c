pub mod fake;
pub mod real;

use anyhow::Result;
use async_openai::types::{
    ChatCompletionRequestMessage, CreateChatCompletionResponse, Model,
};
use async_trait::async_trait;

use crate::GenerationParams;

/// A trait that abstracts the chat completion backend for testing
///
/// The evaluation loop only ever talks to the model through this trait, so
/// tests can swap in [`fake::FakeOpenAIClient`] for the local server client.
#[async_trait]
pub trait OpenAIClientTrait: Send + Sync {
    /// Creates a chat completion by sending messages to the language model
    ///
    /// # Arguments
    /// * `model` - The model identifier exposed by the server
    /// * `messages` - The conversation, system message first
    /// * `params` - Sampling parameters for this request
    async fn chat_completion(
        &self,
        model: String,
        messages: Vec<ChatCompletionRequestMessage>,
        params: GenerationParams,
    ) -> Result<CreateChatCompletionResponse, anyhow::Error>;

    /// Retrieves a list of models the server has loaded
    async fn list_models(&self) -> Result<Vec<Model>, anyhow::Error>;
}

/// Returns the text of the first choice, or an empty string when the
/// response carries no content.
pub fn response_text(response: &CreateChatCompletionResponse) -> String {
    response
        .choices
        .first()
        .and_then(|choice| choice.message.content.as_ref())
        .map(String::from)
        .unwrap_or_default()
}
