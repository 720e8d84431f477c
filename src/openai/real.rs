use crate::openai::OpenAIClientTrait;
use crate::GenerationParams;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, CreateChatCompletionRequestArgs,
    CreateChatCompletionResponse, Model,
};
use async_openai::Client;
use async_trait::async_trait;

// Client for a local OpenAI-compatible server (llama.cpp, vLLM, ...)
pub struct RealOpenAIClient {
    client: Client<OpenAIConfig>,
}

impl RealOpenAIClient {
    pub fn new(client: Client<OpenAIConfig>) -> Self {
        Self { client }
    }

    /// Local servers ignore the key, but the config still sends one.
    pub fn for_local_server(api_base: &str) -> Self {
        let config = OpenAIConfig::new()
            .with_api_base(api_base)
            .with_api_key("no-key");
        Self::new(Client::with_config(config))
    }
}

#[async_trait]
impl OpenAIClientTrait for RealOpenAIClient {
    #[allow(deprecated)]
    async fn chat_completion(
        &self,
        model: String,
        messages: Vec<ChatCompletionRequestMessage>,
        params: GenerationParams,
    ) -> Result<CreateChatCompletionResponse, anyhow::Error> {
        // llama.cpp reads max_tokens, not max_completion_tokens
        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .max_tokens(params.max_tokens)
            .temperature(params.temperature)
            .top_p(params.top_p)
            .build()?;

        let response = self.client.chat().create(request).await?;

        Ok(response)
    }

    async fn list_models(&self) -> Result<Vec<Model>, anyhow::Error> {
        let response = self.client.models().list().await?;
        Ok(response.data)
    }
}
