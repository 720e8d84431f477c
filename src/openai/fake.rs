use anyhow::Result;
use async_openai::types::{
    ChatChoice, ChatCompletionRequestMessage, ChatCompletionResponseMessage,
    CompletionUsage, CreateChatCompletionResponse, FinishReason, Model, Role,
};
use async_trait::async_trait;
use std::sync::Mutex;

use crate::openai::OpenAIClientTrait;
use crate::GenerationParams;

/// A request received by [`FakeOpenAIClient`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub model_name: String,
    pub messages: Vec<ChatCompletionRequestMessage>,
    pub params: GenerationParams,
}

enum FakeReply {
    Content(Option<String>),
    Error(String),
}

/// A fake implementation of the chat completion client for testing
///
/// Replies are served from a queue in the order they were added. Once the
/// queue is empty every call returns the default response. All requests are
/// recorded for verification.
///
/// # Example
///
/// ```
/// use mcqeval::openai::OpenAIClientTrait;
/// use mcqeval::openai::fake::FakeOpenAIClient;
/// use mcqeval::GenerationParams;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let client = FakeOpenAIClient::new().with_response("ответ: 1");
///
///     let response = client
///         .chat_completion("local".to_string(), vec![], GenerationParams::default())
///         .await?;
///
///     let content = response.choices.first()
///         .and_then(|choice| choice.message.content.as_ref())
///         .map(String::from)
///         .unwrap_or_default();
///
///     assert_eq!(content, "ответ: 1");
///     Ok(())
/// }
/// ```
pub struct FakeOpenAIClient {
    replies: Mutex<Vec<FakeReply>>,
    default_response: String,
    models: Vec<Model>,
    pub requests: Mutex<Vec<RecordedRequest>>,
}

impl Default for FakeOpenAIClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeOpenAIClient {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(vec![]),
            default_response: "Fake default response".to_string(),
            models: vec![],
            requests: Mutex::new(vec![]),
        }
    }

    /// Add a response to be returned by the fake client
    pub fn with_response(self, response: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push(FakeReply::Content(Some(response.to_string())));
        self
    }

    /// Add multiple responses to be returned in sequence
    pub fn with_responses(self, responses: Vec<&str>) -> Self {
        {
            let mut replies = self.replies.lock().unwrap();
            for response in responses {
                replies.push(FakeReply::Content(Some(response.to_string())));
            }
        }
        self
    }

    /// Configure the client to return a response with None content
    pub fn with_none_content_response(self) -> Self {
        self.replies.lock().unwrap().push(FakeReply::Content(None));
        self
    }

    /// Make the next queued call fail the way a dead server would
    pub fn with_error(self, message: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push(FakeReply::Error(message.to_string()));
        self
    }

    /// Response returned once the queue is exhausted
    pub fn with_default_response(mut self, response: &str) -> Self {
        self.default_response = response.to_string();
        self
    }

    pub fn with_models(mut self, models: Vec<Model>) -> Self {
        self.models = models;
        self
    }

    pub fn create_model(id: &str, provider: &str) -> Model {
        Model {
            id: id.to_string(),
            created: 0,
            object: "model".to_string(),
            owned_by: provider.to_string(),
        }
    }
}

#[async_trait]
impl OpenAIClientTrait for FakeOpenAIClient {
    #[allow(deprecated)]
    async fn chat_completion(
        &self,
        model: String,
        messages: Vec<ChatCompletionRequestMessage>,
        params: GenerationParams,
    ) -> Result<CreateChatCompletionResponse, anyhow::Error> {
        self.requests.lock().unwrap().push(RecordedRequest {
            model_name: model.clone(),
            messages,
            params,
        });

        let reply = {
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                FakeReply::Content(Some(self.default_response.clone()))
            } else {
                replies.remove(0)
            }
        };

        let content_option = match reply {
            FakeReply::Content(content) => content,
            FakeReply::Error(message) => return Err(anyhow::anyhow!(message)),
        };

        let message = ChatCompletionResponseMessage {
            role: Role::Assistant,
            content: content_option,
            #[allow(deprecated)]
            function_call: None,
            tool_calls: None,
            #[allow(deprecated)]
            refusal: None,
            audio: None,
        };

        let chat_choice = ChatChoice {
            index: 0,
            message,
            finish_reason: Some(FinishReason::Stop),
            logprobs: None,
        };

        let usage = CompletionUsage {
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 0,
            prompt_tokens_details: None,
            completion_tokens_details: None,
        };

        Ok(CreateChatCompletionResponse {
            id: "fake_id".to_string(),
            object: "chat.completion".to_string(),
            created: 0,
            model,
            system_fingerprint: Some("fake-fingerprint".to_string()),
            service_tier: None,
            choices: vec![chat_choice],
            usage: Some(usage),
        })
    }

    async fn list_models(&self) -> Result<Vec<Model>, anyhow::Error> {
        Ok(self.models.clone())
    }
}
