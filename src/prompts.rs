use anyhow::Result;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs,
};

pub const SYSTEM_PROMPT_TEMPLATE: &str = "Ты — эксперт в области {category}. \
Твоя задача — выбрать один правильный вариант ответа.";

/// Renders the user message. Values are substituted in a single pass, so
/// braces inside a question or its options are sent verbatim.
fn user_prompt(question: &str, options: &str) -> String {
    format!(
        r####"
Вопрос:

{question}

Варианты ответа:
{options}

Формат ответа (обязательно):
ответ: <номер варианта>

"####
    )
}

/// The system and user messages sent to the model for one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub system: String,
    pub user: String,
}

impl Conversation {
    pub fn to_messages(&self) -> Result<Vec<ChatCompletionRequestMessage>> {
        let system_message = ChatCompletionRequestMessage::System(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.system.as_str())
                .build()
                .map_err(|e| {
                    anyhow::anyhow!("Failed to build system message: {}", e)
                })?,
        );

        let user_message = ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessageArgs::default()
                .content(self.user.as_str())
                .build()
                .map_err(|e| {
                    anyhow::anyhow!("Failed to build user message: {}", e)
                })?,
        );

        Ok(vec![system_message, user_message])
    }
}

/// Builds the conversation for a question. `options` is the numbered block
/// produced by [`crate::options::format_options`].
pub fn build_conversation(
    category: &str,
    question: &str,
    options: &str,
) -> Conversation {
    Conversation {
        system: SYSTEM_PROMPT_TEMPLATE.replace("{category}", category),
        user: user_prompt(question, options),
    }
}
