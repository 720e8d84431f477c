pub mod answer;
pub mod app;
pub mod cli;
pub mod dataset;
pub mod evaluate;
pub mod openai;
pub mod options;
pub mod prompts;

pub mod test_utils;

/// Base URL of the local OpenAI-compatible server hosting the model
/// (e.g. `llama-server -m Qwen3-14B-Q4_K_M.gguf -c 6144 -ngl -1`).
pub const API_BASE: &str = "http://localhost:8080/v1";

/// Model identifier the server exposes for the loaded GGUF file.
pub const MODEL_NAME: &str = "Qwen3-14B-Q4_K_M.gguf";

pub const MAX_TOKENS: u32 = 6144;
pub const TEMPERATURE: f32 = 0.2;
pub const TOP_P: f32 = 0.95;

/// Number of leading rows answered with the fallback value instead of
/// being sent to the model. Used to resume an interrupted run by hand.
pub const SKIP_COUNT: usize = 0;

/// Answer recorded when the model output has no recognisable answer.
pub const FALLBACK_ANSWER: i64 = 0;

/// Sampling parameters sent with every chat completion request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            top_p: TOP_P,
        }
    }
}

/// Process-wide settings for an evaluation run. All values are compiled in;
/// `Default` gives the production configuration.
#[derive(Debug, Clone)]
pub struct EvalConfig {
    pub api_base: String,
    pub model: String,
    pub params: GenerationParams,
    pub skip_count: usize,
    pub fallback_value: i64,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            api_base: API_BASE.to_string(),
            model: MODEL_NAME.to_string(),
            params: GenerationParams::default(),
            skip_count: SKIP_COUNT,
            fallback_value: FALLBACK_ANSWER,
        }
    }
}
