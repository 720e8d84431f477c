use crate::answer::extract_answer;
use crate::dataset::{Dataset, QuestionRow};
use crate::openai::{response_text, OpenAIClientTrait};
use crate::options::format_options;
use crate::prompts::build_conversation;
use crate::EvalConfig;
use anyhow::Result;
use indicatif::ProgressBar;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// What happened to a single row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSource {
    /// Parsed from the model output.
    Extracted,
    /// The model output had no answer marker.
    Fallback,
    /// The row was before the configured starting row.
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowAnswer {
    pub value: i64,
    pub source: AnswerSource,
}

/// Result of a run. `answers` has one entry per input row, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvalSummary {
    pub answers: Vec<i64>,
    pub evaluated: usize,
    pub skipped: usize,
    pub fallbacks: usize,
}

impl EvalSummary {
    fn record(&mut self, answer: RowAnswer) {
        match answer.source {
            AnswerSource::Extracted => self.evaluated += 1,
            AnswerSource::Fallback => {
                self.evaluated += 1;
                self.fallbacks += 1;
            }
            AnswerSource::Skipped => self.skipped += 1,
        }
        self.answers.push(answer.value);
    }
}

/// Fails unless the server reports `model` among its loaded models.
pub async fn ensure_model_loaded(
    client: &dyn OpenAIClientTrait,
    model: &str,
) -> Result<()> {
    let models = client
        .list_models()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list models: {}", e))?;

    if !models.iter().any(|m| m.id == model) {
        let available: Vec<&str> =
            models.iter().map(|m| m.id.as_str()).collect();
        return Err(anyhow::anyhow!(
            "Model {} is not loaded (available: {})",
            model,
            available.join(", ")
        ));
    }

    info!("Model {} is loaded", model);
    Ok(())
}

/// Asks the model one question and turns its reply into an answer index.
///
/// A reply without an answer marker yields `config.fallback_value`. Client
/// errors are returned with the row id attached.
#[instrument(skip_all, fields(id = %row.id))]
pub async fn evaluate_question(
    client: &dyn OpenAIClientTrait,
    config: &EvalConfig,
    row: &QuestionRow,
    progress: &ProgressBar,
) -> Result<RowAnswer> {
    let options = format_options(&row.options);
    if options == "0. " {
        warn!("Row has no usable options: {:?}", row.options);
    }

    let conversation =
        build_conversation(&row.category, &row.question, &options);

    progress.suspend(|| {
        println!("\n{}", "=".repeat(80));
        println!("Question ID: {}", row.id);
        println!("Category: {}", row.category);
        println!("{}", conversation.user);
    });

    let response = client
        .chat_completion(
            config.model.clone(),
            conversation.to_messages()?,
            config.params,
        )
        .await
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to create chat completion for row {}: {}",
                row.id,
                e
            )
        })?;
    let text = response_text(&response);

    progress.suspend(|| {
        println!("MODEL OUTPUT:");
        println!("{}", text);
    });

    let answer = match extract_answer(&text) {
        Some(value) => RowAnswer {
            value,
            source: AnswerSource::Extracted,
        },
        None => {
            warn!(
                "Could not extract an answer, using {}",
                config.fallback_value
            );
            progress.suspend(|| {
                println!(
                    "Could not extract an answer, using {}",
                    config.fallback_value
                )
            });
            RowAnswer {
                value: config.fallback_value,
                source: AnswerSource::Fallback,
            }
        }
    };

    progress.suspend(|| println!("FINAL ANSWER: {}", answer.value));
    debug!("Answer {} ({:?})", answer.value, answer.source);

    Ok(answer)
}

/// Answers every row in order. The first `config.skip_count` rows get
/// `config.fallback_value` without a model call.
pub async fn evaluate_rows(
    client: &dyn OpenAIClientTrait,
    config: &EvalConfig,
    rows: &[QuestionRow],
    progress: &ProgressBar,
) -> Result<EvalSummary> {
    let start = config.skip_count.min(rows.len());
    let mut summary = EvalSummary::default();

    for _ in 0..start {
        summary.record(RowAnswer {
            value: config.fallback_value,
            source: AnswerSource::Skipped,
        });
    }

    info!("Starting from row {}", start);
    progress.set_length((rows.len() - start) as u64);

    for row in &rows[start..] {
        match evaluate_question(client, config, row, progress).await {
            Ok(answer) => summary.record(answer),
            Err(e) => {
                progress.finish_and_clear();
                return Err(e);
            }
        }
        progress.inc(1);
    }

    progress.finish_and_clear();
    Ok(summary)
}

/// Reads `input`, answers every question and writes the table with an
/// `answer` column to `output`. Nothing is written if any model call fails.
pub async fn evaluate_file(
    client: &dyn OpenAIClientTrait,
    config: &EvalConfig,
    input: &Path,
    output: &Path,
    progress: &ProgressBar,
) -> Result<EvalSummary> {
    info!("Loading data from {}", input.display());
    let dataset = Dataset::read(input).map_err(|e| {
        anyhow::anyhow!("Failed to load {}: {}", input.display(), e)
    })?;

    let summary =
        evaluate_rows(client, config, &dataset.rows(), progress).await?;

    info!("Saving results to {}", output.display());
    dataset
        .write_with_answers(output, &summary.answers)
        .map_err(|e| {
            anyhow::anyhow!("Failed to write {}: {}", output.display(), e)
        })?;

    info!(
        "Evaluated {} rows ({} fallbacks), skipped {}",
        summary.evaluated, summary.fallbacks, summary.skipped
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openai::fake::FakeOpenAIClient;
    use crate::test_utils::init_test_logging;
    use crate::GenerationParams;
    use async_openai::types::{
        ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageContent,
        ChatCompletionRequestUserMessageContent,
    };

    fn row(id: &str, options: &str) -> QuestionRow {
        QuestionRow {
            id: id.to_string(),
            category: "math".to_string(),
            question: "2+2=?".to_string(),
            options: options.to_string(),
        }
    }

    fn test_config() -> EvalConfig {
        EvalConfig {
            model: "test-model".to_string(),
            ..EvalConfig::default()
        }
    }

    #[tokio::test]
    async fn test_extracted_answer() -> Result<()> {
        init_test_logging();
        let client = FakeOpenAIClient::new().with_response("Ответ: 1");

        let answer = evaluate_question(
            &client,
            &test_config(),
            &row("1", "['3','4','5']"),
            &ProgressBar::hidden(),
        )
        .await?;

        assert_eq!(
            answer,
            RowAnswer {
                value: 1,
                source: AnswerSource::Extracted
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_request_carries_prompt_and_params() -> Result<()> {
        init_test_logging();
        let client = FakeOpenAIClient::new();

        evaluate_question(
            &client,
            &test_config(),
            &row("1", "['3','4','5']"),
            &ProgressBar::hidden(),
        )
        .await?;

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model_name, "test-model");
        assert_eq!(requests[0].params, GenerationParams::default());

        match &requests[0].messages[..] {
            [ChatCompletionRequestMessage::System(system), ChatCompletionRequestMessage::User(user)] => {
                match &system.content {
                    ChatCompletionRequestSystemMessageContent::Text(text) => {
                        assert!(text.contains("math"))
                    }
                    other => panic!("unexpected system content: {:?}", other),
                }
                match &user.content {
                    ChatCompletionRequestUserMessageContent::Text(text) => {
                        assert!(text.contains("2+2=?"));
                        assert!(text.contains("0. 3\n1. 4\n2. 5"));
                        assert!(text.contains("ответ: <номер варианта>"));
                    }
                    other => panic!("unexpected user content: {:?}", other),
                }
            }
            other => panic!("unexpected messages: {:?}", other),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_answer_uses_fallback() -> Result<()> {
        init_test_logging();
        let client = FakeOpenAIClient::new()
            .with_response("no idea")
            .with_none_content_response();
        let config = EvalConfig {
            fallback_value: -1,
            ..test_config()
        };

        for _ in 0..2 {
            let answer = evaluate_question(
                &client,
                &config,
                &row("1", "['a']"),
                &ProgressBar::hidden(),
            )
            .await?;
            assert_eq!(
                answer,
                RowAnswer {
                    value: -1,
                    source: AnswerSource::Fallback
                }
            );
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_rows_keep_order_and_count() -> Result<()> {
        init_test_logging();
        let client = FakeOpenAIClient::new().with_responses(vec![
            "ответ: 2",
            "не знаю",
            "ответ: 0",
        ]);
        let rows =
            vec![row("a", "['x']"), row("b", "['y']"), row("c", "['z']")];

        let summary = evaluate_rows(
            &client,
            &test_config(),
            &rows,
            &ProgressBar::hidden(),
        )
        .await?;

        assert_eq!(
            summary,
            EvalSummary {
                answers: vec![2, 0, 0],
                evaluated: 3,
                skipped: 0,
                fallbacks: 1,
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_skipped_rows_are_not_sent() -> Result<()> {
        init_test_logging();
        let client = FakeOpenAIClient::new().with_default_response("ответ: 4");
        let config = EvalConfig {
            skip_count: 2,
            ..test_config()
        };
        let rows =
            vec![row("a", "['x']"), row("b", "['y']"), row("c", "['z']")];

        let summary =
            evaluate_rows(&client, &config, &rows, &ProgressBar::hidden())
                .await?;

        assert_eq!(summary.answers, vec![0, 0, 4]);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.evaluated, 1);
        assert_eq!(client.requests.lock().unwrap().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_skip_count_larger_than_dataset() -> Result<()> {
        init_test_logging();
        let client = FakeOpenAIClient::new();
        let config = EvalConfig {
            skip_count: 10,
            ..test_config()
        };
        let rows = vec![row("a", "['x']"), row("b", "['y']")];

        let summary =
            evaluate_rows(&client, &config, &rows, &ProgressBar::hidden())
                .await?;

        assert_eq!(summary.answers, vec![0, 0]);
        assert!(client.requests.lock().unwrap().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_client_error_stops_the_run() {
        init_test_logging();
        let client = FakeOpenAIClient::new()
            .with_response("ответ: 1")
            .with_error("out of memory");
        let rows =
            vec![row("a", "['x']"), row("b", "['y']"), row("c", "['z']")];

        let err = evaluate_rows(
            &client,
            &test_config(),
            &rows,
            &ProgressBar::hidden(),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("row b"));
        assert!(err.to_string().contains("out of memory"));
        assert_eq!(client.requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_progress_is_cleared_on_failure() {
        init_test_logging();
        let client = FakeOpenAIClient::new().with_error("server gone");
        let progress = ProgressBar::hidden();

        let result = evaluate_rows(
            &client,
            &test_config(),
            &[row("a", "['x']")],
            &progress,
        )
        .await;

        assert!(result.is_err());
        assert!(progress.is_finished());
        assert_eq!(progress.position(), 0);
    }

    #[tokio::test]
    async fn test_ensure_model_loaded() {
        let client = FakeOpenAIClient::new().with_models(vec![
            FakeOpenAIClient::create_model("qwen", "llamacpp"),
        ]);

        assert!(ensure_model_loaded(&client, "qwen").await.is_ok());

        let err = ensure_model_loaded(&client, "llama").await.unwrap_err();
        assert!(err.to_string().contains("llama"));
        assert!(err.to_string().contains("qwen"));
    }
}
