use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use extract::CharacterGenerator;
use index::{MemoryVectorStore, Retriever};
use ingest::{Chunker, ChunkerConfig, DocumentRecord};
use llm::{ChatModel, CompletionModel, Embedder};
use query::RagChain;

use crate::test_set::{QAPair, check_profile, evaluate};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub passed: bool,
    pub score: f64,
    pub latency_ms: f64,
    pub output: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub results: Vec<ScenarioResult>,
    pub passed: usize,
    pub total: usize,
    pub avg_latency_ms: f64,
    pub p50_latency_ms: f64,
    pub p95_latency_ms: f64,
}

impl ScenarioReport {
    pub fn from_results(results: Vec<ScenarioResult>) -> Self {
        let mut latencies: Vec<f64> = results.iter().map(|r| r.latency_ms).collect();
        latencies.sort_by(f64::total_cmp);

        let avg_latency_ms = if latencies.is_empty() {
            0.0
        } else {
            latencies.iter().sum::<f64>() / latencies.len() as f64
        };

        Self {
            passed: results.iter().filter(|r| r.passed).count(),
            total: results.len(),
            avg_latency_ms,
            p50_latency_ms: percentile(&latencies, 50),
            p95_latency_ms: percentile(&latencies, 95),
            results,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.passed == self.total
    }
}

fn percentile(sorted_data: &[f64], p: usize) -> f64 {
    if sorted_data.is_empty() {
        return 0.0;
    }
    let index = (p as f64 / 100.0 * sorted_data.len() as f64) as usize;
    sorted_data[index.min(sorted_data.len() - 1)]
}

/// Runs the end-to-end checks against whatever models it is given.
pub struct ScenarioRunner {
    completion: Arc<dyn CompletionModel>,
    chat: Arc<dyn ChatModel>,
    embedder: Arc<dyn Embedder>,
}

impl ScenarioRunner {
    pub fn new(
        completion: Arc<dyn CompletionModel>,
        chat: Arc<dyn ChatModel>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            completion,
            chat,
            embedder,
        }
    }

    pub async fn run_character(&self, description: &str) -> ScenarioResult {
        let generator = CharacterGenerator::new(self.completion.clone());
        let start = Instant::now();
        let outcome = generator.generate(description).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        match outcome {
            Ok(generation) => {
                let problems = check_profile(&generation.profile);
                for problem in &problems {
                    warn!(problem = %problem, "Character scenario check failed");
                }
                ScenarioResult {
                    name: "character".to_string(),
                    passed: problems.is_empty(),
                    score: if problems.is_empty() { 1.0 } else { 0.0 },
                    latency_ms,
                    output: generation.raw,
                }
            }
            Err(err) => failed("character", latency_ms, &err),
        }
    }

    /// Indexes `document` as a single source, then asks each question of the test set.
    pub async fn run_qa(&self, document: &str, test_set: &[QAPair]) -> Result<Vec<ScenarioResult>> {
        let chunker = Chunker::new(ChunkerConfig::default())?;
        let record = DocumentRecord::new(document.to_string(), "scenario".to_string());
        let store = MemoryVectorStore::from_chunks(
            chunker.split_document(&record),
            self.embedder.as_ref(),
        )
        .await?;

        let retriever = Retriever::new(Arc::new(store), self.embedder.clone());
        let chain = RagChain::new(retriever, self.chat.clone());

        let mut results = Vec::with_capacity(test_set.len());
        for qa in test_set {
            let start = Instant::now();
            let outcome = chain.run_turn(&qa.question).await;
            let latency_ms = start.elapsed().as_millis() as f64;

            let result = match outcome {
                Ok(turn) => {
                    let answer = turn.reply.to_string();
                    let score = evaluate(&answer, &qa.expected);
                    ScenarioResult {
                        name: qa.question.clone(),
                        passed: score >= 1.0,
                        score,
                        latency_ms,
                        output: answer,
                    }
                }
                Err(err) => failed(&qa.question, latency_ms, &err),
            };

            info!(scenario = %result.name, passed = result.passed, "Scenario finished");
            results.push(result);
        }

        Ok(results)
    }
}

fn failed(name: &str, latency_ms: f64, err: &anyhow::Error) -> ScenarioResult {
    warn!(scenario = %name, error = %format!("{:#}", err), "Scenario errored");
    ScenarioResult {
        name: name.to_string(),
        passed: false,
        score: 0.0,
        latency_ms,
        output: format!("{:#}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_set::{SKY_DOCUMENT, get_test_set};
    use async_trait::async_trait;
    use llm::{ChatMessage, ChatReply, LlmError};
    use query::FALLBACK_ANSWER;

    struct ConstantEmbedder;

    #[async_trait]
    impl Embedder for ConstantEmbedder {
        async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        async fn embed_query(&self, _text: &str) -> Result<Vec<f32>, LlmError> {
            Ok(vec![1.0, 0.0])
        }

        fn model_name(&self) -> &str {
            "constant"
        }
    }

    /// Answers from the context when the question mentions the sky.
    struct GroundedChat;

    #[async_trait]
    impl ChatModel for GroundedChat {
        async fn chat(&self, messages: &[ChatMessage]) -> Result<ChatReply, LlmError> {
            let user = &messages[1].content;
            if user.contains("sky?") {
                Ok(ChatReply::from_text("The sky is blue."))
            } else {
                Ok(ChatReply::from_text(FALLBACK_ANSWER))
            }
        }

        fn model_name(&self) -> &str {
            "grounded"
        }
    }

    struct CannedCompletion(&'static str);

    #[async_trait]
    impl CompletionModel for CannedCompletion {
        async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
            Ok(self.0.to_string())
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    fn runner(completion: &'static str) -> ScenarioRunner {
        ScenarioRunner::new(
            Arc::new(CannedCompletion(completion)),
            Arc::new(GroundedChat),
            Arc::new(ConstantEmbedder),
        )
    }

    #[tokio::test]
    async fn test_qa_scenarios_pass_with_grounded_model() {
        let results = runner("").run_qa(SKY_DOCUMENT, &get_test_set()).await.unwrap();
        let report = ScenarioReport::from_results(results);

        assert_eq!(report.total, 2);
        assert!(report.all_passed());
    }

    #[tokio::test]
    async fn test_character_scenario() {
        let good = runner(
            r#"{"name": "Kelvin", "age": 32, "bio": "Engineer.", "interests": ["hiking"]}"#,
        )
        .run_character("A software engineer in Canada, born in Hong Kong.")
        .await;
        assert!(good.passed);

        let bad = runner("not json").run_character("anyone").await;
        assert!(!bad.passed);
        assert!(bad.output.contains("not valid JSON"));
    }

    #[test]
    fn test_report_percentiles() {
        let results = [10.0, 30.0, 20.0]
            .iter()
            .map(|latency| ScenarioResult {
                name: "q".to_string(),
                passed: true,
                score: 1.0,
                latency_ms: *latency,
                output: String::new(),
            })
            .collect();
        let report = ScenarioReport::from_results(results);

        assert_eq!(report.avg_latency_ms, 20.0);
        assert_eq!(report.p50_latency_ms, 20.0);
        assert_eq!(report.p95_latency_ms, 30.0);
        assert!(ScenarioReport::from_results(Vec::new()).all_passed());
    }
}
