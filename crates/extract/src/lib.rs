pub mod parser;
pub mod prompt;
pub mod schema;

pub use parser::{ParseError, StructuredOutputParser};
pub use prompt::{CHARACTER_TEMPLATE, PromptTemplate};
pub use schema::{FieldKind, ObjectSchema, PersonProfile, SchemaField, StructuredOutput};

use anyhow::{Context, Result};
use llm::CompletionModel;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Everything one generation run produced, in the order it was produced.
#[derive(Debug, Clone, Serialize)]
pub struct Generation {
    pub prompt: String,
    pub raw: String,
    pub profile: PersonProfile,
}

pub struct CharacterGenerator {
    model: Arc<dyn CompletionModel>,
    template: PromptTemplate,
    parser: StructuredOutputParser<PersonProfile>,
}

impl CharacterGenerator {
    pub fn new(model: Arc<dyn CompletionModel>) -> Self {
        Self {
            model,
            template: PromptTemplate::from_template(CHARACTER_TEMPLATE),
            parser: StructuredOutputParser::new(),
        }
    }

    pub fn build_prompt(&self, description: &str) -> Result<String> {
        let values = HashMap::from([
            ("description", description.to_string()),
            ("format_instructions", self.parser.format_instructions()),
        ]);
        self.template.format(&values)
    }

    pub fn parse(&self, raw: &str) -> Result<PersonProfile, ParseError> {
        self.parser.parse(raw)
    }

    /// Prompt, complete and parse. A parse failure is returned as-is, not retried.
    pub async fn generate(&self, description: &str) -> Result<Generation> {
        let prompt = self.build_prompt(description)?;
        debug!(chars = prompt.len(), "Built character prompt");

        let raw = self
            .model
            .complete(&prompt)
            .await
            .context("Completion request failed")?;

        let profile = self
            .parse(&raw)
            .context("Failed to parse model output into a person profile")?;

        info!(model = self.model.model_name(), name = %profile.name, "Generated character");

        Ok(Generation {
            prompt,
            raw,
            profile,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use llm::LlmError;
    use std::sync::Mutex;

    struct ScriptedModel {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionModel for ScriptedModel {
        async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    const DESCRIPTION: &str = "A software engineer in Canada, born in Hong Kong.";

    #[test]
    fn test_prompt_layout() {
        let generator = CharacterGenerator::new(ScriptedModel::new(""));
        let prompt = generator.build_prompt(DESCRIPTION).unwrap();

        let expected_start = format!("Generate information about a person\n{}\n", DESCRIPTION);
        assert!(prompt.starts_with(&expected_start));
        assert!(prompt.ends_with("```\n"));
        assert!(prompt.contains("his age in valid number format, eg: 30"));
    }

    #[tokio::test]
    async fn test_generate_returns_prompt_raw_and_profile() {
        let reply = "```json\n{\"name\": \"Kelvin Chan\", \"age\": 32, \"bio\": \"Backend developer in Toronto.\", \"education\": \"University of Waterloo\", \"interests\": [\"dim sum\", \"hockey\"]}\n```";
        let model = ScriptedModel::new(reply);
        let generator = CharacterGenerator::new(model.clone());

        let generation = generator.generate(DESCRIPTION).await.unwrap();

        assert_eq!(generation.raw, reply);
        assert_eq!(generation.profile.age, 32);
        assert!(!generation.profile.name.is_empty());
        assert!(!generation.profile.interests.is_empty());

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0], generation.prompt);
    }

    #[tokio::test]
    async fn test_generate_surfaces_parse_errors() {
        let generator = CharacterGenerator::new(ScriptedModel::new("{\"name\": \"\"}"));

        let err = generator.generate(DESCRIPTION).await.unwrap_err();
        let parse = err.downcast_ref::<ParseError>().unwrap();
        assert_eq!(*parse, ParseError::MissingField("age".to_string()));
    }
}
