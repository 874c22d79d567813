use regex::{Captures, Regex};
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::LazyLock;
use thiserror::Error;

use crate::schema::{ObjectSchema, StructuredOutput};

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:json)?").expect("Invalid regex"));

static STRING_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)"([^"\\]*(\\.[^"\\]*)*)""#).expect("Invalid regex"));

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("model output is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("expected a JSON object, found {0}")]
    NotAnObject(String),

    #[error("missing required field `{0}`")]
    MissingField(String),

    #[error("field `{field}` should be {expected}, found {found}")]
    InvalidField {
        field: String,
        expected: String,
        found: String,
    },
}

/// Short human description of a JSON value for error messages.
pub fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("the boolean {}", b),
        Value::Number(n) => format!("the number {}", n),
        Value::String(s) => format!("the string {:?}", s),
        Value::Array(items) => format!("an array of {} items", items.len()),
        Value::Object(_) => "an object".to_string(),
    }
}

/// The JSON part of a model reply: the first fenced block if there is one, else the whole text.
pub fn extract_json_block(text: &str) -> &str {
    let trimmed = text.trim();
    if trimmed.contains("```") {
        CODE_FENCE.split(trimmed).nth(1).unwrap_or("").trim()
    } else {
        trimmed
    }
}

/// Escapes raw control characters inside string literals, which models emit in long bios.
pub fn escape_string_literals(json: &str) -> String {
    STRING_LITERAL
        .replace_all(json, |caps: &Captures| {
            let inner = caps[1]
                .replace('\n', "\\n")
                .replace('\r', "\\r")
                .replace('\t', "\\t");
            format!("\"{}\"", inner)
        })
        .into_owned()
}

/// Turns raw model text into a validated `T`.
pub struct StructuredOutputParser<T> {
    schema: ObjectSchema,
    _output: PhantomData<fn() -> T>,
}

impl<T: StructuredOutput> Default for StructuredOutputParser<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: StructuredOutput> StructuredOutputParser<T> {
    pub fn new() -> Self {
        Self {
            schema: T::schema(),
            _output: PhantomData,
        }
    }

    pub fn format_instructions(&self) -> String {
        self.schema.format_instructions()
    }

    pub fn parse(&self, text: &str) -> Result<T, ParseError> {
        let json = escape_string_literals(extract_json_block(text));

        let value: Value =
            serde_json::from_str(&json).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

        let object = value
            .as_object()
            .ok_or_else(|| ParseError::NotAnObject(describe(&value)))?;

        self.schema.validate(object)?;
        T::from_object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PersonProfile;

    fn parser() -> StructuredOutputParser<PersonProfile> {
        StructuredOutputParser::new()
    }

    #[test]
    fn test_parses_fenced_json() {
        let text = "Here you go:\n```json\n{\"name\": \"Wai Lam\", \"age\": 30, \"bio\": \"Builds things.\", \"education\": \"University of Toronto\", \"interests\": [\"hiking\", \"rust\"]}\n```\nEnjoy!";

        let profile = parser().parse(text).unwrap();

        assert_eq!(profile.name, "Wai Lam");
        assert_eq!(profile.age, 30);
        assert_eq!(profile.education.as_deref(), Some("University of Toronto"));
        assert_eq!(profile.interests, vec!["hiking", "rust"]);
    }

    #[test]
    fn test_parses_bare_json_with_float_age() {
        let text = r#"  {"name": "Sam", "age": 41.0, "bio": "Writes code.", "interests": ["chess"]}  "#;
        let profile = parser().parse(text).unwrap();
        assert_eq!(profile.age, 41);
        assert_eq!(profile.education, None);
    }

    #[test]
    fn test_untagged_fence() {
        let text = "```\n{\"name\": \"Sam\", \"age\": 5, \"bio\": \"b\", \"interests\": []}\n```";
        assert_eq!(parser().parse(text).unwrap().name, "Sam");
    }

    #[test]
    fn test_raw_newlines_inside_strings_are_escaped() {
        let text = "{\"name\": \"Sam\", \"age\": 5, \"bio\": \"line one\nline two\", \"interests\": []}";
        let profile = parser().parse(text).unwrap();
        assert_eq!(profile.bio, "line one\nline two");
    }

    #[test]
    fn test_escaped_quotes_survive() {
        let text = r#"{"name": "Sam \"The Man\"", "age": 5, "bio": "b", "interests": []}"#;
        assert_eq!(parser().parse(text).unwrap().name, "Sam \"The Man\"");
    }

    #[test]
    fn test_non_json_is_invalid() {
        let err = parser().parse("I'd rather not say.").unwrap_err();
        assert!(matches!(err, ParseError::InvalidJson(_)));
    }

    #[test]
    fn test_array_is_not_an_object() {
        let err = parser().parse("[1, 2]").unwrap_err();
        assert_eq!(err, ParseError::NotAnObject("an array of 2 items".to_string()));
    }

    #[test]
    fn test_errors_name_the_field() {
        let err = parser()
            .parse(r#"{"name": "Sam", "age": "thirty", "bio": "b", "interests": []}"#)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "field `age` should be a number, found the string \"thirty\""
        );

        let err = parser()
            .parse(r#"{"name": "Sam", "age": 3, "interests": []}"#)
            .unwrap_err();
        assert_eq!(err, ParseError::MissingField("bio".to_string()));
    }
}
