use anyhow::{Result, bail};
use std::collections::HashMap;

pub const CHARACTER_TEMPLATE: &str =
    "Generate information about a person\n{description}\n{format_instructions}";

/// A prompt with `{name}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
    variables: Vec<String>,
}

impl PromptTemplate {
    pub fn from_template(template: &str) -> Self {
        Self {
            template: template.to_string(),
            variables: placeholders(template),
        }
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Substitutes every placeholder in one pass, so values containing braces are left alone.
    pub fn format(&self, values: &HashMap<&str, String>) -> Result<String> {
        let missing: Vec<&str> = self
            .variables
            .iter()
            .map(String::as_str)
            .filter(|name| !values.contains_key(name))
            .collect();
        if !missing.is_empty() {
            bail!("Missing value for prompt variable(s): {}", missing.join(", "));
        }

        let mut output = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();
        while let Some((before, name, after)) = next_placeholder(rest) {
            output.push_str(before);
            match values.get(name) {
                Some(value) => output.push_str(value),
                None => {
                    output.push('{');
                    output.push_str(name);
                    output.push('}');
                }
            }
            rest = after;
        }
        output.push_str(rest);

        Ok(output)
    }
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Splits off the first `{identifier}`; other braces are literal text.
fn next_placeholder(text: &str) -> Option<(&str, &str, &str)> {
    let mut search = 0;
    while let Some(open) = text[search..].find('{').map(|i| search + i) {
        let Some(close) = text[open + 1..].find('}').map(|i| open + 1 + i) else {
            return None;
        };
        let name = &text[open + 1..close];
        if is_identifier(name) {
            return Some((&text[..open], name, &text[close + 1..]));
        }
        search = open + 1;
    }
    None
}

fn placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut rest = template;
    while let Some((_, name, after)) = next_placeholder(rest) {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
        rest = after;
    }
    names
}
