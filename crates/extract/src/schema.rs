use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::parser::{ParseError, describe};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    String,
    Number,
    StringArray,
}

impl FieldKind {
    fn json_schema(self) -> Value {
        match self {
            FieldKind::String => json!({ "type": "string" }),
            FieldKind::Number => json!({ "type": "number" }),
            FieldKind::StringArray => json!({ "type": "array", "items": { "type": "string" } }),
        }
    }

    fn expected(self) -> &'static str {
        match self {
            FieldKind::String => "a string",
            FieldKind::Number => "a number",
            FieldKind::StringArray => "an array of strings",
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Number => value.is_number(),
            FieldKind::StringArray => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    pub kind: FieldKind,
    pub description: String,
    pub required: bool,
}

impl SchemaField {
    pub fn required(name: &str, kind: FieldKind, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            description: description.to_string(),
            required: true,
        }
    }

    pub fn optional(name: &str, kind: FieldKind, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }
}

/// Flat object shape the model is asked to produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSchema {
    pub fields: Vec<SchemaField>,
}

impl ObjectSchema {
    pub fn new(fields: Vec<SchemaField>) -> Self {
        Self { fields }
    }

    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.fields {
            let mut property = field.kind.json_schema();
            if let Some(obj) = property.as_object_mut() {
                obj.insert("description".to_string(), json!(field.description));
            }
            properties.insert(field.name.clone(), property);
        }

        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
            "$schema": "http://json-schema.org/draft-07/schema#"
        })
    }

    /// Instructions appended to a prompt so the model answers with a fenced JSON instance.
    pub fn format_instructions(&self) -> String {
        format!(
            r#"You must format your output as a JSON value that adheres to a given "JSON Schema" instance.

"JSON Schema" is a declarative language that allows you to annotate and validate JSON documents.

For example, the example "JSON Schema" instance {{"properties": {{"foo": {{"description": "a list of test words", "type": "array", "items": {{"type": "string"}}}}}}, "required": ["foo"]}}
would match an object with one required property, "foo". The "type" property specifies "foo" must be an "array", and the "description" property semantically describes it as "a list of test words". The items within "foo" must be strings.
Thus, the object {{"foo": ["bar", "baz"]}} is a well-formatted instance of this example "JSON Schema". The object {{"properties": {{"foo": ["bar", "baz"]}}}} is not well-formatted.

Your output will be parsed and type-checked according to the provided schema instance, so make sure all fields in your output match the schema exactly and there are no trailing commas!

Here is the JSON Schema instance your output must adhere to. Include the enclosing markdown codeblock:
```json
{}
```
"#,
            self.to_json_schema()
        )
    }

    /// Field-by-field type check of a decoded object.
    pub fn validate(&self, object: &Map<String, Value>) -> Result<(), ParseError> {
        for field in &self.fields {
            match object.get(&field.name) {
                None | Some(Value::Null) if !field.required => {}
                None => return Err(ParseError::MissingField(field.name.clone())),
                Some(value) if field.kind.matches(value) => {}
                Some(value) => {
                    return Err(ParseError::InvalidField {
                        field: field.name.clone(),
                        expected: field.kind.expected().to_string(),
                        found: describe(value),
                    });
                }
            }
        }
        Ok(())
    }
}

/// A type the structured parser can produce from a validated JSON object.
pub trait StructuredOutput: Sized {
    fn schema() -> ObjectSchema;

    /// Called only after `schema().validate(object)` has passed.
    fn from_object(object: &Map<String, Value>) -> Result<Self, ParseError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonProfile {
    pub name: String,
    pub age: u32,
    pub bio: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
    pub interests: Vec<String>,
}

impl StructuredOutput for PersonProfile {
    fn schema() -> ObjectSchema {
        ObjectSchema::new(vec![
            SchemaField::required("name", FieldKind::String, "his name"),
            SchemaField::required(
                "age",
                FieldKind::Number,
                "his age in valid number format, eg: 30",
            ),
            SchemaField::required("bio", FieldKind::String, "his short bio"),
            SchemaField::optional(
                "education",
                FieldKind::String,
                "the university or school he graduated from",
            ),
            SchemaField::required("interests", FieldKind::StringArray, "his interests"),
        ])
    }

    fn from_object(object: &Map<String, Value>) -> Result<Self, ParseError> {
        let name = string_field(object, "name")?;
        if name.trim().is_empty() {
            return Err(ParseError::InvalidField {
                field: "name".to_string(),
                expected: "a non-empty string".to_string(),
                found: describe(&Value::String(name)),
            });
        }

        Ok(Self {
            name,
            age: age_field(object, "age")?,
            bio: string_field(object, "bio")?,
            education: object
                .get("education")
                .and_then(Value::as_str)
                .map(str::to_string),
            interests: object
                .get("interests")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

fn string_field(object: &Map<String, Value>, field: &str) -> Result<String, ParseError> {
    object
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ParseError::MissingField(field.to_string()))
}

/// Accepts `30` and `30.0`; rejects negatives, fractions and values beyond `u32`.
fn age_field(object: &Map<String, Value>, field: &str) -> Result<u32, ParseError> {
    let value = object
        .get(field)
        .ok_or_else(|| ParseError::MissingField(field.to_string()))?;

    let whole = match value.as_u64() {
        Some(n) => Some(n),
        None => value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u32::MAX as f64)
            .map(|f| f as u64),
    };

    whole
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| ParseError::InvalidField {
            field: field.to_string(),
            expected: "a non-negative whole number".to_string(),
            found: describe(value),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_person_json_schema() {
        let schema = PersonProfile::schema().to_json_schema();

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["additionalProperties"], false);
        assert_eq!(
            schema["required"],
            json!(["name", "age", "bio", "interests"])
        );
        assert_eq!(schema["properties"]["age"]["type"], "number");
        assert_eq!(
            schema["properties"]["age"]["description"],
            "his age in valid number format, eg: 30"
        );
        assert_eq!(schema["properties"]["interests"]["items"]["type"], "string");
        assert_eq!(
            schema["properties"]["education"]["description"],
            "the university or school he graduated from"
        );
    }

    #[test]
    fn test_format_instructions_embed_the_schema_in_a_fence() {
        let schema = PersonProfile::schema();
        let instructions = schema.format_instructions();

        assert!(instructions.contains("```json\n"));
        assert!(instructions.contains(&schema.to_json_schema().to_string()));
        assert!(instructions.contains("his short bio"));
    }

    #[test]
    fn test_validate_reports_the_offending_field() {
        let schema = PersonProfile::schema();

        let missing = object(json!({ "name": "Ada", "bio": "b", "interests": [] }));
        assert_eq!(
            schema.validate(&missing),
            Err(ParseError::MissingField("age".to_string()))
        );

        let wrong = object(json!({ "name": "Ada", "age": "thirty", "bio": "b", "interests": [] }));
        match schema.validate(&wrong) {
            Err(ParseError::InvalidField { field, .. }) => assert_eq!(field, "age"),
            other => panic!("unexpected result: {:?}", other),
        }

        let bad_items = object(json!({ "name": "Ada", "age": 3, "bio": "b", "interests": [1] }));
        assert!(matches!(
            schema.validate(&bad_items),
            Err(ParseError::InvalidField { ref field, .. }) if field == "interests"
        ));
    }

    #[test]
    fn test_optional_education_may_be_null_or_absent() {
        let schema = PersonProfile::schema();
        let null = object(json!({
            "name": "Ada", "age": 36, "bio": "b", "education": null, "interests": ["maths"]
        }));
        assert!(schema.validate(&null).is_ok());

        let profile = PersonProfile::from_object(&null).unwrap();
        assert_eq!(profile.education, None);
        assert_eq!(profile.interests, vec!["maths".to_string()]);
    }

    #[test]
    fn test_age_coercion() {
        let base = |age: Value| {
            object(json!({ "name": "Ada", "age": age, "bio": "b", "interests": [] }))
        };

        assert_eq!(PersonProfile::from_object(&base(json!(30))).unwrap().age, 30);
        assert_eq!(PersonProfile::from_object(&base(json!(30.0))).unwrap().age, 30);
        assert!(PersonProfile::from_object(&base(json!(30.5))).is_err());
        assert!(PersonProfile::from_object(&base(json!(-1))).is_err());
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let blank = object(json!({ "name": "  ", "age": 3, "bio": "b", "interests": [] }));
        assert!(matches!(
            PersonProfile::from_object(&blank),
            Err(ParseError::InvalidField { ref field, .. }) if field == "name"
        ));
    }
}
