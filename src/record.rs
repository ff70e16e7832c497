//! The persisted analysis of one problem and a typed, forgiving view of it.
//!
//! The model's JSON is stored verbatim. Readers go through [`Analysis`],
//! where every field that may be missing or mistyped falls back to an empty
//! value instead of failing the whole document.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MAX_HINT_LEVEL: u8 = 5;

/// On-disk document: `{"analysis": {...}, "code": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub analysis: Value,
    #[serde(default)]
    pub code: String,
}

impl AnalysisRecord {
    pub fn view(&self) -> Analysis {
        Analysis::deserialize(&self.analysis).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Analysis {
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub summary: Summary,
    #[serde(default, rename = "analysis", deserialize_with = "lenient::or_default")]
    pub deep: DeepAnalysis,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub solution: SolutionMeta,
    #[serde(default, deserialize_with = "lenient::hints")]
    pub hints: BTreeMap<String, String>,
}

impl Analysis {
    pub fn hint(&self, level: u8) -> Option<&str> {
        self.hints.get(&format!("level{level}")).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Summary {
    #[serde(default, deserialize_with = "lenient::text")]
    pub problem_statement: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub input_format: FormatSpec,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub output_format: FormatSpec,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub constraints: Constraints,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub sample_cases: Vec<SampleCase>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FormatSpec {
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Constraints {
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub time_limit: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub memory_limit: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub bounds: Vec<Bound>,
}

/// A variable bound; usually `{variable, range}` or `{variable, condition}`,
/// but any shape is kept.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Bound(pub Value);

impl Bound {
    pub fn render(&self) -> String {
        match &self.0 {
            Value::Object(map) => {
                let field = |name: &str| map.get(name).map(lenient::value_text);
                let variable = field("variable").unwrap_or_default();
                let range = field("range")
                    .or_else(|| field("condition"))
                    .unwrap_or_default();
                format!("- {variable}: {range}")
            }
            other => format!("- {}", lenient::value_text(other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SampleCase {
    #[serde(default, deserialize_with = "lenient::text")]
    pub input: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub output: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DeepAnalysis {
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub key_observation: Option<String>,
    #[serde(default, deserialize_with = "lenient::texts")]
    pub edge_cases: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SolutionMeta {
    #[serde(default, deserialize_with = "lenient::texts")]
    pub key_insights: Vec<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub approach: String,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub time_complexity: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub space_complexity: Option<String>,
}

mod lenient {
    use std::collections::BTreeMap;

    use serde::{de::DeserializeOwned, Deserialize, Deserializer};
    use serde_json::Value;

    /// Strings as-is, other scalars in their JSON form, `null` as empty.
    pub fn value_text(value: &Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    pub fn or_default<'de, D, T>(d: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        let value = Value::deserialize(d)?;
        Ok(T::deserialize(value).unwrap_or_default())
    }

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(value_text(&Value::deserialize(d)?))
    }

    pub fn opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let text = text(d)?;
        Ok((!text.is_empty()).then_some(text))
    }

    /// A list of strings; a lone scalar becomes a one-element list.
    pub fn texts<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => items.iter().map(value_text).collect(),
            Value::Null => vec![],
            other => vec![value_text(&other)],
        })
    }

    /// `{"level1": ..}` as-is; a bare list is numbered from `level1`.
    pub fn hints<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeMap<String, String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), value_text(v))).collect(),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| (format!("level{}", i + 1), value_text(v)))
                .collect(),
            _ => BTreeMap::new(),
        })
    }
}
