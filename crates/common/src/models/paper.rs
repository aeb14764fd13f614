//! Paper records and the request shapes that create or edit them

use serde::ser::SerializeMap;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use validator::Validate;

/// Placeholder for author, PI and year when nothing is known
pub const UNKNOWN: &str = "Unknown";

/// Keys with a typed field on [`Paper`], in the order new papers are written
const KNOWN_FIELDS: [&str; 7] = ["id", "title", "author", "pi", "year", "url", "authors"];

fn unknown() -> String {
    UNKNOWN.to_string()
}

/// A paper in the library.
///
/// Serialized as a flat JSON object. Keys come back out in the order they
/// were read, so free-form fields keep their place between the known ones.
#[derive(Debug, Clone, PartialEq)]
pub struct Paper {
    /// Unique identifier (DOI or a generated `NNNN` id)
    pub id: String,

    /// Display title; falls back to the id when absent
    pub title: String,

    /// First author
    pub author: String,

    /// Principal investigator
    pub pi: String,

    /// Publication year, kept as text
    pub year: String,

    /// Link to the paper
    pub url: String,

    /// Full author list, when known
    pub authors: Vec<String>,

    /// Free-form fields carried through untouched
    pub extra: Map<String, Value>,

    /// Key order of the object this paper was read from
    pub(crate) key_order: Vec<String>,
}

impl Paper {
    /// A paper that only has an id, as created for dangling citations
    pub fn placeholder(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            title: id.clone(),
            id,
            author: unknown(),
            pi: unknown(),
            year: unknown(),
            url: String::new(),
            authors: Vec::new(),
            extra: Map::new(),
            key_order: Vec::new(),
        }
    }

    /// Decade the paper was published in, if the year is numeric
    pub fn decade(&self) -> Option<i32> {
        decade_of(&self.year)
    }

    /// Build from a raw JSON object, applying the load-time defaults
    fn from_fields(mut fields: Map<String, Value>) -> Result<Self, String> {
        let key_order = fields.keys().cloned().collect();

        let id = match fields.shift_remove("id") {
            Some(Value::String(id)) => id,
            Some(Value::Number(n)) => n.to_string(),
            Some(other) => return Err(format!("expected paper id as text, got {}", other)),
            None => return Err("missing field `id`".to_string()),
        };

        let mut text = |key: &str, fallback: fn() -> String| -> Result<String, String> {
            match fields.shift_remove(key) {
                None | Some(Value::Null) => Ok(fallback()),
                Some(Value::String(s)) => Ok(s),
                Some(Value::Number(n)) if key == "year" => Ok(n.to_string()),
                Some(other) => Err(format!("expected `{}` as text, got {}", key, other)),
            }
        };

        let title = text("title", String::new)?;
        let author = text("author", unknown)?;
        let pi = text("pi", unknown)?;
        let year = text("year", unknown)?;
        let url = text("url", String::new)?;

        let authors = match fields.shift_remove("authors") {
            None | Some(Value::Null) => Vec::new(),
            Some(value) => serde_json::from_value(value).map_err(|e| format!("invalid `authors`: {}", e))?,
        };

        Ok(Self {
            id,
            title,
            author,
            pi,
            year,
            url,
            authors,
            extra: fields,
            key_order,
        })
    }

    /// Keys in output order: as read, then missing known fields, then new
    /// free-form fields
    fn output_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.key_order.iter().map(String::as_str).collect();
        for known in KNOWN_FIELDS {
            if !keys.contains(&known) && (known != "authors" || !self.authors.is_empty()) {
                keys.push(known);
            }
        }
        for key in self.extra.keys() {
            if !keys.contains(&key.as_str()) {
                keys.push(key);
            }
        }
        keys
    }
}

impl Serialize for Paper {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for key in self.output_keys() {
            match key {
                "id" => map.serialize_entry(key, &self.id)?,
                "title" => map.serialize_entry(key, &self.title)?,
                "author" => map.serialize_entry(key, &self.author)?,
                "pi" => map.serialize_entry(key, &self.pi)?,
                "year" => map.serialize_entry(key, &self.year)?,
                "url" => map.serialize_entry(key, &self.url)?,
                "authors" => map.serialize_entry(key, &self.authors)?,
                other => {
                    // Free-form fields removed by an edit are skipped
                    if let Some(value) = self.extra.get(other) {
                        map.serialize_entry(other, value)?;
                    }
                }
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Paper {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = Map::<String, Value>::deserialize(deserializer)?;
        Paper::from_fields(fields).map_err(de::Error::custom)
    }
}

/// Decade of a textual year (`"1987"` -> `1980`)
pub fn decade_of(year: &str) -> Option<i32> {
    let year = year.trim();
    if year.is_empty() || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    year.parse::<i32>().ok().map(|y| (y / 10) * 10)
}

/// Request to add a paper
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PaperDraft {
    /// Explicit id; blank means "assign the next free id"
    #[serde(default)]
    #[validate(length(max = 256))]
    pub id: Option<String>,

    #[validate(length(min = 1, max = 1000))]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = 500))]
    pub author: Option<String>,

    #[serde(default)]
    #[validate(length(max = 500))]
    pub pi: Option<String>,

    #[serde(default)]
    #[validate(length(max = 32))]
    pub year: Option<String>,

    #[serde(default)]
    #[validate(length(max = 2048))]
    pub url: Option<String>,

    #[serde(default)]
    pub authors: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Partial edit of an existing paper
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PaperPatch {
    #[serde(default)]
    #[validate(length(min = 1, max = 1000))]
    pub title: Option<String>,

    #[serde(default)]
    #[validate(length(max = 500))]
    pub author: Option<String>,

    #[serde(default)]
    #[validate(length(max = 500))]
    pub pi: Option<String>,

    #[serde(default)]
    #[validate(length(max = 32))]
    pub year: Option<String>,

    #[serde(default)]
    #[validate(length(max = 2048))]
    pub url: Option<String>,

    #[serde(default)]
    pub authors: Option<Vec<String>>,

    /// Free-form fields to merge; a `null` value removes the field
    #[serde(default)]
    pub extra: Option<Map<String, Value>>,
}

/// Normalize optional text: blank becomes `fallback`
pub(crate) fn or_default(value: Option<String>, fallback: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}
