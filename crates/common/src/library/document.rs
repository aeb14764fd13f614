//! On-disk representation of the library
//!
//! Canonical form:
//! `{"papers": [{"id": ..., ...}], "citations": [["citing", "cited"], ...]}`
//!
//! The older keyed form is still read:
//! `{"papers": {"<id>": {...}}, "citations": {"<id>": ["<cited>", ...]}}`

use crate::models::{Citation, Paper};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Serialize)]
pub(super) struct DocumentOut<'a> {
    pub papers: Vec<&'a Paper>,
    pub citations: Vec<&'a Citation>,
}

#[derive(Deserialize)]
pub(super) struct DocumentIn {
    #[serde(default)]
    papers: Option<PapersRepr>,
    #[serde(default)]
    citations: Option<CitationsRepr>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PapersRepr {
    List(Vec<Paper>),
    Keyed(IndexMap<String, Map<String, Value>>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CitationsRepr {
    Pairs(Vec<Citation>),
    Keyed(IndexMap<String, Vec<String>>),
}

impl DocumentIn {
    /// Flatten either representation into papers and edges, in file order
    pub fn into_parts(self) -> serde_json::Result<(Vec<Paper>, Vec<Citation>)> {
        let papers = match self.papers {
            None => Vec::new(),
            Some(PapersRepr::List(list)) => list,
            Some(PapersRepr::Keyed(map)) => map
                .into_iter()
                .map(|(id, fields)| {
                    let mut object = Map::with_capacity(fields.len() + 1);
                    object.insert("id".to_string(), Value::String(id));
                    object.extend(fields.into_iter().filter(|(key, _)| key != "id"));
                    serde_json::from_value(Value::Object(object))
                })
                .collect::<serde_json::Result<Vec<Paper>>>()?,
        };

        let citations = match self.citations {
            None => Vec::new(),
            Some(CitationsRepr::Pairs(pairs)) => pairs,
            Some(CitationsRepr::Keyed(map)) => map
                .into_iter()
                .flat_map(|(citing, cited)| {
                    cited
                        .into_iter()
                        .map(move |cited| Citation::new(citing.clone(), cited))
                })
                .collect(),
        };

        Ok((papers, citations))
    }
}
