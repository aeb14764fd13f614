//! In-memory paper library
//!
//! Holds papers (ordered, unique by id) and the citation edges between them.
//! All mutations used by the admin surface live here; persistence is the
//! job of [`crate::store::LibraryStore`].

mod document;

use crate::crossref::PaperMetadata;
use crate::errors::{AppError, Result};
use crate::models::{or_default, Citation, Paper, PaperDraft, PaperPatch, UNKNOWN};
use document::{DocumentIn, DocumentOut};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use serde_json::Value;

/// Papers and citations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Library {
    papers: IndexMap<String, Paper>,
    citations: IndexSet<Citation>,
}

/// Result of importing a paper from fetched metadata
#[derive(Debug, Clone, Serialize)]
pub struct ImportOutcome {
    pub paper: Paper,
    pub citations_added: usize,
    pub replaced_existing: bool,
}

impl Library {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a library document (canonical or keyed form)
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        let doc: DocumentIn = serde_json::from_str(raw)?;
        let (papers, citations) = doc.into_parts()?;

        let mut library = Self::new();
        for mut paper in papers {
            if paper.title.is_empty() {
                paper.title = paper.id.clone();
            }
            // Later definitions of the same id win
            library.papers.insert(paper.id.clone(), paper);
        }

        for citation in citations {
            for end in [&citation.citing_id, &citation.cited_id] {
                if !library.papers.contains_key(end) {
                    tracing::warn!(paper_id = %end, "Citation references unknown paper, adding placeholder");
                    library.papers.insert(end.clone(), Paper::placeholder(end.clone()));
                }
            }
            library.citations.insert(citation);
        }

        Ok(library)
    }

    /// Serialize to the canonical pretty-printed document (trailing newline)
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        let doc = DocumentOut {
            papers: self.papers.values().collect(),
            citations: self.citations.iter().collect(),
        };
        let mut out = serde_json::to_string_pretty(&doc)?;
        out.push('\n');
        Ok(out)
    }

    pub fn papers(&self) -> impl Iterator<Item = &Paper> {
        self.papers.values()
    }

    pub fn citations(&self) -> impl Iterator<Item = &Citation> {
        self.citations.iter()
    }

    pub fn paper(&self, id: &str) -> Option<&Paper> {
        self.papers.get(id)
    }

    /// Look up a paper or fail with `PaperNotFound`
    pub fn require_paper(&self, id: &str) -> Result<&Paper> {
        self.papers
            .get(id)
            .ok_or_else(|| AppError::PaperNotFound { id: id.to_string() })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.papers.contains_key(id)
    }

    pub fn has_citation(&self, citing_id: &str, cited_id: &str) -> bool {
        self.citations.contains(&Citation::new(citing_id, cited_id))
    }

    pub fn paper_count(&self) -> usize {
        self.papers.len()
    }

    pub fn citation_count(&self) -> usize {
        self.citations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }

    /// First four-digit id (`0001`, `0002`, ...) not taken by any paper
    pub fn next_paper_id(&self) -> String {
        (1..)
            .map(|i| format!("{:04}", i))
            .find(|candidate| !self.papers.contains_key(candidate))
            .unwrap_or_default()
    }

    /// Add a new paper, assigning an id when none is given
    pub fn add_paper(&mut self, draft: PaperDraft) -> Result<Paper> {
        let title = draft.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::MissingField { field: "title".to_string() });
        }

        let id = match draft.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => {
                if self.papers.contains_key(id) {
                    return Err(AppError::DuplicatePaper { id: id.to_string() });
                }
                id.to_string()
            }
            _ => self.next_paper_id(),
        };

        let paper = Paper {
            id: id.clone(),
            title,
            author: or_default(draft.author, UNKNOWN),
            pi: or_default(draft.pi, UNKNOWN),
            year: or_default(draft.year, UNKNOWN),
            url: or_default(draft.url, ""),
            authors: draft.authors,
            extra: draft.extra,
            key_order: Vec::new(),
        };

        self.papers.insert(id, paper.clone());
        Ok(paper)
    }

    /// Apply a partial edit to an existing paper
    pub fn update_paper(&mut self, id: &str, patch: PaperPatch) -> Result<Paper> {
        let paper = self
            .papers
            .get_mut(id)
            .ok_or_else(|| AppError::PaperNotFound { id: id.to_string() })?;

        if let Some(title) = patch.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(AppError::Validation {
                    message: "Title must not be blank".to_string(),
                    field: Some("title".to_string()),
                });
            }
            paper.title = title;
        }
        if let Some(author) = patch.author {
            paper.author = or_default(Some(author), UNKNOWN);
        }
        if let Some(pi) = patch.pi {
            paper.pi = or_default(Some(pi), UNKNOWN);
        }
        if let Some(year) = patch.year {
            paper.year = or_default(Some(year), UNKNOWN);
        }
        if let Some(url) = patch.url {
            paper.url = url.trim().to_string();
        }
        if let Some(authors) = patch.authors {
            paper.authors = authors;
        }
        if let Some(extra) = patch.extra {
            for (key, value) in extra {
                if value == Value::Null {
                    paper.extra.shift_remove(&key);
                } else {
                    paper.extra.insert(key, value);
                }
            }
        }

        Ok(paper.clone())
    }

    /// Remove a paper together with every citation touching it
    pub fn delete_paper(&mut self, id: &str) -> Result<Paper> {
        let paper = self
            .papers
            .shift_remove(id)
            .ok_or_else(|| AppError::PaperNotFound { id: id.to_string() })?;
        self.citations.retain(|c| !c.touches(id));
        Ok(paper)
    }

    /// Record that `citing_id` cites `cited_id`
    pub fn add_citation(&mut self, citing_id: &str, cited_id: &str) -> Result<Citation> {
        self.require_paper(citing_id)?;
        self.require_paper(cited_id)?;

        let citation = Citation::new(citing_id, cited_id);
        if !self.citations.insert(citation.clone()) {
            return Err(AppError::DuplicateCitation {
                citing_id: citing_id.to_string(),
                cited_id: cited_id.to_string(),
            });
        }
        Ok(citation)
    }

    /// Remove a single citation edge
    pub fn remove_citation(&mut self, citing_id: &str, cited_id: &str) -> Result<Citation> {
        let citation = Citation::new(citing_id, cited_id);
        if !self.citations.shift_remove(&citation) {
            return Err(AppError::CitationNotFound {
                citing_id: citing_id.to_string(),
                cited_id: cited_id.to_string(),
            });
        }
        Ok(citation)
    }

    /// Add (or refresh) the paper identified by `doi` and link it to every
    /// paper already in the library that it references.
    pub fn import_metadata(
        &mut self,
        doi: &str,
        metadata: PaperMetadata,
        pi_override: Option<String>,
    ) -> Result<ImportOutcome> {
        let doi = doi.trim();
        if doi.is_empty() {
            return Err(AppError::MissingField { field: "doi".to_string() });
        }

        let pi = match pi_override {
            Some(pi) if !pi.trim().is_empty() => pi.trim().to_string(),
            _ => metadata.pi,
        };

        let (extra, key_order) = self
            .papers
            .get(doi)
            .map(|existing| (existing.extra.clone(), existing.key_order.clone()))
            .unwrap_or_default();

        let paper = Paper {
            id: doi.to_string(),
            title: or_default(Some(metadata.title), doi),
            author: metadata.author,
            pi,
            year: metadata.year,
            url: metadata.url,
            authors: metadata.all_authors,
            extra,
            key_order,
        };
        let replaced_existing = self.papers.insert(doi.to_string(), paper.clone()).is_some();

        let mut citations_added = 0;
        for reference in &metadata.references {
            if reference == doi || !self.papers.contains_key(reference) {
                continue;
            }
            if self.citations.insert(Citation::new(doi, reference.clone())) {
                citations_added += 1;
            }
        }

        Ok(ImportOutcome {
            paper,
            citations_added,
            replaced_existing,
        })
    }
}
