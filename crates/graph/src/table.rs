//! Tabular view of the library with filters and per-paper connections

use crate::color::decade_label;
use citagraph_common::errors::Result;
use citagraph_common::{Library, Paper};
use serde::{Deserialize, Serialize};

/// One row of the library table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaperRow {
    pub id: String,
    pub title: String,
    pub author: String,
    pub pi: String,
    pub year: String,
    /// `"1990s"` or `"Unknown"`
    pub decade: String,
    pub url: String,
}

impl From<&Paper> for PaperRow {
    fn from(paper: &Paper) -> Self {
        Self {
            id: paper.id.clone(),
            title: paper.title.clone(),
            author: paper.author.clone(),
            pi: paper.pi.clone(),
            year: paper.year.clone(),
            decade: decade_label(paper.decade()),
            url: paper.url.clone(),
        }
    }
}

/// Case-insensitive substring filters, combined with AND; blank means "any"
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableFilter {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub pi: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub decade: Option<String>,
}

impl TableFilter {
    pub fn is_empty(&self) -> bool {
        self.needles().all(|(_, needle)| needle.is_none())
    }

    fn needles(&self) -> impl Iterator<Item = (Column, Option<String>)> + '_ {
        [
            (Column::Title, &self.title),
            (Column::Author, &self.author),
            (Column::Pi, &self.pi),
            (Column::Year, &self.year),
            (Column::Decade, &self.decade),
        ]
        .into_iter()
        .map(|(column, value)| {
            let needle = value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_lowercase);
            (column, needle)
        })
    }

    /// Whether `row` passes every active filter
    pub fn matches(&self, row: &PaperRow) -> bool {
        self.needles().all(|(column, needle)| match needle {
            None => true,
            Some(needle) => column.value(row).to_lowercase().contains(&needle),
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Column {
    Title,
    Author,
    Pi,
    Year,
    Decade,
}

impl Column {
    fn value(self, row: &PaperRow) -> &str {
        match self {
            Column::Title => &row.title,
            Column::Author => &row.author,
            Column::Pi => &row.pi,
            Column::Year => &row.year,
            Column::Decade => &row.decade,
        }
    }
}

/// Rows of every paper passing `filter`, in library order
pub fn library_table(library: &Library, filter: &TableFilter) -> Vec<PaperRow> {
    library
        .papers()
        .map(PaperRow::from)
        .filter(|row| filter.matches(row))
        .collect()
}

/// Papers linked to one paper by a citation
#[derive(Debug, Clone, Serialize)]
pub struct Connections {
    pub paper: PaperRow,
    /// Papers that cite this one
    pub cited_by: Vec<PaperRow>,
    /// Papers this one cites
    pub cites: Vec<PaperRow>,
}

/// Citing and cited papers of `paper_id`
pub fn connections(library: &Library, paper_id: &str) -> Result<Connections> {
    let paper = library.require_paper(paper_id)?;

    let rows = |ids: Vec<&str>| -> Vec<PaperRow> {
        ids.into_iter()
            .filter_map(|id| library.paper(id))
            .map(PaperRow::from)
            .collect()
    };

    let cited_by = library
        .citations()
        .filter(|c| c.cited_id == paper_id)
        .map(|c| c.citing_id.as_str())
        .collect();
    let cites = library
        .citations()
        .filter(|c| c.citing_id == paper_id)
        .map(|c| c.cited_id.as_str())
        .collect();

    Ok(Connections {
        paper: PaperRow::from(paper),
        cited_by: rows(cited_by),
        cites: rows(cites),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use citagraph_common::models::PaperDraft;
    use citagraph_common::AppError;

    fn library() -> Library {
        let mut lib = Library::new();
        for (id, title, author, pi, year) in [
            ("0001", "Attention Is All You Need", "Vaswani", "Polosukhin", "2017"),
            ("0002", "Deep Residual Learning", "He", "Sun", "2016"),
            ("0003", "Backpropagation", "Rumelhart", "Williams", "1986"),
            ("0004", "Lost Manuscript", "Anon", "Unknown", "Unknown"),
        ] {
            lib.add_paper(PaperDraft {
                id: Some(id.into()),
                title: title.into(),
                author: Some(author.into()),
                pi: Some(pi.into()),
                year: Some(year.into()),
                ..Default::default()
            })
            .unwrap();
        }
        lib.add_citation("0001", "0002").unwrap();
        lib.add_citation("0001", "0003").unwrap();
        lib.add_citation("0002", "0003").unwrap();
        lib
    }

    fn ids(rows: &[PaperRow]) -> Vec<&str> {
        rows.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_unfiltered_table() {
        let rows = library_table(&library(), &TableFilter::default());
        assert_eq!(ids(&rows), vec!["0001", "0002", "0003", "0004"]);
        assert_eq!(rows[2].decade, "1980s");
        assert_eq!(rows[3].decade, "Unknown");
    }

    #[test]
    fn test_filters_are_case_insensitive() {
        let lib = library();
        let filter = TableFilter {
            title: Some("  LEARNING ".into()),
            ..Default::default()
        };
        assert_eq!(ids(&library_table(&lib, &filter)), vec!["0002"]);

        let filter = TableFilter {
            decade: Some("2010s".into()),
            ..Default::default()
        };
        assert_eq!(ids(&library_table(&lib, &filter)), vec!["0001", "0002"]);
    }

    #[test]
    fn test_filters_combine_with_and() {
        let filter = TableFilter {
            decade: Some("2010".into()),
            author: Some("he".into()),
            ..Default::default()
        };
        assert_eq!(ids(&library_table(&library(), &filter)), vec!["0002"]);
        assert!(!filter.is_empty());
        assert!(TableFilter { year: Some(" ".into()), ..Default::default() }.is_empty());
    }

    #[test]
    fn test_connections() {
        let lib = library();

        let conn = connections(&lib, "0003").unwrap();
        assert_eq!(ids(&conn.cited_by), vec!["0001", "0002"]);
        assert!(conn.cites.is_empty());

        let conn = connections(&lib, "0001").unwrap();
        assert_eq!(ids(&conn.cites), vec!["0002", "0003"]);
        assert!(conn.cited_by.is_empty());

        assert!(matches!(connections(&lib, "9999"), Err(AppError::PaperNotFound { .. })));
    }
}
