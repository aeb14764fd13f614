//! Browser page: graph, controls, library table, and the admin panel
//!
//! The page itself is the same for everyone. Admin mode lives in the
//! browser: the login form trades the password for a token kept in
//! `sessionStorage`, and the admin forms call the JSON API with it.

use super::blocking;
use super::graph::{figure_for, GraphQuery};
use crate::AppState;
use axum::{
    extract::{Query, State},
    response::Html,
};
use citagraph_common::{errors::Result, metrics, Library};
use citagraph_graph::{
    color::decade_label,
    connections, library_table,
    svg::{escape_xml, select_href},
    ColorMode, FigureRequest, LayoutKind, PaperRow, SvgOptions, TableFilter, Connections,
};
use serde::Deserialize;
use std::time::Instant;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub layout: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub selected: Option<String>,
    #[serde(default)]
    pub seed: Option<u64>,
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

impl PageQuery {
    fn graph_query(&self) -> GraphQuery {
        GraphQuery {
            layout: self.layout.clone(),
            color: self.color.clone(),
            selected: self.selected.clone(),
            seed: self.seed,
        }
    }

    fn filter(&self) -> TableFilter {
        TableFilter {
            title: self.title.clone(),
            author: self.author.clone(),
            pi: self.pi.clone(),
            year: self.year.clone(),
            decade: self.decade.clone(),
        }
    }
}

/// Everything the page shows, computed off the async runtime
struct PageModel {
    request: FigureRequest,
    filter: TableFilter,
    svg: String,
    rows: Vec<PaperRow>,
    total: usize,
    connections: Option<Connections>,
}

pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>> {
    let request = query.graph_query().to_request(&state)?;
    let filter = query.filter();
    let store = state.store.clone();
    let (width, height) = (state.config.render.width, state.config.render.height);
    let start = Instant::now();

    let model = blocking(move || {
        let library = store.load()?;
        Ok(build_model(&library, request, filter, width, height))
    })
    .await?;

    metrics::record_render(start.elapsed().as_secs_f64(), model.request.layout.as_str(), "html");
    Ok(Html(render_page(&model)))
}

fn build_model(library: &Library, request: FigureRequest, filter: TableFilter, width: u32, height: u32) -> PageModel {
    let figure = figure_for(library, &request);
    let svg = citagraph_graph::render_svg(
        &figure,
        &SvgOptions {
            width,
            height,
            link_query: Some(keep_query(&request, &filter)),
        },
    );
    let connections = figure
        .selected
        .as_deref()
        .and_then(|id| connections(library, id).ok());

    PageModel {
        rows: library_table(library, &filter),
        total: library.paper_count(),
        request: FigureRequest {
            // Unknown selections are dropped from the page as well
            selected: figure.selected.clone(),
            ..request
        },
        filter,
        svg,
        connections,
    }
}

/// Current query without the selection, so links can reselect
fn keep_query(request: &FigureRequest, filter: &TableFilter) -> String {
    let mut parts = vec![
        format!("layout={}", request.layout.as_str()),
        format!("color={}", request.color.as_str()),
    ];
    if let Some(seed) = request.options.seed {
        parts.push(format!("seed={}", seed));
    }
    let filters = [
        ("title", &filter.title),
        ("author", &filter.author),
        ("pi", &filter.pi),
        ("year", &filter.year),
        ("decade", &filter.decade),
    ];
    for (name, value) in filters {
        if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
            parts.push(format!("{}={}", name, urlencoding::encode(value)));
        }
    }
    parts.join("&")
}

fn option_list<T: Copy + PartialEq>(items: &[T], current: T, value: fn(T) -> &'static str, label: fn(T) -> &'static str) -> String {
    items
        .iter()
        .map(|&item| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                value(item),
                if item == current { " selected" } else { "" },
                label(item)
            )
        })
        .collect()
}

fn text_input(name: &str, label: &str, value: &Option<String>) -> String {
    format!(
        r#"<label>{label} <input type="text" name="{name}" value="{value}"></label>"#,
        label = label,
        name = name,
        value = escape_xml(value.as_deref().unwrap_or_default())
    )
}

fn paper_link(row: &PaperRow, query: &str) -> String {
    format!(
        r#"<a href="{}">{}</a>"#,
        escape_xml(&select_href(query, &row.id)),
        escape_xml(&row.title)
    )
}

/// Only web links are clickable; anything else is shown as text
fn url_cell(url: &str) -> String {
    let lower = url.trim_start().to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        format!(r#"<a href="{0}" target="_blank" rel="noopener">{0}</a>"#, escape_xml(url.trim()))
    } else {
        escape_xml(url)
    }
}

fn render_rows(rows: &[PaperRow], query: &str) -> String {
    if rows.is_empty() {
        return r#"<tr><td colspan="7" class="muted">No papers match the filters.</td></tr>"#.to_string();
    }

    rows.iter()
        .map(|row| {
            let url = url_cell(&row.url);
            format!(
                "<tr><td><code>{}</code></td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                escape_xml(&row.id),
                paper_link(row, query),
                escape_xml(&row.author),
                escape_xml(&row.pi),
                escape_xml(&row.year),
                escape_xml(&row.decade),
                url
            )
        })
        .collect()
}

fn render_connections(conn: &Connections, query: &str) -> String {
    let list = |rows: &[PaperRow]| -> String {
        if rows.is_empty() {
            return "<p class=\"muted\">None</p>".to_string();
        }
        let items: String = rows
            .iter()
            .map(|row| format!("<li>{} <span class=\"muted\">({}, {})</span></li>", paper_link(row, query), escape_xml(&row.author), escape_xml(&row.year)))
            .collect();
        format!("<ul>{}</ul>", items)
    };

    let paper = &conn.paper;
    format!(
        r#"<section class="panel" id="selection">
  <h2>{title}</h2>
  <p><code>{id}</code> &middot; First Author: {author} &middot; PI: {pi} &middot; Year: {year} ({decade})</p>
  <p><a href="?{clear}">Clear selection</a></p>
  <h3>Cited by ({n_by})</h3>
  {cited_by}
  <h3>Cites ({n_cites})</h3>
  {cites}
</section>"#,
        title = escape_xml(&paper.title),
        id = escape_xml(&paper.id),
        author = escape_xml(&paper.author),
        pi = escape_xml(&paper.pi),
        year = escape_xml(&paper.year),
        decade = escape_xml(&paper.decade),
        clear = escape_xml(query),
        n_by = conn.cited_by.len(),
        cited_by = list(&conn.cited_by),
        n_cites = conn.cites.len(),
        cites = list(&conn.cites),
    )
}

fn render_page(model: &PageModel) -> String {
    let request = &model.request;
    let query = keep_query(request, &model.filter);

    let layout_options = option_list(&LayoutKind::ALL, request.layout, LayoutKind::as_str, LayoutKind::as_str);
    let color_options = option_list(&ColorMode::ALL, request.color, ColorMode::as_str, ColorMode::label);
    let decade_hint = format!("e.g. {}", decade_label(Some(1990)));

    let empty_hint = if model.total == 0 {
        r#"<p class="hint">The library is empty. Log in as admin to add papers or import them by DOI.</p>"#
    } else {
        ""
    };

    let selected_input = request
        .selected
        .as_deref()
        .map(|id| format!(r#"<input type="hidden" name="selected" value="{}">"#, escape_xml(id)))
        .unwrap_or_default();

    let selection = model
        .connections
        .as_ref()
        .map(|conn| render_connections(conn, &query))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Citagraph</title>
    <style>{css}</style>
</head>
<body>
<aside class="sidebar">
  <h2>Paper Management</h2>
  <div id="mode-banner" class="banner observer">Observer mode: read-only</div>
  <form id="login-form" class="admin-off">
    <label>Admin password <input type="password" name="password" autocomplete="current-password"></label>
    <button type="submit">Log in</button>
  </form>
  <div id="admin-panel" class="admin-on" hidden>
    <button id="logout">Log out</button>
    <details open><summary>Auto-add paper by DOI</summary>
      <form data-action="import">
        <input name="doi" placeholder="10.1000/xyz123" required>
        <input name="pi_override" placeholder="PI override (optional)">
        <button type="submit">Fetch and add</button>
      </form>
    </details>
    <details><summary>Add paper</summary>
      <form data-action="add-paper">
        <input name="id" placeholder="Paper ID (blank = next free)">
        <input name="title" placeholder="Title" required>
        <input name="author" placeholder="First author">
        <input name="pi" placeholder="PI">
        <input name="year" placeholder="Year">
        <input name="url" placeholder="URL">
        <button type="submit">Add paper</button>
      </form>
    </details>
    <details><summary>Edit paper</summary>
      <form data-action="edit-paper">
        <input name="id" placeholder="Paper ID" required>
        <input name="title" placeholder="New title">
        <input name="author" placeholder="New first author">
        <input name="pi" placeholder="New PI">
        <input name="year" placeholder="New year">
        <input name="url" placeholder="New URL">
        <button type="submit">Save changes</button>
      </form>
    </details>
    <details><summary>Delete paper</summary>
      <form data-action="delete-paper">
        <input name="id" placeholder="Paper ID" required>
        <button type="submit">Delete paper</button>
      </form>
    </details>
    <details><summary>Add citation</summary>
      <form data-action="add-citation">
        <input name="citing_id" placeholder="Citing paper ID" required>
        <input name="cited_id" placeholder="Cited paper ID" required>
        <button type="submit">Add citation</button>
      </form>
    </details>
    <details><summary>Remove citation</summary>
      <form data-action="remove-citation">
        <input name="citing_id" placeholder="Citing paper ID" required>
        <input name="cited_id" placeholder="Cited paper ID" required>
        <button type="submit">Remove citation</button>
      </form>
    </details>
  </div>
  <p id="status" role="status"></p>
</aside>
<main>
  <h1>Citagraph</h1>
  <form class="controls" method="get">
    <label>Layout <select name="layout">{layout_options}</select></label>
    <label>Color by <select name="color">{color_options}</select></label>
    {selected_input}
    <button type="submit">Redraw</button>
  </form>
  {empty_hint}
  <div class="figure">{svg}</div>
  {selection}
  <section class="panel">
    <h2>Library ({matched} of {total} papers)</h2>
    <form class="filters" method="get">
      <input type="hidden" name="layout" value="{layout}">
      <input type="hidden" name="color" value="{color}">
      {selected_input}
      {f_title}{f_author}{f_pi}{f_year}
      <label>Decade <input type="text" name="decade" placeholder="{decade_hint}" value="{decade}"></label>
      <button type="submit">Filter</button>
    </form>
    <table>
      <thead><tr><th>ID</th><th>Title</th><th>First Author</th><th>PI</th><th>Year</th><th>Decade</th><th>URL</th></tr></thead>
      <tbody>
{rows}      </tbody>
    </table>
  </section>
</main>
<script>{js}</script>
</body>
</html>
"#,
        css = PAGE_CSS,
        js = PAGE_JS,
        layout_options = layout_options,
        color_options = color_options,
        selected_input = selected_input,
        empty_hint = empty_hint,
        svg = model.svg,
        selection = selection,
        matched = model.rows.len(),
        total = model.total,
        layout = request.layout.as_str(),
        color = request.color.as_str(),
        f_title = text_input("title", "Title", &model.filter.title),
        f_author = text_input("author", "First author", &model.filter.author),
        f_pi = text_input("pi", "PI", &model.filter.pi),
        f_year = text_input("year", "Year", &model.filter.year),
        decade_hint = decade_hint,
        decade = escape_xml(model.filter.decade.as_deref().unwrap_or_default()),
        rows = render_rows(&model.rows, &query),
    )
}

const PAGE_CSS: &str = r#"
body { margin: 0; display: flex; font-family: 'Times New Roman', serif; color: #111; }
.sidebar { width: 300px; padding: 16px; background: #f4f4f6; min-height: 100vh; box-sizing: border-box; }
.sidebar input, .sidebar button { display: block; width: 100%; margin: 4px 0; box-sizing: border-box; }
main { flex: 1; padding: 16px 24px; overflow-x: auto; }
.banner { padding: 8px; border-radius: 4px; margin-bottom: 12px; font-weight: bold; }
.banner.observer { background: #e8eef8; }
.banner.admin { background: #fbeed5; }
.controls label, .filters label { margin-right: 12px; }
.hint { padding: 12px; background: #fffbe6; border: 1px solid #e6d98c; }
.panel { margin-top: 24px; }
.muted { color: #777; }
table { border-collapse: collapse; width: 100%; margin-top: 8px; }
th, td { border-bottom: 1px solid #ddd; padding: 4px 8px; text-align: left; }
"#;

const PAGE_JS: &str = r#"
(function () {
  const TOKEN_KEY = 'citagraph.token';
  const status = document.getElementById('status');
  const token = () => sessionStorage.getItem(TOKEN_KEY);

  function setMode(admin) {
    const banner = document.getElementById('mode-banner');
    banner.textContent = admin ? 'Admin mode: editing enabled' : 'Observer mode: read-only';
    banner.className = 'banner ' + (admin ? 'admin' : 'observer');
    document.getElementById('admin-panel').hidden = !admin;
    document.getElementById('login-form').hidden = admin;
  }

  async function api(method, path, body) {
    const headers = { 'Content-Type': 'application/json' };
    if (token()) headers['Authorization'] = 'Bearer ' + token();
    const res = await fetch(path, { method, headers, body: body ? JSON.stringify(body) : undefined });
    const data = await res.json().catch(() => ({}));
    if (!res.ok) throw new Error((data.error && data.error.message) || res.statusText);
    return data;
  }

  function fields(form) {
    const out = {};
    new FormData(form).forEach((v, k) => { if (String(v).trim() !== '') out[k] = String(v).trim(); });
    return out;
  }

  const actions = {
    'import': f => api('POST', '/v1/import', f),
    'add-paper': f => api('POST', '/v1/papers', f),
    'edit-paper': f => { const id = f.id; delete f.id; return api('PATCH', '/v1/papers/' + encodeURIComponent(id), f); },
    'delete-paper': f => api('DELETE', '/v1/papers/' + encodeURIComponent(f.id)),
    'add-citation': f => api('POST', '/v1/citations', f),
    'remove-citation': f => api('DELETE', '/v1/citations/' + encodeURIComponent(f.citing_id) + '/' + encodeURIComponent(f.cited_id)),
  };

  document.querySelectorAll('form[data-action]').forEach(form => {
    form.addEventListener('submit', async ev => {
      ev.preventDefault();
      status.textContent = 'Working...';
      try {
        await actions[form.dataset.action](fields(form));
        window.location.reload();
      } catch (err) {
        status.textContent = err.message;
        if (/expired|unauthorized/i.test(err.message)) { sessionStorage.removeItem(TOKEN_KEY); setMode(false); }
      }
    });
  });

  document.getElementById('login-form').addEventListener('submit', async ev => {
    ev.preventDefault();
    try {
      const data = await api('POST', '/v1/session', { password: ev.target.password.value });
      sessionStorage.setItem(TOKEN_KEY, data.token);
      status.textContent = 'Admin mode activated';
      setMode(true);
    } catch (err) {
      status.textContent = err.message;
    }
    ev.target.reset();
  });

  document.getElementById('logout').addEventListener('click', () => {
    sessionStorage.removeItem(TOKEN_KEY);
    status.textContent = '';
    setMode(false);
  });

  if (token()) {
    api('GET', '/v1/session')
      .then(data => setMode(data.mode === 'admin'))
      .catch(() => { sessionStorage.removeItem(TOKEN_KEY); setMode(false); });
  }
})();
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use citagraph_common::models::{PaperDraft, PaperPatch};
    use citagraph_graph::LayoutOptions;

    fn library() -> Library {
        let mut lib = Library::new();
        for (id, title, year) in [("0001", "Origins & Ends", "1995"), ("0002", "Sequel", "2003")] {
            lib.add_paper(PaperDraft {
                id: Some(id.into()),
                title: title.into(),
                author: Some("Noether".into()),
                year: Some(year.into()),
                ..Default::default()
            })
            .unwrap();
        }
        lib.add_citation("0002", "0001").unwrap();
        lib
    }

    fn request(selected: Option<&str>) -> FigureRequest {
        FigureRequest {
            layout: LayoutKind::Circular,
            color: ColorMode::Decade,
            selected: selected.map(String::from),
            options: LayoutOptions::default(),
        }
    }

    #[test]
    fn test_page_lists_papers_and_graph() {
        let lib = library();
        let model = build_model(&lib, request(None), TableFilter::default(), 800, 600);
        let html = render_page(&model);

        assert!(html.contains("Library (2 of 2 papers)"));
        assert!(html.contains("Origins &amp; Ends"));
        assert!(html.contains("<svg"));
        assert!(html.contains(r#"<option value="circular" selected>"#));
        assert!(html.contains(r#"<option value="decade" selected>Decade</option>"#));
        assert!(html.contains("Observer mode"));
        assert!(!html.contains("id=\"selection\""));
        assert!(!html.contains("The library is empty"));
    }

    #[test]
    fn test_page_shows_selection_connections() {
        let lib = library();
        let model = build_model(&lib, request(Some("0001")), TableFilter::default(), 800, 600);
        let html = render_page(&model);

        assert!(html.contains("id=\"selection\""));
        assert!(html.contains("Cited by (1)"));
        assert!(html.contains("Cites (0)"));
        assert!(html.contains(r#"<input type="hidden" name="selected" value="0001">"#));
    }

    #[test]
    fn test_unknown_selection_dropped() {
        let lib = library();
        let model = build_model(&lib, request(Some("missing")), TableFilter::default(), 800, 600);
        assert!(model.request.selected.is_none());
        assert!(model.connections.is_none());
    }

    #[test]
    fn test_filtered_and_empty_pages() {
        let lib = library();
        let filter = TableFilter {
            decade: Some("2000s".into()),
            ..Default::default()
        };
        let html = render_page(&build_model(&lib, request(None), filter, 800, 600));
        assert!(html.contains("Library (1 of 2 papers)"));

        let html = render_page(&build_model(&Library::new(), request(None), TableFilter::default(), 800, 600));
        assert!(html.contains("The library is empty"));
        assert!(html.contains("No papers match the filters."));
    }

    #[test]
    fn test_only_web_urls_are_links() {
        assert_eq!(url_cell(""), "");
        assert_eq!(
            url_cell("https://doi.org/10.1/x"),
            r#"<a href="https://doi.org/10.1/x" target="_blank" rel="noopener">https://doi.org/10.1/x</a>"#
        );
        assert_eq!(url_cell("javascript:alert(1)"), "javascript:alert(1)");
        assert!(!url_cell(" JavaScript:alert('x')").contains("href"));

        let mut lib = library();
        lib.update_paper(
            "0001",
            PaperPatch {
                url: Some("javascript:alert(1)".into()),
                ..Default::default()
            },
        )
        .unwrap();
        let html = render_page(&build_model(&lib, request(None), TableFilter::default(), 800, 600));
        assert!(!html.contains(r#"href="javascript:"#));
        assert!(html.contains("javascript:alert(1)"));
    }

    #[test]
    fn test_keep_query_encodes_filters() {
        let filter = TableFilter {
            author: Some("van der Waals".into()),
            title: Some("  ".into()),
            ..Default::default()
        };
        let mut req = request(None);
        req.options.seed = Some(5);
        assert_eq!(
            keep_query(&req, &filter),
            "layout=circular&color=decade&seed=5&author=van%20der%20Waals"
        );
    }
}
