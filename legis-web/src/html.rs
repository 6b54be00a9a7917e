//! HTML building blocks shared by the page handlers
//!
//! Pages are rendered with `format!` into one layout; every value coming
//! from the database or the request goes through [`escape`].

use chrono::{NaiveDate, NaiveDateTime};

use crate::pagination::Pagination;

/// Escape text for HTML element content and double-quoted attributes
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Percent-encode a path segment or query value
pub fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

pub fn format_datetime(value: NaiveDateTime) -> String {
    value.format("%d/%m/%Y %H:%M").to_string()
}

/// Full page: navigation, content and build footer
pub fn page(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} | Monitor Legislativo</title>
    <link rel="stylesheet" href="/static/legis.css">
</head>
<body>
    <header>
        <nav>
            <a class="brand" href="/">Monitor Legislativo</a>
            <a href="/deputados/">Deputados</a>
            <a href="/proposicoes/">Proposições</a>
            <a href="/votacoes/">Votações</a>
            <a href="/tipos-proposicao/">Tipos</a>
            <a href="/graficos/partidos/">Gráficos</a>
            <a href="/ia/">Análises IA</a>
            <a href="/painel/">Painel</a>
            <a href="/gestao/">Tarefas</a>
            <a href="/admin/">Admin</a>
        </nav>
    </header>
    <main>
        <h1>{title}</h1>
        {content}
    </main>
    <footer>
        <span>legis-web v{version} [{git_hash}]</span>
        <span>{build_timestamp} ({build_profile})</span>
    </footer>
</body>
</html>"#,
        title = escape(title),
        content = content,
        version = env!("CARGO_PKG_VERSION"),
        git_hash = env!("GIT_HASH"),
        build_timestamp = env!("BUILD_TIMESTAMP"),
        build_profile = env!("BUILD_PROFILE"),
    )
}

/// Query string with non-empty `params` plus `page`, ready to append to a path
pub fn query_string(params: &[(&str, Option<&str>)], page: i64) -> String {
    let mut parts: Vec<String> = params
        .iter()
        .filter_map(|(key, value)| {
            value
                .filter(|v| !v.is_empty())
                .map(|v| format!("{}={}", key, encode(v)))
        })
        .collect();
    parts.push(format!("page={}", page));
    format!("?{}", parts.join("&amp;"))
}

/// Previous/next links keeping the current filters
pub fn pagination_nav(p: &Pagination, params: &[(&str, Option<&str>)]) -> String {
    let mut nav = String::from(r#"<div class="pagination">"#);
    if p.has_previous() {
        nav.push_str(&format!(
            r#"<a href="{}">&laquo; Anterior</a> "#,
            query_string(params, p.page - 1)
        ));
    }
    nav.push_str(&format!(
        "<span>Página {} de {} ({} itens)</span>",
        p.page, p.total_pages, p.total
    ));
    if p.has_next() {
        nav.push_str(&format!(
            r#" <a href="{}">Próxima &raquo;</a>"#,
            query_string(params, p.page + 1)
        ));
    }
    nav.push_str("</div>");
    nav
}

/// `<option>` list with `selected` on the current value
pub fn options(values: &[(String, String)], current: Option<&str>) -> String {
    let mut html = String::from(r#"<option value="">Todos</option>"#);
    for (value, label) in values {
        let selected = if current == Some(value.as_str()) { " selected" } else { "" };
        html.push_str(&format!(
            r#"<option value="{}"{}>{}</option>"#,
            escape(value),
            selected,
            escape(label)
        ));
    }
    html
}

/// `<ul>` of escaped items, or a placeholder paragraph when empty
pub fn list_or_empty(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        return format!(r#"<p class="empty">{}</p>"#, escape(empty));
    }
    let mut html = String::from("<ul>");
    for item in items {
        html.push_str(&format!("<li>{}</li>", item));
    }
    html.push_str("</ul>");
    html
}

/// `<table>` with escaped headers; cells are inserted as given
pub fn table(headers: &[&str], rows: &[Vec<String>], empty: &str) -> String {
    if rows.is_empty() {
        return format!(r#"<p class="empty">{}</p>"#, escape(empty));
    }
    let mut html = String::from("<table><thead><tr>");
    for header in headers {
        html.push_str(&format!("<th>{}</th>", escape(header)));
    }
    html.push_str("</tr></thead><tbody>");
    for row in rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", cell));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

pub fn link(href: &str, text: &str) -> String {
    format!(r#"<a href="{}">{}</a>"#, escape(href), escape(text))
}

/// Empty query values count as absent
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::paginate;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<b>"PL" & 'PEC'</b>"#),
            "&lt;b&gt;&quot;PL&quot; &amp; &#39;PEC&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_query_string_skips_empty_filters() {
        let qs = query_string(&[("partido", Some("PT")), ("uf", Some("")), ("q", Some("meio ambiente"))], 3);
        assert_eq!(qs, "?partido=PT&amp;q=meio%20ambiente&amp;page=3");
    }

    #[test]
    fn test_pagination_nav_links() {
        let p = paginate(45, Some("2"), 20);
        let nav = pagination_nav(&p, &[("uf", Some("RO"))]);
        assert!(nav.contains("?uf=RO&amp;page=1"));
        assert!(nav.contains("?uf=RO&amp;page=3"));
        assert!(nav.contains("Página 2 de 3"));
    }

    #[test]
    fn test_options_marks_selected() {
        let values = vec![("PT".to_string(), "PT".to_string()), ("PL".to_string(), "PL".to_string())];
        let html = options(&values, Some("PL"));
        assert!(html.contains(r#"<option value="PL" selected>PL</option>"#));
        assert!(html.contains(r#"<option value="PT">PT</option>"#));
    }
}
