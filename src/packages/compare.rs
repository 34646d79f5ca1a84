//! Package comparison table.
//!
//! Package descriptions are free text, usually one feature per line
//! (`Cement: UltraTech`). For each configured keyword the first line of a
//! package that mentions it becomes that package's cell in the keyword's row.

use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;

use crate::security::sanitize::escape_html;
use crate::storage::Package;

static BREAK_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<\s*(br\s*/?|/p|/li|/div|/h[1-6])\s*>").expect("break tag pattern is valid")
});

static ANY_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

/// One feature row: a cell per package, `None` where the package is silent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRow {
    pub feature: String,
    pub cells: Vec<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Comparison {
    pub packages: Vec<String>,
    pub rows: Vec<ComparisonRow>,
}

/// Turn an HTML or plain-text content block into trimmed, non-empty lines.
fn content_lines(content: &str) -> Vec<String> {
    let with_breaks = BREAK_TAG_RE.replace_all(content, "\n");
    let text = ANY_TAG_RE.replace_all(&with_breaks, "");
    text.lines()
        .map(|line| line.trim().trim_start_matches(['-', '*', '•']).trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Text describing `keyword` in `content`, if any line mentions it.
///
/// For `Label: value` lines whose label holds the keyword only the value is kept.
pub fn extract_feature(content: &str, keyword: &str) -> Option<String> {
    let keyword = keyword.trim().to_lowercase();
    if keyword.is_empty() {
        return None;
    }

    content_lines(content)
        .into_iter()
        .find(|line| line.to_lowercase().contains(&keyword))
        .map(|line| match line.split_once(':') {
            Some((label, value))
                if label.to_lowercase().contains(&keyword) && !value.trim().is_empty() =>
            {
                value.trim().to_string()
            }
            _ => line,
        })
}

fn feature_label(keyword: &str) -> String {
    let keyword = keyword.trim();
    let mut chars = keyword.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Build the table; rows no package mentions are left out.
pub fn build_comparison(packages: &[Package], keywords: &[String]) -> Comparison {
    let rows = keywords
        .iter()
        .filter_map(|keyword| {
            let cells: Vec<Option<String>> = packages
                .iter()
                .map(|p| extract_feature(&p.content, keyword))
                .collect();
            cells.iter().any(Option::is_some).then(|| ComparisonRow {
                feature: feature_label(keyword),
                cells,
            })
        })
        .collect();

    Comparison {
        packages: packages.iter().map(|p| p.name.clone()).collect(),
        rows,
    }
}

/// Escaped HTML table for the packages page.
pub fn render_table(comparison: &Comparison) -> String {
    let mut html = String::from("<table class=\"package-comparison\">\n<thead><tr><th>Feature</th>");
    for name in &comparison.packages {
        let _ = write!(html, "<th>{}</th>", escape_html(name));
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for row in &comparison.rows {
        let _ = write!(html, "<tr><th scope=\"row\">{}</th>", escape_html(&row.feature));
        for cell in &row.cells {
            match cell {
                Some(text) => {
                    let _ = write!(html, "<td>{}</td>", escape_html(text));
                }
                None => html.push_str("<td>&mdash;</td>"),
            }
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(id: i64, name: &str, content: &str) -> Package {
        Package {
            id,
            name: name.into(),
            price: None,
            content: content.into(),
        }
    }

    #[test]
    fn test_extracts_value_after_label() {
        let content = "Cement: UltraTech\nSteel: JSW Fe 550";
        assert_eq!(extract_feature(content, "cement").as_deref(), Some("UltraTech"));
        assert_eq!(extract_feature(content, "STEEL").as_deref(), Some("JSW Fe 550"));
        assert_eq!(extract_feature(content, "plumbing"), None);
    }

    #[test]
    fn test_keeps_whole_line_without_label() {
        let content = "- Teak wood main door with brass fittings\n- Flush doors inside";
        assert_eq!(
            extract_feature(content, "door").as_deref(),
            Some("Teak wood main door with brass fittings")
        );
    }

    #[test]
    fn test_reads_html_blocks() {
        let content = "<ul><li><strong>Flooring:</strong> Italian marble</li><li>Kitchen: Modular</li></ul>";
        assert_eq!(extract_feature(content, "flooring").as_deref(), Some("Italian marble"));
        assert_eq!(extract_feature(content, "kitchen").as_deref(), Some("Modular"));
    }

    #[test]
    fn test_comparison_skips_unmentioned_rows() {
        let packages = vec![
            package(1, "Basic", "Cement: ACC\nPainting: Tractor emulsion"),
            package(2, "Premium", "Cement: UltraTech\nKitchen: Modular"),
        ];
        let keywords: Vec<String> = ["cement", "kitchen", "lift"].iter().map(|s| s.to_string()).collect();

        let comparison = build_comparison(&packages, &keywords);
        assert_eq!(comparison.packages, vec!["Basic", "Premium"]);
        assert_eq!(
            comparison.rows,
            vec![
                ComparisonRow {
                    feature: "Cement".into(),
                    cells: vec![Some("ACC".into()), Some("UltraTech".into())],
                },
                ComparisonRow {
                    feature: "Kitchen".into(),
                    cells: vec![None, Some("Modular".into())],
                },
            ]
        );
    }

    #[test]
    fn test_rendered_table_is_escaped() {
        let packages = vec![package(1, "<b>Basic</b>", "Cement: <script>x</script> ACC")];
        let comparison = build_comparison(&packages, &["cement".to_string()]);
        let html = render_table(&comparison);

        assert!(!html.contains("<script>"));
        assert!(!html.contains("<b>"));
        assert!(html.contains("&lt;b&gt;Basic&lt;/b&gt;"));
    }
}
