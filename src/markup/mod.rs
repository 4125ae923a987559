//! Markup extraction without exposing markup details to callers.
//!
//! The postback machinery needs exactly two things from a response body:
//! values of named `<input>` elements (the rotating hidden-state tokens) and
//! the contents of the results grid. The `MarkupExtractor` trait captures
//! that surface; `CssExtractor` implements it with the `scraper` crate.

use scraper::{Html, Selector};

/// One row of the results grid, reduced to what the page parser needs:
/// cell texts plus enough structure to recognize the pager row.
#[derive(Debug, Clone, Default)]
pub struct GridRow {
    /// Trimmed text of each `<td>` cell, in document order.
    pub cells: Vec<String>,
    /// `href` attributes of hyperlinks inside the row.
    pub link_hrefs: Vec<String>,
    /// Trimmed text of inline `<span>` labels inside the row.
    pub label_texts: Vec<String>,
}

impl GridRow {
    /// Whether the row renders pager controls rather than data. Single-page
    /// responses have no pager row at all, so "last row" alone is not a
    /// valid test — the row must actually contain a link or a label.
    pub fn looks_like_pager(&self) -> bool {
        !self.link_hrefs.is_empty() || !self.label_texts.is_empty()
    }
}

/// Structured access to an HTML response body.
pub trait MarkupExtractor: Send + Sync {
    /// Value of the named `<input>` element, if present.
    fn input_value(&self, html: &str, name: &str) -> Option<String>;

    /// All `<tr>` rows of the table with the given element id, or `None`
    /// when the table is absent.
    fn grid_rows(&self, html: &str, table_id: &str) -> Option<Vec<GridRow>>;
}

/// CSS-selector based extractor built on `scraper`.
pub struct CssExtractor;

impl MarkupExtractor for CssExtractor {
    fn input_value(&self, html: &str, name: &str) -> Option<String> {
        let document = Html::parse_document(html);
        let sel = Selector::parse(&format!(r#"input[name="{name}"]"#)).ok()?;
        document
            .select(&sel)
            .next()
            .map(|el| el.value().attr("value").unwrap_or("").to_string())
    }

    fn grid_rows(&self, html: &str, table_id: &str) -> Option<Vec<GridRow>> {
        let document = Html::parse_document(html);
        let table_sel = Selector::parse(&format!(r#"table[id="{table_id}"]"#)).ok()?;
        let tr_sel = Selector::parse("tr").unwrap();
        let td_sel = Selector::parse("td").unwrap();
        let a_sel = Selector::parse("a[href]").unwrap();
        let span_sel = Selector::parse("span").unwrap();

        let table = document.select(&table_sel).next()?;

        let rows = table
            .select(&tr_sel)
            .map(|tr| GridRow {
                cells: tr
                    .select(&td_sel)
                    .map(|td| td.text().collect::<Vec<_>>().join(" ").trim().to_string())
                    .collect(),
                link_hrefs: tr
                    .select(&a_sel)
                    .map(|a| a.value().attr("href").unwrap_or("").to_string())
                    .collect(),
                label_texts: tr
                    .select(&span_sel)
                    .map(|s| s.text().collect::<Vec<_>>().join(" ").trim().to_string())
                    .collect(),
            })
            .collect();

        Some(rows)
    }
}
