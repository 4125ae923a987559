//! Page result parser: one response body → records + pager position.
//!
//! Pure function over the markup extractor's view of the grid. Pager
//! position is returned as a value; it is never parser-internal mutable
//! state, so it cannot be read before being set.

use crate::markup::{GridRow, MarkupExtractor};
use crate::postback::GRID_ID;
use crate::types::{only_digits, PagerPosition, Registration, RECORD_FIELD_COUNT};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// Everything extracted from one response body.
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// Records parsed from the grid's body rows, in document order.
    pub records: Vec<Registration>,
    /// Pager position for this response.
    pub pager: PagerPosition,
    /// Diagnostic set when malformed pager markup forced the single-page
    /// fallback. Non-fatal; kept for observability.
    pub fallback: Option<String>,
}

fn page_arg_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Page\$(\d+)").unwrap())
}

/// Parse one response body into records plus pager position.
///
/// An absent grid (or a grid with only a header row) is "no results, single
/// page", not an error — the registry renders no pager at all for
/// single-page result sets.
pub fn parse_results_page(extractor: &dyn MarkupExtractor, html: &str) -> ParsedPage {
    let Some(rows) = extractor.grid_rows(html, GRID_ID) else {
        return ParsedPage {
            records: Vec::new(),
            pager: PagerPosition::SINGLE,
            fallback: None,
        };
    };

    if rows.len() <= 1 {
        return ParsedPage {
            records: Vec::new(),
            pager: PagerPosition::SINGLE,
            fallback: None,
        };
    }

    // The final row is the pager row only if it actually renders pager
    // controls. Some responses have exactly one page of data and no pager
    // row, so a blind "last row is the pager" split would drop a record.
    let pager_row = rows.last().filter(|r| r.looks_like_pager());
    let body_end = if pager_row.is_some() {
        rows.len() - 1
    } else {
        rows.len()
    };

    let mut records = Vec::new();
    for row in &rows[1..body_end] {
        if row.cells.len() < RECORD_FIELD_COUNT {
            // Malformed trailing row; skipping beats fabricating fields.
            debug!("skipping grid row with {} cells", row.cells.len());
            continue;
        }
        records.push(Registration {
            cnpj: only_digits(&row.cells[0]),
            ie: row.cells[1].clone(),
            razao_social: row.cells[2].clone(),
            uf: row.cells[3].clone(),
            situacao: row.cells[4].clone(),
        });
    }

    let (pager, fallback) = match pager_row {
        Some(row) => parse_pager(row),
        None => (PagerPosition::SINGLE, None),
    };

    ParsedPage {
        records,
        pager,
        fallback,
    }
}

/// Extract (current, total) from a pager row.
///
/// Current page is the inline label's integer text; total comes from the
/// `Page$<N>` argument of the row's last hyperlink (no hyperlink means the
/// current page is also the last). The registry's pager HTML has included
/// ambiguous phrasing before, so any parse failure falls back to (1, 1)
/// with a diagnostic instead of failing the page.
fn parse_pager(row: &GridRow) -> (PagerPosition, Option<String>) {
    let label = row.label_texts.first().map(String::as_str).unwrap_or("");

    let current = match label.trim().parse::<u32>() {
        Ok(n) if n >= 1 => n,
        _ => {
            return (
                PagerPosition::SINGLE,
                Some(format!("unparseable pager label {label:?}")),
            );
        }
    };

    let total = match row.link_hrefs.last() {
        None => current,
        Some(href) => match page_arg_regex()
            .captures(href)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
        {
            Some(n) => n.max(current),
            None => {
                return (
                    PagerPosition::SINGLE,
                    Some(format!("unparseable pager link {href:?}")),
                );
            }
        },
    };

    (PagerPosition { current, total }, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::CssExtractor;

    fn data_row(cnpj: &str, ie: &str) -> String {
        format!(
            "<tr><td>{cnpj}</td><td>{ie}</td><td>ACME LTDA</td><td>BA</td><td>HABILITADO</td></tr>"
        )
    }

    fn grid(rows: &str) -> String {
        format!(
            r#"<html><body><table id="Grid">
            <tr><th>CNPJ</th><th>IE</th><th>Razão Social</th><th>UF</th><th>Situação</th></tr>
            {rows}
            </table></body></html>"#
        )
    }

    #[test]
    fn test_absent_table_is_empty_single_page() {
        let page = parse_results_page(&CssExtractor, "<html><body></body></html>");
        assert!(page.records.is_empty());
        assert_eq!(page.pager, PagerPosition::SINGLE);
        assert!(page.fallback.is_none());
    }

    #[test]
    fn test_rows_without_pager_row() {
        let html = grid(&format!(
            "{}{}",
            data_row("08.408.316/6", "111"),
            data_row("12.345.678/0001-90", "222")
        ));
        let page = parse_results_page(&CssExtractor, &html);

        assert_eq!(page.records.len(), 2);
        assert_eq!(page.records[0].cnpj, "084083166");
        assert_eq!(page.records[1].cnpj, "12345678000190");
        assert_eq!(page.pager, PagerPosition::SINGLE);
        assert!(page.fallback.is_none());
    }

    #[test]
    fn test_pager_label_and_last_link() {
        let html = grid(&format!(
            "{}<tr><td colspan=\"5\">\
             <a href=\"javascript:__doPostBack('Grid','Page$1')\">1</a>\
             <span>2</span>\
             <a href=\"javascript:__doPostBack('Grid','Page$3')\">3</a>\
             <a href=\"javascript:__doPostBack('Grid','Page$5')\">...</a>\
             </td></tr>",
            data_row("111", "1")
        ));
        let page = parse_results_page(&CssExtractor, &html);

        assert_eq!(page.records.len(), 1);
        assert_eq!(
            page.pager,
            PagerPosition {
                current: 2,
                total: 5
            }
        );
        assert!(page.fallback.is_none());
    }

    #[test]
    fn test_pager_without_links_means_last_page() {
        let html = grid(&format!(
            "{}<tr><td colspan=\"5\"><span>4</span></td></tr>",
            data_row("111", "1")
        ));
        let page = parse_results_page(&CssExtractor, &html);
        assert_eq!(
            page.pager,
            PagerPosition {
                current: 4,
                total: 4
            }
        );
    }

    #[test]
    fn test_malformed_pager_falls_back_with_diagnostic() {
        let html = grid(&format!(
            "{}<tr><td colspan=\"5\"><span>Página</span></td></tr>",
            data_row("111", "1")
        ));
        let page = parse_results_page(&CssExtractor, &html);

        assert_eq!(page.pager, PagerPosition::SINGLE);
        let diag = page.fallback.expect("diagnostic recorded");
        assert!(diag.contains("pager label"));
        // The data row still parsed.
        assert_eq!(page.records.len(), 1);
    }

    #[test]
    fn test_malformed_pager_link_falls_back() {
        let html = grid(&format!(
            "{}<tr><td colspan=\"5\"><span>2</span>\
             <a href=\"javascript:__doPostBack('Grid','Next')\">&gt;</a></td></tr>",
            data_row("111", "1")
        ));
        let page = parse_results_page(&CssExtractor, &html);
        assert_eq!(page.pager, PagerPosition::SINGLE);
        assert!(page.fallback.is_some());
    }

    #[test]
    fn test_short_rows_are_skipped_not_defaulted() {
        let html = grid(&format!(
            "{}<tr><td>trailing</td><td>junk</td></tr>",
            data_row("111", "1")
        ));
        let page = parse_results_page(&CssExtractor, &html);

        // The two-cell row has no links or labels, so it is not the pager
        // row; it is a malformed body row and is skipped.
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].ie, "1");
    }

    #[test]
    fn test_header_only_grid() {
        let page = parse_results_page(&CssExtractor, &grid(""));
        assert!(page.records.is_empty());
        assert_eq!(page.pager, PagerPosition::SINGLE);
    }
}
