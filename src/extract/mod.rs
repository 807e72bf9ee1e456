//! Extraction of the ranked bank table from raw markup
//!
//! The document carries the ranking in the first table body. Each data row
//! looks like:
//!
//! ```html
//! <tr>
//!   <td>1</td>
//!   <td><a href="..."><img alt="flag"></a> <a href="...">JPMorgan Chase</a></td>
//!   <td>432.92
//!   </td>
//! </tr>
//! ```
//!
//! The bank name is the text of the *second* link in the second cell (the first
//! link wraps a flag icon). The market cap text always ends with one suffix
//! character (a line break in the published page) which is dropped before the
//! number is parsed.

pub mod source;

pub use source::{DocumentSource, FileSource, InMemorySource};
#[cfg(feature = "http")]
pub use source::HttpSource;

use crate::error::{EtlError, Result};
use crate::types::BankRecord;
use hashbrown::HashSet;
use scraper::{ElementRef, Html, Selector};

const NAME_CELL: usize = 1;
const MARKET_CAP_CELL: usize = 2;
const NAME_LINK: usize = 1;

/// Parses the ranked bank table out of an HTML document
pub struct Extractor {
    body: Selector,
    row: Selector,
    cell: Selector,
    link: Selector,
}

impl Extractor {
    /// Create an extractor with compiled selectors
    pub fn new() -> Result<Self> {
        Ok(Self {
            body: selector("tbody")?,
            row: selector("tr")?,
            cell: selector("td")?,
            link: selector("a")?,
        })
    }

    /// Extract bank records in document order, keeping the first row per name
    ///
    /// Rows without data cells (header rows) are skipped. Any other row that
    /// lacks a name or carries an unparseable value fails the whole extraction.
    pub fn extract(&self, markup: &str) -> Result<Vec<BankRecord>> {
        let document = Html::parse_document(markup);
        let body = document
            .select(&self.body)
            .next()
            .ok_or_else(|| EtlError::Parse("no table body found in document".to_string()))?;

        let mut seen: HashSet<String> = HashSet::new();
        let mut records = Vec::new();

        for (row_idx, row) in body.select(&self.row).enumerate() {
            let cells: Vec<ElementRef> = row.select(&self.cell).collect();
            if cells.is_empty() {
                continue;
            }

            let name = self.bank_name(row_idx, &cells)?;
            let market_cap = market_cap(row_idx, &cells)?;

            if seen.contains(&name) {
                log::debug!("Row {}: skipping duplicate bank {:?}", row_idx, name);
                continue;
            }
            seen.insert(name.clone());
            records.push(BankRecord { name, market_cap });
        }

        log::debug!("Extracted {} distinct banks", records.len());
        Ok(records)
    }

    fn bank_name(&self, row: usize, cells: &[ElementRef]) -> Result<String> {
        let cell = cells.get(NAME_CELL).ok_or_else(|| EtlError::RowParse {
            row,
            reason: format!("expected a name cell, found {} cell(s)", cells.len()),
        })?;

        let link = cell
            .select(&self.link)
            .nth(NAME_LINK)
            .ok_or_else(|| EtlError::RowParse {
                row,
                reason: "name cell has no second link".to_string(),
            })?;

        let name = link.text().next().map(str::trim).unwrap_or_default();
        if name.is_empty() {
            return Err(EtlError::RowParse {
                row,
                reason: "name link has no text".to_string(),
            });
        }

        Ok(name.to_string())
    }
}

fn market_cap(row: usize, cells: &[ElementRef]) -> Result<f64> {
    let cell = cells.get(MARKET_CAP_CELL).ok_or_else(|| EtlError::RowParse {
        row,
        reason: format!("expected a market cap cell, found {} cell(s)", cells.len()),
    })?;

    let raw = cell.text().next().unwrap_or_default();
    parse_amount(raw).ok_or_else(|| EtlError::MalformedValue {
        location: format!("row {}", row),
        value: raw.to_string(),
    })
}

/// Drop exactly one trailing suffix character and parse the rest
fn parse_amount(raw: &str) -> Option<f64> {
    let mut chars = raw.chars();
    chars.next_back()?;

    let value: f64 = chars.as_str().trim().parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| EtlError::Parse(format!("invalid selector {:?}: {:?}", css, e)))
}

/// Extract bank records from markup with a default extractor
pub fn extract(markup: &str) -> Result<Vec<BankRecord>> {
    Extractor::new()?.extract(markup)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(rank: u32, name: &str, value: &str) -> String {
        format!(
            "<tr><td>{rank}</td><td><span class=\"flagicon\"><a href=\"/wiki/Flag\">\
             <img alt=\"flag\"></a></span> <a href=\"/wiki/{name}\">{name}</a></td>\
             <td>{value}\n</td></tr>"
        )
    }

    fn document(rows: &[String]) -> String {
        format!(
            "<html><body><table class=\"wikitable\"><tbody>\
             <tr><th>Rank</th><th>Bank name</th><th>Market cap<br>(US$ billion)</th></tr>\
             {}</tbody></table></body></html>",
            rows.concat()
        )
    }

    #[test]
    fn test_extract_in_document_order() {
        let html = document(&[
            row(1, "JPMorgan Chase", "432.92"),
            row(2, "Bank of America", "231.52"),
            row(3, "Industrial and Commercial Bank of China", "194.56"),
        ]);

        let records = extract(&html).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], BankRecord::new("JPMorgan Chase", 432.92));
        assert_eq!(records[1].name, "Bank of America");
        assert_eq!(records[2].market_cap, 194.56);
    }

    #[test]
    fn test_duplicate_name_keeps_first() {
        let html = document(&[
            row(1, "HSBC", "160.68"),
            row(2, "HSBC", "999.99"),
            row(3, "BNP Paribas", "87.12"),
        ]);

        let records = extract(&html).unwrap();
        assert_eq!(
            records,
            vec![
                BankRecord::new("HSBC", 160.68),
                BankRecord::new("BNP Paribas", 87.12)
            ]
        );
    }

    #[test]
    fn test_name_is_second_link() {
        let html = document(&[
            "<tr><td>1</td><td><a href=\"#a\">ref</a><a href=\"#b\">Citigroup</a>\
             <a href=\"#c\">note</a></td><td>95.0\n</td></tr>"
                .to_string(),
        ]);

        let records = extract(&html).unwrap();
        assert_eq!(records[0].name, "Citigroup");
    }

    #[test]
    fn test_only_first_table_body_is_read() {
        let html = format!(
            "{}<table><tbody>{}</tbody></table>",
            document(&[row(1, "Wells Fargo", "155.87")]),
            row(1, "Morgan Stanley", "140.83")
        );

        let records = extract(&html).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Wells Fargo");
    }

    #[test]
    fn test_no_table_body() {
        let err = extract("<html><body><p>No tables here</p></body></html>").unwrap_err();
        assert!(matches!(err, EtlError::Parse(_)));
    }

    #[test]
    fn test_missing_second_link_reports_row() {
        let html = document(&[
            row(1, "UBS", "75.0"),
            "<tr><td>2</td><td><a href=\"#\">Lonely</a></td><td>10.0\n</td></tr>".to_string(),
        ]);

        match extract(&html).unwrap_err() {
            EtlError::RowParse { row, .. } => assert_eq!(row, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_value_is_fatal() {
        let html = document(&[row(1, "Barclays", "n/a")]);

        match extract(&html).unwrap_err() {
            EtlError::MalformedValue { location, value } => {
                assert_eq!(location, "row 1");
                assert_eq!(value, "n/a\n");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_amount_strips_one_suffix() {
        assert_eq!(parse_amount("432.92\n"), Some(432.92));
        assert_eq!(parse_amount("87.5%"), Some(87.5));
        assert_eq!(parse_amount("100"), Some(10.0));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("-3.0\n"), None);
        assert_eq!(parse_amount("inf\n"), None);
    }
}
