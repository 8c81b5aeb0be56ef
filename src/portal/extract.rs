//! Data extraction from portal pages
//!
//! The pipeline never looks at markup itself; it asks an [`Extractor`] for
//! rows, detail counts and login form details. [`HtmlExtractor`] implements
//! the portal markup:
//!
//! - listing rows: `table#list-table tbody tr`, one `td.cell-*` per field
//! - detail counts: `dt`/`dd` pairs inside `div#packsInfoContainer`
//! - login form: hidden `redirect` input, `identity`/`credential` fields

use crate::shipment::{DetailMetrics, ListingRow};
use scraper::{ElementRef, Html, Selector};

/// Pulls structured data out of portal pages
pub trait Extractor: Send + Sync {
    /// Returns every row of a listing page, in page order
    ///
    /// Rows missing cells are still returned (with empty text) so the caller
    /// can count the page's rows.
    fn listing_rows(&self, html: &str) -> Vec<ListingRow>;

    /// Reads the counts from a detail page
    ///
    /// Returns `None` when the page has no metrics section. Individual
    /// missing counts read as zero.
    fn detail_metrics(&self, html: &str) -> Option<DetailMetrics>;

    /// Returns the post-login redirect token of a login page, if any
    fn login_redirect(&self, html: &str) -> Option<String>;

    /// Returns true if the page still shows the login form
    fn is_login_form(&self, html: &str) -> bool;
}

/// Extractor for the portal's HTML markup
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlExtractor;

impl HtmlExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for HtmlExtractor {
    fn listing_rows(&self, html: &str) -> Vec<ListingRow> {
        let document = Html::parse_document(html);

        let Ok(row_selector) = Selector::parse("table#list-table tbody tr") else {
            return Vec::new();
        };
        let Ok(link_selector) = Selector::parse("td.cell-externalId a") else {
            return Vec::new();
        };

        document
            .select(&row_selector)
            .map(|row| {
                let link = row.select(&link_selector).next();

                ListingRow {
                    id: link.map(|a| element_text(&a)),
                    created_at: cell_text(&row, "cell-createdAt").unwrap_or_default(),
                    unload_started_at: cell_text(&row, "cell-unloadStartedAt")
                        .unwrap_or_else(|| "-".to_string()),
                    closed_at: cell_text(&row, "cell-closedAt"),
                    status: cell_text(&row, "cell-status").unwrap_or_default(),
                    detail_href: link
                        .and_then(|a| a.value().attr("href"))
                        .map(|href| href.to_string()),
                }
            })
            .collect()
    }

    fn detail_metrics(&self, html: &str) -> Option<DetailMetrics> {
        let document = Html::parse_document(html);
        let container_selector = Selector::parse("div#packsInfoContainer").ok()?;
        let container = document.select(&container_selector).next()?;

        Some(DetailMetrics {
            sent: labelled_number(&container, "Sent"),
            received: labelled_number(&container, "Received"),
            excess: labelled_number(&container, "Excess"),
        })
    }

    fn login_redirect(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        let selector = Selector::parse(r#"input[name="redirect"]"#).ok()?;

        document
            .select(&selector)
            .next()
            .and_then(|input| input.value().attr("value"))
            .map(|value| value.to_string())
    }

    fn is_login_form(&self, html: &str) -> bool {
        html.contains("identity") && html.contains("credential")
    }
}

/// Trimmed text of the first `td` with the given class
fn cell_text(row: &ElementRef, class: &str) -> Option<String> {
    let selector = Selector::parse(&format!("td.{}", class)).ok()?;
    row.select(&selector).next().map(|cell| element_text(&cell))
}

fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Digits of the `dd` following the first `dt` whose text contains `label`
fn labelled_number(container: &ElementRef, label: &str) -> u64 {
    let Ok(dt_selector) = Selector::parse("dt") else {
        return 0;
    };

    let Some(dt) = container
        .select(&dt_selector)
        .find(|dt| dt.text().collect::<String>().contains(label))
    else {
        return 0;
    };

    let Some(dd) = dt
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "dd")
    else {
        return 0;
    };

    let digits: String = dd
        .text()
        .collect::<String>()
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();

    digits.parse().unwrap_or(0)
}
