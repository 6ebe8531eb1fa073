use scraper::{ElementRef, Html, Selector};
use tracing::trace;
use url::Url;

use crate::model::Contract;
use crate::{Error, Result};

const BLOCK_SEL: &str = "div.search-registry-entry-block";
const NUMBER_SEL: &str = "div.registry-entry__header-mid__number";
const STATUS_SEL: &str = "div.registry-entry__header-mid__title";
const CUSTOMER_SEL: &str = "div.registry-entry__body-href";
const IDENTIFIER_SEL: &str = "div.registry-entry__body-value";
const PRICE_SEL: &str = "div.price-block__value";
const DATE_SEL: &str = "div.data-block__value";
const LINK_SEL: &str = "a";

/// Conclusion, execution and publication dates are mandatory in the date group,
/// the update date is the optional fourth.
const MIN_DATES: usize = 3;
const MAX_DATES: usize = 4;

const NBSP: char = '\u{a0}';
const NUMBER_SIGN: char = '№';

/// The date group of a listing block did not have the expected 3 or 4 elements,
/// so the positional mapping to date fields can't be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateGroupAnomaly {
    pub found: usize,
}

impl DateGroupAnomaly {
    pub fn describe(&self) -> String {
        if self.found < MIN_DATES {
            format!(
                "expected at least {MIN_DATES} date values, found {}; dates left unset",
                self.found
            )
        } else {
            format!(
                "expected at most {MAX_DATES} date values, found {}; extra values ignored",
                self.found
            )
        }
    }
}

struct Selectors {
    block: Selector,
    number: Selector,
    status: Selector,
    customer: Selector,
    identifier: Selector,
    price: Selector,
    date: Selector,
    link: Selector,
}

/// Turns registry listing markup into [`Contract`] records.
///
/// Selectors are compiled once in [`ContractExtractor::new`], after that
/// extraction never fails: a missing marker only leaves its field unset.
pub struct ContractExtractor {
    base_url: Url,
    sel: Selectors,
}

impl ContractExtractor {
    /// `base_url` is what relative links in the listing are resolved against.
    pub fn new(base_url: Url) -> Result<Self> {
        let sel = Selectors {
            block: create_selector(BLOCK_SEL)?,
            number: create_selector(NUMBER_SEL)?,
            status: create_selector(STATUS_SEL)?,
            customer: create_selector(CUSTOMER_SEL)?,
            identifier: create_selector(IDENTIFIER_SEL)?,
            price: create_selector(PRICE_SEL)?,
            date: create_selector(DATE_SEL)?,
            link: create_selector(LINK_SEL)?,
        };
        Ok(Self { base_url, sel })
    }

    /// Returns the outer markup of every listing block on a results page, in document order.
    pub fn split_blocks(&self, page_html: &str) -> Vec<String> {
        let doc = Html::parse_document(page_html);
        doc.select(&self.sel.block).map(|block| block.html()).collect()
    }

    pub fn parse(&self, block_markup: &str) -> Contract {
        self.parse_with_diagnostics(block_markup).0
    }

    /// Same as [`ContractExtractor::parse`] but also reports when the date group
    /// doesn't look the way the positional mapping expects.
    pub fn parse_with_diagnostics(
        &self,
        block_markup: &str,
    ) -> (Contract, Option<DateGroupAnomaly>) {
        let div = Html::parse_fragment(block_markup);
        let root = div.root_element();
        let mut contract = Contract::default();

        if let Some(link) = self.first_link(root, &self.sel.number) {
            contract.number = Some(element_text(link));
            contract.url = self.resolve_href(link);
        }

        contract.status = first_match(root, &self.sel.status).map(element_text);

        if let Some(link) = self.first_link(root, &self.sel.customer) {
            contract.customer_name = Some(element_text(link));
            contract.customer_url = self.resolve_href(link);
        }

        contract.contract_identifier = first_match(root, &self.sel.identifier)
            .map(|el| strip_number_sign(&element_text(el)));

        contract.price =
            first_match(root, &self.sel.price).map(|el| normalize_price(&element_text(el)));

        let dates: Vec<String> = root.select(&self.sel.date).map(element_text).collect();
        let anomaly = (!(MIN_DATES..=MAX_DATES).contains(&dates.len()))
            .then_some(DateGroupAnomaly { found: dates.len() });

        // Dates carry no label in the listing, so they are mapped by position.
        if dates.len() >= MIN_DATES {
            let mut dates = dates.into_iter();
            contract.conclusion_date = dates.next();
            contract.execution_date = dates.next();
            contract.publication_date = dates.next();
            contract.update_date = dates.next();
        }

        (contract, anomaly)
    }

    /// First `<a>` inside the first element matching `container`.
    fn first_link<'a>(
        &self,
        root: ElementRef<'a>,
        container: &Selector,
    ) -> Option<ElementRef<'a>> {
        first_match(root, container)?.select(&self.sel.link).next()
    }

    fn resolve_href(&self, link: ElementRef) -> Option<String> {
        let href = link.value().attr("href")?.trim();
        match self.base_url.join(href) {
            Ok(url) => Some(url.to_string()),
            Err(e) => {
                trace!(href, error = %e, "unresolvable link");
                None
            }
        }
    }
}

#[inline]
fn create_selector(sel_str: &str) -> Result<Selector> {
    Selector::parse(sel_str).map_err(|_| Error::Selector(sel_str.into()))
}

#[inline]
fn first_match<'a>(root: ElementRef<'a>, sel: &Selector) -> Option<ElementRef<'a>> {
    root.select(sel).next()
}

#[inline]
fn element_text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// "№ 0123456789" -> "0123456789"
fn strip_number_sign(text: &str) -> String {
    text.trim_start_matches(NUMBER_SIGN).trim().to_string()
}

/// The registry uses a non-breaking space as the thousands separator.
fn normalize_price(text: &str) -> String {
    text.replace(NBSP, " ")
}
