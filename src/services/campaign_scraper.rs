use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;

use crate::{
    domain::{build_snapshot, CampaignSnapshot, ExtractionError, RawCampaignFields},
    services::{FetchError, PageFetcher},
};

/// Current knowledge of the target site's markup, kept as data so it can be
/// swapped out when the site inevitably changes its class names again.
const DEFAULT_SELECTORS: &str = include_str!("campaign_selectors.json");

#[derive(thiserror::Error, Debug)]
pub enum TrackerError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

/// One structural probe against the document tree.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldQuery {
    /// Collapsed text of the first element matching a CSS selector list
    /// whose text is non-empty.
    Selector { query: String },
    /// As `Selector`, but the element text must also contain `marker`.
    SelectorWithText { query: String, marker: String },
    /// First `<span>` among the following siblings of any element whose own
    /// text contains `marker`, e.g. a currency symbol.
    SpanAfterMarker { marker: String },
}

/// Ordered query lists, one per target field. Queries run in declared order
/// and the first non-empty match wins, so the list should go from the most
/// specific selector to the loosest heuristic.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldSelectorSet {
    pub amount_raised: Vec<FieldQuery>,
    pub supporters: Vec<FieldQuery>,
    pub days_left: Vec<FieldQuery>,
}

impl FieldSelectorSet {
    pub fn default_set() -> Self {
        serde_json::from_str(DEFAULT_SELECTORS)
            .expect("Failed to parse the embedded selector config.")
    }
}

/// Fetches the campaign page and derives a snapshot from it. The single
/// entry point composing fetch, extract and aggregate.
pub async fn get_campaign_snapshot(
    fetcher: &PageFetcher,
    url: &str,
    goal: f64,
) -> Result<CampaignSnapshot, TrackerError> {
    let html = fetcher.fetch(url).await?;
    let fields = extract_campaign_fields(&html);

    log::debug!(
        "Raw values | amount: {:?} | supporters: {:?} | days left: {:?} | goal: {}",
        fields.amount_raised,
        fields.supporters,
        fields.days_left,
        goal
    );

    let snapshot = build_snapshot(&fields, goal)?;

    log::info!(
        "Campaign at {}% | raised {} of {} | {} supporters | {} days left",
        snapshot.percentage,
        snapshot.amount_raised,
        snapshot.goal,
        snapshot.supporters,
        snapshot.days_left
    );

    Ok(snapshot)
}

pub fn extract_campaign_fields(html: &str) -> RawCampaignFields {
    extract_with_selectors(html, &FieldSelectorSet::default_set())
}

/// Parses the page leniently and probes it with the given selector set.
/// Malformed markup degrades instead of aborting; missing nodes simply mean
/// an empty string for that field.
pub fn extract_with_selectors(html: &str, selectors: &FieldSelectorSet) -> RawCampaignFields {
    let document = Html::parse_document(html);
    if !document.errors.is_empty() {
        log::debug!(
            "Recovered from {} markup irregularities while parsing",
            document.errors.len()
        );
    }

    RawCampaignFields {
        amount_raised: first_match(&document, &selectors.amount_raised),
        supporters: first_match(&document, &selectors.supporters),
        days_left: first_match(&document, &selectors.days_left),
    }
}

fn first_match(document: &Html, queries: &[FieldQuery]) -> String {
    queries
        .iter()
        .filter_map(|query| evaluate_query(document, query))
        .next()
        .unwrap_or_default()
}

fn evaluate_query(document: &Html, query: &FieldQuery) -> Option<String> {
    match query {
        FieldQuery::Selector { query } => {
            let selector = parse_selector(query)?;
            document
                .select(&selector)
                .map(collapsed_text)
                .find(|text| !text.is_empty())
        }
        FieldQuery::SelectorWithText { query, marker } => {
            let selector = parse_selector(query)?;
            document
                .select(&selector)
                .map(collapsed_text)
                .find(|text| !text.is_empty() && text.contains(marker.as_str()))
        }
        FieldQuery::SpanAfterMarker { marker } => {
            let everything = Selector::parse("*").unwrap();
            document
                .select(&everything)
                .filter(|element| direct_text(*element).contains(marker.as_str()))
                .find_map(|element| {
                    element
                        .next_siblings()
                        .filter_map(ElementRef::wrap)
                        .find(|sibling| sibling.value().name() == "span")
                        .map(collapsed_text)
                        .filter(|text| !text.is_empty())
                })
        }
    }
}

fn parse_selector(query: &str) -> Option<Selector> {
    match Selector::parse(query) {
        Ok(selector) => Some(selector),
        Err(e) => {
            log::warn!("Skipping invalid selector {:?}: {:?}", query, e);
            None
        }
    }
}

/// Text of the element and its descendants with runs of whitespace collapsed.
fn collapsed_text(element: ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text nodes sitting directly under the element, descendants excluded.
fn direct_text(element: ElementRef) -> String {
    element
        .children()
        .filter_map(|child| child.value().as_text())
        .map(|text| &*text.text)
        .collect()
}

#[cfg(test)]
mod tests {
    use scraper::Selector;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{
        extract_campaign_fields, extract_with_selectors, get_campaign_snapshot, FieldQuery,
        FieldSelectorSet, TrackerError,
    };
    use crate::configuration::ScraperSettings;
    use crate::services::PageFetcher;

    const CAMPAIGN_PAGE: &str = r#"
        <html><body>
            <div class="text-2xl font-bold"><span>USD</span><span>$12,500</span></div>
            <div class="text-rebuild-gray-500">
                <span class="text-rebuild-dark">321 supporters</span>
                <span class="text-black-400">12 days left</span>
            </div>
        </body></html>
    "#;

    fn amount_only(queries: Vec<FieldQuery>) -> FieldSelectorSet {
        FieldSelectorSet {
            amount_raised: queries,
            supporters: vec![],
            days_left: vec![],
        }
    }

    #[test]
    fn default_selectors_extract_a_campaign_page() {
        let fields = extract_campaign_fields(CAMPAIGN_PAGE);

        assert_eq!(fields.amount_raised, "$12,500");
        assert_eq!(fields.supporters, "321 supporters");
        assert_eq!(fields.days_left, "12 days left");
    }

    #[test]
    fn third_query_wins_when_earlier_ones_miss() {
        let selectors = amount_only(vec![
            FieldQuery::Selector {
                query: "div.missing span".to_string(),
            },
            FieldQuery::SelectorWithText {
                query: "p.total".to_string(),
                marker: "€".to_string(),
            },
            FieldQuery::Selector {
                query: "p.total".to_string(),
            },
        ]);

        let fields =
            extract_with_selectors(r#"<p class="total">$9,000</p>"#, &selectors);

        assert_eq!(fields.amount_raised, "$9,000");
    }

    #[test]
    fn earlier_match_short_circuits_later_queries() {
        let selectors = amount_only(vec![
            FieldQuery::Selector {
                query: "p.first".to_string(),
            },
            FieldQuery::Selector {
                query: "p.second".to_string(),
            },
        ]);

        let fields = extract_with_selectors(
            r#"<p class="first">$100</p><p class="second">$999</p>"#,
            &selectors,
        );

        assert_eq!(fields.amount_raised, "$100");
    }

    #[test]
    fn span_after_marker_finds_the_sibling_span() {
        let selectors = amount_only(vec![FieldQuery::SpanAfterMarker {
            marker: "$".to_string(),
        }]);

        let fields = extract_with_selectors(
            r#"<div><b>Raised $</b><span>4,200</span></div>"#,
            &selectors,
        );

        assert_eq!(fields.amount_raised, "4,200");
    }

    #[test]
    fn invalid_selector_is_skipped_not_fatal() {
        let selectors = amount_only(vec![
            FieldQuery::Selector {
                query: "div[[".to_string(),
            },
            FieldQuery::Selector {
                query: "p".to_string(),
            },
        ]);

        let fields = extract_with_selectors("<p>$55</p>", &selectors);

        assert_eq!(fields.amount_raised, "$55");
    }

    #[test]
    fn unclosed_tags_still_extract() {
        let html = r#"<div class="text-2xl"><b>almost there<span>USD</span><span>$500"#;

        let fields = extract_campaign_fields(html);

        assert_eq!(fields.amount_raised, "$500");
    }

    #[test]
    fn unmatched_document_yields_empty_fields_not_errors() {
        let fields = extract_campaign_fields("<html><body><p>nothing here</p></body></html>");

        assert_eq!(fields.amount_raised, "");
        assert_eq!(fields.supporters, "");
        assert_eq!(fields.days_left, "");
    }

    #[test]
    fn embedded_selector_config_is_valid() {
        let set = FieldSelectorSet::default_set();

        for queries in [&set.amount_raised, &set.supporters, &set.days_left] {
            assert!(!queries.is_empty());
            for query in queries {
                if let FieldQuery::Selector { query }
                | FieldQuery::SelectorWithText { query, .. } = query
                {
                    assert!(Selector::parse(query).is_ok(), "bad selector: {}", query);
                }
            }
        }
    }

    fn test_fetcher() -> PageFetcher {
        PageFetcher::new(&ScraperSettings {
            timeout_seconds: 5,
            user_agent: Some("pulse-test-agent".to_string()),
        })
    }

    #[tokio::test]
    async fn snapshot_pipeline_end_to_end() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(CAMPAIGN_PAGE))
            .mount(&server)
            .await;

        let snapshot = get_campaign_snapshot(&test_fetcher(), &server.uri(), 25_000.0)
            .await
            .unwrap();

        assert_eq!(snapshot.amount_raised, 12_500.0);
        assert_eq!(snapshot.percentage, 50.0);
        assert_eq!(snapshot.supporters, 321);
        assert_eq!(snapshot.days_left, 12);
    }

    #[tokio::test]
    async fn fetch_failure_surfaces_as_tracker_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(""))
            .mount(&server)
            .await;

        let result = get_campaign_snapshot(&test_fetcher(), &server.uri(), 25_000.0).await;

        assert!(matches!(result, Err(TrackerError::Fetch(_))));
    }

    #[tokio::test]
    async fn missing_amount_surfaces_as_tracker_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<html><body>redesigned</body></html>"),
            )
            .mount(&server)
            .await;

        let result = get_campaign_snapshot(&test_fetcher(), &server.uri(), 25_000.0).await;

        assert!(matches!(result, Err(TrackerError::Extraction(_))));
    }
}
