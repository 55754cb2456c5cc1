use crate::error::ProviderError;
use crate::provider::ReportProvider;
use crate::series::{DataPoint, ServiceSeries};
use chrono::{DateTime, Utc};
use log::debug;
use regex::Regex;
use reqwest::Client;
use std::future::Future;
use std::pin::Pin;
use std::sync::OnceLock;
use std::time::Duration;

/// Browser-like agent; the status pages reject obvious bots
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Client for Downdetector status pages
///
/// Each status page embeds its chart data as `{ x: '<date>', y: <count> }`
/// literals. The page lists the report series first and the baseline series
/// second, with the same number of points each.
pub struct DowndetectorClient {
    client: Client,
    base_url: Option<String>,
}

impl DowndetectorClient {
    /// Create a client that talks to `https://downdetector.<country>`
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::HttpError` if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, ProviderError> {
        Self::build(timeout, None)
    }

    /// Create a client that ignores the country and uses a fixed base URL
    ///
    /// Useful for mirrors and for tests against a local server.
    pub fn with_base_url(timeout: Duration, base_url: String) -> Result<Self, ProviderError> {
        Self::build(timeout, Some(base_url))
    }

    fn build(timeout: Duration, base_url: Option<String>) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .no_proxy()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProviderError::HttpError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    /// Status page URL for a service in a region
    fn status_url(&self, slug: &str, country: &str) -> String {
        match &self.base_url {
            Some(base) => format!("{}/status/{}/", base.trim_end_matches('/'), slug),
            None => format!("https://downdetector.{}/status/{}/", country, slug),
        }
    }

    /// Extract the report and baseline series from a status page
    pub fn parse_status_page(html: &str) -> Result<ServiceSeries, ProviderError> {
        let mut points = Vec::new();

        for caps in chart_point_regex().captures_iter(html) {
            let date = &caps[1];
            let timestamp = DateTime::parse_from_rfc3339(date)
                .map_err(|e| {
                    ProviderError::InvalidResponse(format!(
                        "Invalid chart date '{}': {}",
                        date, e
                    ))
                })?
                .with_timezone(&Utc);

            let value: f64 = caps[2].parse().map_err(|e| {
                ProviderError::InvalidResponse(format!("Invalid chart value '{}': {}", &caps[2], e))
            })?;

            points.push(DataPoint::new(timestamp, value));
        }

        // Reports come first; an odd count leaves the extra point with reports.
        let split = points.len().div_ceil(2);
        let baseline = points.split_off(split);

        Ok(ServiceSeries::new(points, baseline))
    }
}

fn chart_point_regex() -> &'static Regex {
    static CHART_POINT: OnceLock<Regex> = OnceLock::new();
    CHART_POINT.get_or_init(|| {
        Regex::new(r#"\{\s*x:\s*['"]([^'"]+)['"]\s*,\s*y:\s*(-?\d+(?:\.\d+)?)\s*,?\s*\}"#)
            .expect("chart point pattern is valid")
    })
}

impl ReportProvider for DowndetectorClient {
    fn fetch<'a>(
        &'a self,
        slug: &'a str,
        country: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<ServiceSeries, ProviderError>> + Send + 'a>> {
        Box::pin(async move {
            let url = self.status_url(slug, country);
            debug!("[{}] fetching {}", slug, url);

            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| ProviderError::HttpError(format!("HTTP request failed: {}", e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(ProviderError::BackendError(format!(
                    "Downdetector returned error {}: {}",
                    status, error_text
                )));
            }

            let html = response.text().await.map_err(|e| {
                ProviderError::InvalidResponse(format!("Failed to read status page: {}", e))
            })?;

            let series = Self::parse_status_page(&html)?;
            debug!(
                "[{}] parsed {} report points and {} baseline points",
                slug,
                series.reports.len(),
                series.baseline.len()
            );
            Ok(series)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const STATUS_PAGE: &str = r#"
<html><body>
<script type="text/javascript">
  window.DD = {};
  var data = [
    { x: '2024-05-01T09:45:00+00:00', y: 12 },
    { x: '2024-05-01T10:00:00+00:00', y: 150 },
    { x: '2024-05-01T09:45:00+00:00', y: 20 },
    { x: '2024-05-01T10:00:00+00:00', y: 50 },
  ];
</script>
</body></html>
"#;

    fn client() -> DowndetectorClient {
        DowndetectorClient::new(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_status_url_uses_country_domain() {
        let client = client();
        assert_eq!(
            client.status_url("whatsapp", "it"),
            "https://downdetector.it/status/whatsapp/"
        );
        assert_eq!(
            client.status_url("bt", "co.uk"),
            "https://downdetector.co.uk/status/bt/"
        );
    }

    #[test]
    fn test_status_url_with_base_override() {
        let client =
            DowndetectorClient::with_base_url(Duration::from_secs(5), "http://mirror/".to_string())
                .unwrap();
        assert_eq!(client.status_url("x", "it"), "http://mirror/status/x/");
    }

    #[test]
    fn test_parse_status_page_splits_series() {
        let series = DowndetectorClient::parse_status_page(STATUS_PAGE).unwrap();

        assert_eq!(series.reports.len(), 2);
        assert_eq!(series.baseline.len(), 2);
        assert_eq!(series.reports_now(), 150.0);
        assert_eq!(series.baseline_now(), 50.0);
    }

    #[test]
    fn test_parse_status_page_double_quotes_and_decimals() {
        let html = r#"{ x: "2024-05-01T10:00:00Z", y: 7.5 }, { x: "2024-05-01T10:00:00Z", y: 2 }"#;
        let series = DowndetectorClient::parse_status_page(html).unwrap();

        assert_eq!(series.reports_now(), 7.5);
        assert_eq!(series.baseline_now(), 2.0);
    }

    #[test]
    fn test_parse_status_page_without_chart() {
        let series = DowndetectorClient::parse_status_page("<html></html>").unwrap();
        assert!(series.reports.is_empty());
        assert!(series.baseline.is_empty());
        assert_eq!(series.reports_now(), 0.0);
    }

    #[test]
    fn test_parse_status_page_odd_point_count() {
        let html = "{ x: '2024-05-01T10:00:00Z', y: 9 }";
        let series = DowndetectorClient::parse_status_page(html).unwrap();
        assert_eq!(series.reports_now(), 9.0);
        assert!(series.baseline.is_empty());
    }

    #[test]
    fn test_parse_status_page_bad_date() {
        let html = "{ x: 'not a date', y: 9 }";
        let result = DowndetectorClient::parse_status_page(html);
        assert!(matches!(result, Err(ProviderError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_fetch_parses_served_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status/whatsapp/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(STATUS_PAGE, "text/html; charset=utf-8"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client =
            DowndetectorClient::with_base_url(Duration::from_secs(5), server.uri()).unwrap();

        let series = client.fetch("whatsapp", "it").await.unwrap();
        assert_eq!(series.reports_now(), 150.0);
        assert_eq!(series.baseline_now(), 50.0);

        let requests = server.received_requests().await.unwrap();
        let agent = requests[0].headers.get("user-agent").unwrap();
        assert_eq!(agent.to_str().unwrap(), USER_AGENT);
    }

    #[tokio::test]
    async fn test_fetch_non_success_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status/whatsapp/"))
            .respond_with(ResponseTemplate::new(403).set_body_string("blocked"))
            .mount(&server)
            .await;

        let client =
            DowndetectorClient::with_base_url(Duration::from_secs(5), server.uri()).unwrap();

        let result = client.fetch("whatsapp", "it").await;
        match result {
            Err(ProviderError::BackendError(message)) => {
                assert!(message.contains("403"));
                assert!(message.contains("blocked"));
            }
            other => panic!("expected backend error, got {:?}", other),
        }
    }
}
