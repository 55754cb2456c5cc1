use crate::error::ProviderError;
use crate::provider::ReportProvider;
use crate::series::{DataPoint, ServiceSeries};
use chrono::Utc;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

/// Scripted provider for tests
///
/// Responses are keyed by slug. A slug without a scripted response fails with
/// `ProviderError::BackendError`.
#[derive(Default)]
pub struct MockProvider {
    responses: HashMap<String, Result<ServiceSeries, ProviderError>>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a successful response for `slug`
    pub fn with_series(mut self, slug: &str, series: ServiceSeries) -> Self {
        self.responses.insert(slug.to_string(), Ok(series));
        self
    }

    /// Script a response whose last points carry `reports` and `baseline`
    pub fn with_latest(self, slug: &str, reports: f64, baseline: f64) -> Self {
        let now = Utc::now();
        self.with_series(
            slug,
            ServiceSeries::new(
                vec![DataPoint::new(now, reports)],
                vec![DataPoint::new(now, baseline)],
            ),
        )
    }

    /// Script a failure for `slug`
    pub fn with_error(mut self, slug: &str, error: ProviderError) -> Self {
        self.responses.insert(slug.to_string(), Err(error));
        self
    }

    /// `(slug, country)` pairs in the order they were fetched
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }
}

impl ReportProvider for MockProvider {
    fn fetch<'a>(
        &'a self,
        slug: &'a str,
        country: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<ServiceSeries, ProviderError>> + Send + 'a>> {
        Box::pin(async move {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push((slug.to_string(), country.to_string()));
            }

            match self.responses.get(slug) {
                Some(response) => response.clone(),
                None => Err(ProviderError::BackendError(format!(
                    "no scripted response for '{}'",
                    slug
                ))),
            }
        })
    }
}
