/// Report provider trait and implementations
pub mod downdetector;
pub mod mock;

pub use downdetector::DowndetectorClient;
pub use mock::MockProvider;

use crate::error::ProviderError;
use crate::series::ServiceSeries;
use std::future::Future;
use std::pin::Pin;

/// Source of report and baseline series for a service
pub trait ReportProvider: Send + Sync {
    fn fetch<'a>(
        &'a self,
        slug: &'a str,
        country: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<ServiceSeries, ProviderError>> + Send + 'a>>;
}
