use crate::error::FetchError;
use crate::model::{Application, Host};

/// Downloads the box art of one application from its host.
///
/// Every failure mode (transport, timeout, status, empty body) is reported as
/// a [`FetchError`]; callers make a single attempt per session.
pub trait AssetFetcher: Send + Sync {
    fn fetch(
        &self,
        host: &Host,
        app: &Application,
    ) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}
