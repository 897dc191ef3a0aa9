//! ResultsFetcher: retrieves a ready node's check outcomes.

use tracing::debug;

use crate::domain::{CheckResult, NodeId};
use crate::error::{Result, WatchError};
use crate::token::Token;
use crate::transport::AuditApi;

pub struct ResultsFetcher<'a, A: AuditApi + ?Sized> {
    api: &'a A,
    token: Option<&'a Token>,
}

impl<'a, A: AuditApi + ?Sized> ResultsFetcher<'a, A> {
    pub fn new(api: &'a A, token: Option<&'a Token>) -> Self {
        Self { api, token }
    }

    /// Fetch results for `node`. Without a token nothing is sent and
    /// `WatchError::AuthMissing` is returned.
    pub async fn fetch(&self, node: &NodeId) -> Result<Vec<CheckResult>> {
        let token = self.token.ok_or(WatchError::AuthMissing)?;
        let results = self.api.fetch_results(node, token).await?;
        debug!(node = %node, count = results.len(), "results fetched");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CheckStatus;
    use crate::transport::fake::FakeApi;

    #[tokio::test]
    async fn skips_request_without_token() {
        let api = FakeApi::with_nodes(&["n1"]);
        let fetcher = ResultsFetcher::new(&api, None);

        let err = fetcher.fetch(&"n1".into()).await.unwrap_err();
        assert!(matches!(err, WatchError::AuthMissing));
        assert_eq!(api.fetches_for("n1"), 0);
    }

    #[tokio::test]
    async fn returns_server_results() {
        let api = FakeApi::with_nodes(&["n1"]).results(
            "n1",
            Ok(vec![CheckResult::new("a", CheckStatus::Pass, "ok")]),
        );
        let token = Token::new("t").unwrap();
        let fetcher = ResultsFetcher::new(&api, Some(&token));

        let results = fetcher.fetch(&"n1".into()).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(api.fetches_for("n1"), 1);
    }
}
