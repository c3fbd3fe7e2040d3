//! HTTP page fetcher for the score listing endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use scorepull_shared::{
    PageContent, PageRequest, Result, ScoreEnvelope, ScorePullError, SourceConfig,
};

use crate::PageFetcher;

/// User-Agent string for page requests.
const USER_AGENT: &str = concat!("scorepull/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow per request.
const MAX_REDIRECTS: usize = 5;

/// Fetches pages over HTTP, one GET per page, no retries.
pub struct HttpPageFetcher {
    client: Client,
    base_url: Url,
    source: SourceConfig,
}

impl HttpPageFetcher {
    /// Create a fetcher for the given source. Fails if the base URL does not parse.
    pub fn new(source: SourceConfig) -> Result<Self> {
        let base_url = Url::parse(&source.base_url).map_err(|e| {
            ScorePullError::config(format!("invalid base_url '{}': {e}", source.base_url))
        })?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| ScorePullError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            source,
        })
    }

    /// Full request URL for a page: base URL plus the fixed query context.
    pub fn page_url(&self, request: &PageRequest) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("componentId", &self.source.component_id)
            .append_pair("from", &self.source.score_from.to_string())
            .append_pair("group", &self.source.group)
            .append_pair("pageId", &self.source.page_id)
            .append_pair("pageIndex", &request.page_index.to_string())
            .append_pair("pageSize", &request.page_size.to_string())
            .append_pair("to", &self.source.score_to.to_string())
            .append_pair("type", &self.source.listing_type.to_string())
            .append_pair("year", &request.year.to_string());
        url
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    #[instrument(skip_all, fields(page = request.page_index, year = request.year))]
    async fn fetch(&self, request: &PageRequest) -> Result<PageContent> {
        let url = self.page_url(request);
        let started = std::time::Instant::now();

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| ScorePullError::Network(format!("page {}: {e}", request.page_index)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScorePullError::Network(format!(
                "page {}: HTTP {status}",
                request.page_index
            )));
        }

        let body = response.bytes().await.map_err(|e| {
            ScorePullError::Network(format!("page {}: body read failed: {e}", request.page_index))
        })?;

        let envelope: ScoreEnvelope = serde_json::from_slice(&body)
            .map_err(|e| ScorePullError::Decode(format!("page {}: {e}", request.page_index)))?;

        if !envelope.status {
            debug!(error_code = envelope.error_code, "upstream reported status=false");
        }

        let content = PageContent::from_entries(envelope.into_entries());
        debug!(
            records = content.len(),
            elapsed_ms = elapsed_ms(started.elapsed()),
            "page fetched"
        );
        Ok(content)
    }
}

fn elapsed_ms(d: Duration) -> u64 {
    d.as_millis().try_into().unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source_for(server: &MockServer) -> SourceConfig {
        SourceConfig {
            base_url: format!("{}/newsapi/EducationScore/GetSchoolByScore", server.uri()),
            ..SourceConfig::default()
        }
    }

    fn page_body(codes: &[&str]) -> String {
        let scores: Vec<String> = codes
            .iter()
            .map(|code| {
                format!(
                    r#"{{"schoolCode":"{code}","schoolName":"School {code}","score":"24",
                        "majorsCode":"M-{code}","majorsName":"Major {code}",
                        "provinceName":"Ha Noi","subjectGroup":"A",
                        "schoolSlug":"s","majorsSlug":"m"}}"#
                )
            })
            .collect();
        format!(
            r#"{{"status":true,"errorCode":0,"data":{{"model":{{"scores":[{}],"year":2015,"pageIndex":0,"pageSize":20,"totalRow":2}}}}}}"#,
            scores.join(",")
        )
    }

    #[test]
    fn page_url_carries_query_context() {
        let fetcher = HttpPageFetcher::new(SourceConfig::default()).unwrap();
        let url = fetcher.page_url(&PageRequest::new(7, 2015, 20));
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert!(pairs.contains(&("pageIndex".into(), "7".into())));
        assert!(pairs.contains(&("pageSize".into(), "20".into())));
        assert!(pairs.contains(&("year".into(), "2015".into())));
        assert!(pairs.contains(&("group".into(), "A".into())));
        assert!(pairs.contains(&("from".into(), "0".into())));
        assert!(pairs.contains(&("to".into(), "40".into())));
        assert!(pairs.contains(&("type".into(), "2".into())));
        assert!(pairs.contains(&("componentId".into(), "COMPONENT002310".into())));
        assert_eq!(url.host_str(), Some("vietnamnet.vn"));
    }

    #[test]
    fn rejects_invalid_base_url() {
        let source = SourceConfig {
            base_url: "::not a url::".into(),
            ..SourceConfig::default()
        };
        assert!(matches!(
            HttpPageFetcher::new(source),
            Err(ScorePullError::Config { .. })
        ));
    }

    #[tokio::test]
    async fn fetch_returns_records_in_source_order() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/newsapi/EducationScore/GetSchoolByScore"))
            .and(query_param("pageIndex", "3"))
            .and(query_param("year", "2015"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page_body(&["QHI", "BKA"])))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpPageFetcher::new(source_for(&server)).unwrap();
        let content = fetcher.fetch(&PageRequest::new(3, 2015, 20)).await.unwrap();

        let PageContent::Records(records) = content else {
            panic!("expected records");
        };
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].school_code, "QHI");
        assert_eq!(records[0].major_code, "M-QHI");
        assert_eq!(records[1].school_code, "BKA");
    }

    #[tokio::test]
    async fn empty_score_list_is_not_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page_body(&[])))
            .mount(&server)
            .await;

        let fetcher = HttpPageFetcher::new(source_for(&server)).unwrap();
        let content = fetcher.fetch(&PageRequest::new(199, 2015, 20)).await.unwrap();
        assert_eq!(content, PageContent::Empty);
    }

    #[tokio::test]
    async fn missing_model_is_empty() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"status":false,"errorCode":500,"data":null}"#),
            )
            .mount(&server)
            .await;

        let fetcher = HttpPageFetcher::new(source_for(&server)).unwrap();
        let content = fetcher.fetch(&PageRequest::new(0, 2015, 20)).await.unwrap();
        assert!(content.is_empty());
    }

    #[tokio::test]
    async fn non_json_body_is_decode_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let fetcher = HttpPageFetcher::new(source_for(&server)).unwrap();
        let err = fetcher.fetch(&PageRequest::new(0, 2015, 20)).await.unwrap_err();
        assert!(matches!(err, ScorePullError::Decode(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn server_error_is_network_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = HttpPageFetcher::new(source_for(&server)).unwrap();
        let err = fetcher.fetch(&PageRequest::new(0, 2015, 20)).await.unwrap_err();
        assert!(matches!(err, ScorePullError::Network(_)));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn connection_refused_is_network_failure() {
        let source = SourceConfig {
            base_url: "http://127.0.0.1:1/unreachable".into(),
            ..SourceConfig::default()
        };
        let fetcher = HttpPageFetcher::new(source).unwrap();
        let err = fetcher.fetch(&PageRequest::new(0, 2015, 20)).await.unwrap_err();
        assert!(matches!(err, ScorePullError::Network(_)));
    }
}
