use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use papermate_core::{
    ApiConfig, FetchResult, FilterParams, PageResult, Paper, PaperSource, RecommendationMode,
    RecommendationResult,
};

use crate::error::{ClientError, Result};
use crate::http::{HttpClient, ResponseCache};

/// Client for the PaperMate papers API.
///
/// Routes:
/// - `GET  /papers/?page=&keyword=&published_filter=&title_search=`
/// - `GET  /papers/{id}/`
/// - `GET  /papers/{id}/recommendations/`
/// - `POST /papers/` with `find_similar_paper={id}` (legacy)
pub struct PaperMateClient {
    http: HttpClient,
    base_url: Url,
    recommendation_mode: RecommendationMode,
    page_cache: ResponseCache<PageResult>,
}

impl PaperMateClient {
    pub fn new(api: &ApiConfig) -> Result<Self> {
        Self::with_params(
            &api.base_url,
            api.timeout(),
            &api.user_agent,
            api.recommendation_mode,
            api.cache_ttl(),
        )
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Self::new(&ApiConfig {
            base_url: base_url.to_string(),
            ..ApiConfig::default()
        })
    }

    pub fn with_params(
        base_url: &str,
        timeout: Duration,
        user_agent: &str,
        recommendation_mode: RecommendationMode,
        cache_ttl: Duration,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| ClientError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self {
            http: HttpClient::new(timeout, user_agent)?,
            base_url,
            recommendation_mode,
            page_cache: ResponseCache::new(cache_ttl),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `base/seg1/seg2/` with each segment percent-encoded and the trailing
    /// slash the backend routes expect.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segs = url
                .path_segments_mut()
                .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?;
            segs.pop_if_empty();
            segs.extend(segments);
            segs.push("");
        }
        Ok(url)
    }

    pub async fn papers(&self, params: &FilterParams) -> Result<PageResult> {
        let key = params.cache_key();
        if let Some(cached) = self.page_cache.get(&key).await {
            debug!(%key, "page served from cache");
            return Ok(cached);
        }

        let mut url = self.endpoint(&["papers"])?;
        url.query_pairs_mut()
            .extend_pairs(params.query_pairs().iter().map(|(k, v)| (*k, v.as_str())));

        let page: PageResult = self.http.get_json(url).await?;
        let page = page.normalized();
        self.page_cache.set(&key, page.clone()).await;
        Ok(page)
    }

    pub async fn paper(&self, entry_id: &str) -> Result<Paper> {
        let url = self.endpoint(&["papers", entry_id])?;
        self.http.get_json(url).await.map_err(|e| match e {
            ClientError::NotFound(_) => ClientError::NotFound(entry_id.to_string()),
            other => other,
        })
    }

    pub async fn recommendations(&self, entry_id: &str) -> Result<RecommendationResult> {
        let url = self.endpoint(&["papers", entry_id, "recommendations"])?;
        let result: RecommendationResult = self.http.get_json(url).await.map_err(|e| match e {
            ClientError::NotFound(_) => ClientError::NotFound(entry_id.to_string()),
            other => other,
        })?;
        Ok(result.normalized())
    }

    /// Similarity lookup through the original form endpoint.
    pub async fn similar_papers_legacy(&self, entry_id: &str) -> Result<RecommendationResult> {
        let url = self.endpoint(&["papers"])?;
        let result: RecommendationResult = self
            .http
            .post_form_json(url, &[("find_similar_paper", entry_id)])
            .await?;
        Ok(result.normalized())
    }

    /// Forget cached list pages, e.g. after the backend data changed.
    pub async fn invalidate(&self) {
        self.page_cache.clear().await;
    }
}

#[async_trait]
impl PaperSource for PaperMateClient {
    async fn fetch_page(&self, params: &FilterParams) -> FetchResult<PageResult> {
        Ok(self.papers(params).await?)
    }

    async fn fetch_paper(&self, entry_id: &str) -> FetchResult<Paper> {
        Ok(self.paper(entry_id).await?)
    }

    async fn fetch_recommendations(&self, entry_id: &str) -> FetchResult<RecommendationResult> {
        let result = match self.recommendation_mode {
            RecommendationMode::LegacyForm => self.similar_papers_legacy(entry_id).await?,
            // Local shuffling happens in `DetailController::recommend`; a
            // direct call still goes to the endpoint.
            RecommendationMode::Endpoint | RecommendationMode::LocalShuffle => {
                self.recommendations(entry_id).await?
            }
        };
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use papermate_core::{FetchError, PublishedFilter};

    const PAGE_BODY: &str = r#"{
        "page_obj": [
            {
                "entry_id": "http://arxiv.org/abs/2101.00001v1",
                "title": "Probabilistic Forecasting",
                "abstract": "We forecast things.",
                "authors": "A. Author",
                "keywords": "forecasting",
                "published": "2021-01-01 00:00:00+00:00",
                "comment": "Accepted at ICML 2024",
                "primary_category": "cs.LG",
                "categories": "cs.LG, stat.ML"
            }
        ],
        "total_pages": 7,
        "keywords": ["forecasting", "generation", "augmentation"],
        "selected_keyword": "forecasting",
        "published_filter": "yes",
        "title_search": ""
    }"#;

    fn client_for(server: &Server) -> PaperMateClient {
        PaperMateClient::with_params(
            &server.url(),
            Duration::from_secs(5),
            "papermate-test",
            RecommendationMode::Endpoint,
            Duration::from_secs(60),
        )
        .unwrap()
    }

    fn paper_json(id: &str) -> String {
        format!(r#"{{"entry_id": "{id}", "title": "Paper {id}"}}"#)
    }

    #[tokio::test]
    async fn test_fetch_page_sends_filters() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/papers/")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("page".into(), "2".into()),
                Matcher::UrlEncoded("keyword".into(), "forecasting".into()),
                Matcher::UrlEncoded("published_filter".into(), "yes".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(PAGE_BODY)
            .create_async()
            .await;

        let client = client_for(&server);
        let params = FilterParams::new()
            .with_keyword("forecasting")
            .with_published(PublishedFilter::PublishedOnly)
            .with_page(2);
        let page = client.fetch_page(&params).await.unwrap();

        m.assert_async().await;
        assert_eq!(page.total_pages, 7);
        assert_eq!(page.keywords.len(), 3);
        assert_eq!(page.page_obj[0].arxiv_id(), "2101.00001");
        assert!(page.page_obj[0].looks_published());
    }

    #[tokio::test]
    async fn test_identical_params_hit_cache() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/papers/")
            .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
            .with_status(200)
            .with_body(PAGE_BODY)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server);
        let params = FilterParams::new();
        client.fetch_page(&params).await.unwrap();
        client.fetch_page(&params).await.unwrap();

        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/papers/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(PAGE_BODY)
            .expect(2)
            .create_async()
            .await;

        let client = client_for(&server);
        client.fetch_page(&FilterParams::new()).await.unwrap();
        client.invalidate().await;
        client.fetch_page(&FilterParams::new()).await.unwrap();

        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_paper_not_found() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/papers/9999.99999/")
            .with_status(404)
            .with_body(r#"{"detail": "Not found."}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.fetch_paper("9999.99999").await.unwrap_err();
        assert_eq!(err, FetchError::NotFound("9999.99999".to_string()));
    }

    #[tokio::test]
    async fn test_fetch_paper_detail() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/papers/2101.00001/")
            .with_status(200)
            .with_body(paper_json("2101.00001"))
            .create_async()
            .await;

        let client = client_for(&server);
        let paper = client.fetch_paper("2101.00001").await.unwrap();
        assert_eq!(paper.title, "Paper 2101.00001");
    }

    #[tokio::test]
    async fn test_server_error_carries_status_and_message() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/papers/")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body(r#"{"error": "database unavailable"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.fetch_page(&FilterParams::new()).await.unwrap_err();
        assert_eq!(
            err,
            FetchError::Http {
                status: 503,
                message: "database unavailable".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/papers/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.fetch_page(&FilterParams::new()).await.unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[tokio::test]
    async fn test_recommendations_never_include_selected() {
        let mut server = Server::new_async().await;
        let body = format!(
            r#"{{"selected_paper": {}, "recommended_papers": [{}, {}, {}]}}"#,
            paper_json("2101.00001"),
            paper_json("2101.00002"),
            paper_json("2101.00001"),
            paper_json("2101.00003"),
        );
        let _m = server
            .mock("GET", "/papers/2101.00001/recommendations/")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let client = client_for(&server);
        let result = client.fetch_recommendations("2101.00001").await.unwrap();
        assert_eq!(result.recommended_papers.len(), 2);
        assert!(!result.contains("2101.00001"));
    }

    #[tokio::test]
    async fn test_legacy_form_lookup() {
        let mut server = Server::new_async().await;
        let body = format!(
            r#"{{"selected_paper": {}, "recommended_papers": [{}]}}"#,
            paper_json("2101.00001"),
            paper_json("2101.00005"),
        );
        let m = server
            .mock("POST", "/papers/")
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(Matcher::UrlEncoded(
                "find_similar_paper".into(),
                "2101.00001".into(),
            ))
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let client = PaperMateClient::with_params(
            &server.url(),
            Duration::from_secs(5),
            "papermate-test",
            RecommendationMode::LegacyForm,
            Duration::ZERO,
        )
        .unwrap();
        let result = client.fetch_recommendations("2101.00001").await.unwrap();

        m.assert_async().await;
        assert_eq!(result.recommended_papers[0].entry_id, "2101.00005");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        let client = PaperMateClient::with_base_url("http://127.0.0.1:1").unwrap();
        let err = client.fetch_page(&FilterParams::new()).await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)), "{err:?}");
    }

    #[test]
    fn test_endpoint_handles_base_path() {
        let client = PaperMateClient::with_base_url("http://localhost:8000/api/").unwrap();
        let url = client.endpoint(&["papers", "2101.00001"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/papers/2101.00001/");

        let client = PaperMateClient::with_base_url("http://localhost:8000").unwrap();
        let url = client.endpoint(&["papers"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/papers/");

        assert!(PaperMateClient::with_base_url("not a url").is_err());
    }
}
