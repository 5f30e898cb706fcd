//! Catalog REST API client.
//!
//! One request per call: retries and backoff are left to the caller, who
//! sees every failure as a typed [`GatewayError`].

use super::types::{FavoriteRequest, RateRequest};
use super::CatalogGateway;
use crate::error::GatewayError;
use anyhow::{bail, Context, Result};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use shared::config::{ApiConfig, SessionConfig};
use shared::{AnimeRecord, RatingReceipt, Stars};
use std::time::Duration;
use tracing::{debug, info, warn};

/// HTTP implementation of [`CatalogGateway`]
pub struct HttpGateway {
    /// HTTP client
    client: Client,
    /// Base URL for the catalog API
    base_url: Url,
    /// Optional bearer token for the session
    token: Option<String>,
}

impl HttpGateway {
    /// Create a new catalog API client
    pub fn new(
        base_url: &str,
        timeout: Duration,
        user_agent: &str,
        token: Option<String>,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid API base URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            bail!("API base URL cannot carry a path: {}", base_url);
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// Create a client from the API and session configuration sections
    pub fn from_config(api: &ApiConfig, session: &SessionConfig) -> Result<Self> {
        let token = session
            .token
            .clone()
            .filter(|token| !token.trim().is_empty());
        info!(base_url = %api.base_url, authenticated = token.is_some(), "Creating catalog API client");
        Self::new(
            &api.base_url,
            Duration::from_secs(api.timeout_seconds),
            &api.user_agent,
            token,
        )
    }

    /// Build an endpoint URL from path segments, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn user_endpoint(&self, segments: &[&str], user_id: &str) -> Url {
        let mut url = self.endpoint(segments);
        url.query_pairs_mut().append_pair("userId", user_id);
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and turn non-success statuses into gateway errors
    async fn send(&self, request: RequestBuilder) -> Result<Response, GatewayError> {
        let response = request.send().await.map_err(|e| {
            warn!(url = ?e.url().map(Url::as_str), error = %e, "Request error");
            GatewayError::NetworkUnavailable
        })?;

        let status = response.status();
        if status.is_success() {
            debug!(url = %response.url(), status = %status, "Request successful");
            return Ok(response);
        }

        let url = response.url().clone();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        warn!(
            url = %url,
            status = %status,
            error = %error_text,
            "Request failed"
        );

        Err(status_error(status))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, GatewayError> {
        debug!(url = %url, "Making API request");
        let response = self.send(self.request(Method::GET, url)).await?;
        decode(response).await
    }
}

/// Map an unsuccessful HTTP status onto the gateway taxonomy
fn status_error(status: StatusCode) -> GatewayError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GatewayError::Unauthorized,
        StatusCode::NOT_FOUND => GatewayError::NotFound,
        other => GatewayError::ServerError(other.as_u16()),
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
    let url = response.url().clone();
    response.json::<T>().await.map_err(|e| {
        warn!(url = %url, error = %e, "Failed to parse response");
        if e.is_decode() {
            GatewayError::InvalidResponse(e.to_string())
        } else {
            GatewayError::NetworkUnavailable
        }
    })
}

async fn read_body(response: Response) -> Result<String, GatewayError> {
    let url = response.url().clone();
    response.text().await.map_err(|e| {
        warn!(url = %url, error = %e, "Failed to read response body");
        GatewayError::NetworkUnavailable
    })
}

impl CatalogGateway for HttpGateway {
    async fn fetch_catalog(&self, user_id: &str) -> Result<Vec<AnimeRecord>, GatewayError> {
        info!(user_id = user_id, "Fetching catalog");
        self.get_json(self.user_endpoint(&["animes"], user_id)).await
    }

    async fn fetch_favorites(&self, user_id: &str) -> Result<Vec<AnimeRecord>, GatewayError> {
        info!(user_id = user_id, "Fetching favorites");
        self.get_json(self.endpoint(&["favorites", user_id])).await
    }

    async fn fetch_recent(&self, user_id: &str) -> Result<Vec<AnimeRecord>, GatewayError> {
        info!(user_id = user_id, "Fetching recent anime");
        self.get_json(self.user_endpoint(&["recent"], user_id)).await
    }

    async fn fetch_top(&self, user_id: &str) -> Result<Vec<AnimeRecord>, GatewayError> {
        info!(user_id = user_id, "Fetching top anime");
        self.get_json(self.user_endpoint(&["top10"], user_id)).await
    }

    async fn fetch_anime(&self, anime_id: &str) -> Result<AnimeRecord, GatewayError> {
        debug!(anime_id = anime_id, "Fetching anime details");
        self.get_json(self.endpoint(&["animes", anime_id])).await
    }

    async fn add_favorite(
        &self,
        user_id: &str,
        anime_id: &str,
    ) -> Result<Option<AnimeRecord>, GatewayError> {
        debug!(user_id = user_id, anime_id = anime_id, "Adding favorite");
        let request = self
            .request(Method::POST, self.endpoint(&["favorites", anime_id]))
            .json(&FavoriteRequest { user_id });
        let response = self.send(request).await?;

        // The add already happened once the status is 2xx; the echo is optional
        let Ok(body) = read_body(response).await else {
            return Ok(None);
        };
        if body.trim().is_empty() {
            warn!(anime_id = anime_id, "Favorite added, response carried no record");
            return Ok(None);
        }
        match serde_json::from_str(&body) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(anime_id = anime_id, error = %e, "Favorite added, response was not a record");
                Ok(None)
            }
        }
    }

    async fn remove_favorite(&self, user_id: &str, anime_id: &str) -> Result<(), GatewayError> {
        debug!(user_id = user_id, anime_id = anime_id, "Removing favorite");
        let request = self.request(
            Method::DELETE,
            self.endpoint(&["favorites", user_id, anime_id]),
        );
        self.send(request).await?;
        Ok(())
    }

    async fn submit_rating(
        &self,
        user_id: &str,
        anime_id: &str,
        stars: Stars,
    ) -> Result<RatingReceipt, GatewayError> {
        debug!(user_id = user_id, anime_id = anime_id, stars = stars.get(), "Submitting rating");
        let request = self
            .request(Method::POST, self.endpoint(&["animes", anime_id, "rate"]))
            .json(&RateRequest { user_id, stars });
        let response = self.send(request).await?;

        // Some deployments answer with an empty body; treat that as "nothing new"
        let body = read_body(response).await?;
        if body.trim().is_empty() {
            return Ok(RatingReceipt::default());
        }
        serde_json::from_str(&body).map_err(|e| {
            warn!(anime_id = anime_id, error = %e, "Failed to parse rating response");
            GatewayError::InvalidResponse(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway(server: &MockServer, token: Option<&str>) -> HttpGateway {
        HttpGateway::new(
            &server.uri(),
            Duration::from_secs(5),
            "anime-catalog-test",
            token.map(str::to_string),
        )
        .unwrap()
    }

    fn naruto_json() -> serde_json::Value {
        json!({
            "id": "a1",
            "title": "Naruto",
            "genre": "Action, Shounen",
            "description": "Ninja",
            "year": 2002,
            "imageUrl": "https://img.example/naruto.jpg",
            "globalRating": 4.5,
            "currentUserRating": 5
        })
    }

    #[test]
    fn test_client_creation() {
        let client = HttpGateway::new(
            "https://anime-api-alpha-red.vercel.app/",
            Duration::from_secs(30),
            "anime-catalog/0.1.0",
            None,
        );
        assert!(client.is_ok());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let client = HttpGateway::new("not a url", Duration::from_secs(1), "test", None);
        assert!(client.is_err());
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = HttpGateway::new(
            "https://api.example/v1/",
            Duration::from_secs(1),
            "test",
            None,
        )
        .unwrap();
        assert_eq!(
            client.endpoint(&["favorites", "user 1", "a/b"]).as_str(),
            "https://api.example/v1/favorites/user%201/a%2Fb"
        );
        assert_eq!(
            client.user_endpoint(&["top10"], "u1").as_str(),
            "https://api.example/v1/top10?userId=u1"
        );
    }

    #[tokio::test]
    async fn test_fetch_catalog() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/animes"))
            .and(query_param("userId", "u1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([naruto_json()])))
            .expect(1)
            .mount(&server)
            .await;

        let records = gateway(&server, None).fetch_catalog("u1").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Naruto");
        assert_eq!(records[0].primary_genre(), "Action");
        assert_eq!(records[0].current_user_rating, Some(5));
    }

    #[tokio::test]
    async fn test_fetch_favorites_uses_user_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/favorites/u1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([naruto_json()])))
            .expect(1)
            .mount(&server)
            .await;

        let records = gateway(&server, None).fetch_favorites("u1").await.unwrap();
        assert_eq!(records[0].id, "a1");
    }

    #[tokio::test]
    async fn test_bearer_token_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/top10"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let records = gateway(&server, Some("secret")).fetch_top("u1").await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_add_favorite_posts_user() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/favorites/a1"))
            .and(body_json(json!({"userId": "u1"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(naruto_json()))
            .expect(1)
            .mount(&server)
            .await;

        let record = gateway(&server, None).add_favorite("u1", "a1").await.unwrap();
        assert_eq!(record.map(|r| r.id), Some("a1".to_string()));
    }

    #[tokio::test]
    async fn test_add_favorite_without_record_still_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/favorites/a1"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/favorites/a2"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Added to favorites"))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = gateway(&server, None);
        assert_eq!(gateway.add_favorite("u1", "a1").await, Ok(None));
        assert_eq!(gateway.add_favorite("u1", "a2").await, Ok(None));
    }

    #[tokio::test]
    async fn test_remove_favorite() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/favorites/u1/a1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        assert!(gateway(&server, None).remove_favorite("u1", "a1").await.is_ok());
    }

    #[tokio::test]
    async fn test_submit_rating() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/animes/a1/rate"))
            .and(body_json(json!({"userId": "u1", "stars": 4})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"currentUserRating": 4, "globalRating": 4.2})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let receipt = gateway(&server, None)
            .submit_rating("u1", "a1", Stars::new(4).unwrap())
            .await
            .unwrap();
        assert_eq!(receipt.current_user_rating, Some(4));
        assert_eq!(receipt.global_rating, Some(4.2));
    }

    #[tokio::test]
    async fn test_submit_rating_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/animes/a1/rate"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let receipt = gateway(&server, None)
            .submit_rating("u1", "a1", Stars::new(2).unwrap())
            .await
            .unwrap();
        assert_eq!(receipt, RatingReceipt::default());
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/animes/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/favorites/u1"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/recent"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let client = gateway(&server, None);
        assert_eq!(
            client.fetch_anime("missing").await.unwrap_err(),
            GatewayError::NotFound
        );
        assert_eq!(
            client.fetch_favorites("u1").await.unwrap_err(),
            GatewayError::Unauthorized
        );
        assert_eq!(
            client.fetch_recent("u1").await.unwrap_err(),
            GatewayError::ServerError(503)
        );
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/animes"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = gateway(&server, None).fetch_catalog("u1").await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let client = HttpGateway::new(
            "http://127.0.0.1:1",
            Duration::from_secs(2),
            "test",
            None,
        )
        .unwrap();
        assert_eq!(
            client.fetch_catalog("u1").await.unwrap_err(),
            GatewayError::NetworkUnavailable
        );
    }
}
