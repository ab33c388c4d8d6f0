//! REST transport.

use std::time::Duration;

use async_trait::async_trait;
use laulud_core::{
    encode_path, ApiData, ApiRoute, CreateTagBody, CurrentUser, ItemSearchResponse, LauludResult,
    SpotifyUri, TagDetails, TagSummary, TaggedItem,
};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::{Method, StatusCode};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ApiClientError;
use crate::transport::ApiTransport;

/// Name of the cookie the API keeps its session in.
pub const SESSION_COOKIE_NAME: &str = "oauth-state";

#[derive(Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
    timeout_ms: u64,
}

impl RestClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiClientError> {
        let timeout = Duration::from_millis(config.request_timeout_ms);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(build_session_headers(config.session_cookie.as_deref())?)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
            timeout_ms: config.request_timeout_ms,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request_error(&self, err: reqwest::Error) -> ApiClientError {
        if err.is_timeout() {
            ApiClientError::Timeout {
                timeout_ms: self.timeout_ms,
            }
        } else {
            ApiClientError::Http(err)
        }
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&CreateTagBody>,
    ) -> Result<reqwest::Response, ApiClientError> {
        debug!(%method, path, "Sending request");
        let mut request = self.client.request(method, self.url(path));
        if let Some(body) = body {
            request = request.json(body);
        }
        request.send().await.map_err(|err| self.request_error(err))
    }

    pub async fn get_json<T>(&self, path: &str) -> Result<T, ApiClientError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self.send(Method::GET, path, None).await?;
        self.parse_response(response).await
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiClientError> {
        let status = response.status();
        let text = response.text().await.map_err(|err| self.request_error(err))?;
        if status.is_success() {
            Ok(serde_json::from_str::<T>(&text)?)
        } else {
            Err(ApiClientError::Status {
                status: status.as_u16(),
                body: text.trim().to_string(),
            })
        }
    }

    async fn fetch_route(&self, route: &ApiRoute, path: &str) -> Result<ApiData, ApiClientError> {
        let data = match route {
            ApiRoute::CurrentUser => ApiData::CurrentUser(self.get_json::<CurrentUser>(path).await?),
            ApiRoute::Item(_) => ApiData::Item(self.get_json::<TaggedItem>(path).await?),
            ApiRoute::ItemSearch(_) => {
                ApiData::ItemSearch(self.get_json::<ItemSearchResponse>(path).await?)
            }
            ApiRoute::Tags => ApiData::Tags(self.get_json::<Vec<TagSummary>>(path).await?),
            ApiRoute::Tag(_) => ApiData::Tag(self.get_json::<TagDetails>(path).await?),
        };
        Ok(data)
    }
}

#[async_trait]
impl ApiTransport for RestClient {
    async fn query(&self, route: &ApiRoute) -> LauludResult<ApiData> {
        let path = route.path();
        self.fetch_route(route, &path)
            .await
            .map_err(|err| err.into_laulud(&path))
    }

    async fn add_tag(&self, uri: &SpotifyUri, tag: &str) -> LauludResult<TaggedItem> {
        let path = encode_path(&[String::from("items"), uri.to_string(), String::from("tags")]);
        let body = CreateTagBody {
            tag: tag.to_string(),
        };
        let result = async {
            let response = self.send(Method::POST, &path, Some(&body)).await?;
            self.parse_response::<TaggedItem>(response).await
        }
        .await;
        result.map_err(|err| err.into_laulud(&path))
    }

    async fn delete_tag(&self, uri: &SpotifyUri, tag: &str) -> LauludResult<TaggedItem> {
        let path = encode_path(&[
            String::from("items"),
            uri.to_string(),
            String::from("tags"),
            tag.to_string(),
        ]);
        let result = async {
            let response = self.send(Method::DELETE, &path, None).await?;
            self.parse_response::<TaggedItem>(response).await
        }
        .await;
        result.map_err(|err| err.into_laulud(&path))
    }

    async fn auth_check(&self) -> LauludResult<bool> {
        let path = "/api/auth-check";
        let response = self
            .send(Method::GET, path, None)
            .await
            .map_err(|err| err.into_laulud(path))?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::UNAUTHORIZED => Ok(false),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(ApiClientError::Status {
                    status: status.as_u16(),
                    body,
                }
                .into_laulud(path))
            }
        }
    }

    async fn logout(&self) -> LauludResult<()> {
        let path = "/api/logout";
        let response = self
            .send(Method::POST, path, None)
            .await
            .map_err(|err| err.into_laulud(path))?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiClientError::Status {
                status: status.as_u16(),
                body,
            }
            .into_laulud(path))
        }
    }

    fn login_url(&self, next: &str) -> String {
        login_url(&self.base_url, next)
    }
}

/// `<base>/api/oauth/redirect?next=<next>`.
pub fn login_url(base_url: &str, next: &str) -> String {
    format!(
        "{}/api/oauth/redirect?next={}",
        base_url,
        urlencoding::encode(next)
    )
}

pub(crate) fn build_session_headers(cookie: Option<&str>) -> Result<HeaderMap, ApiClientError> {
    let mut headers = HeaderMap::new();
    if let Some(cookie) = cookie {
        let value = format!("{}={}", SESSION_COOKIE_NAME, cookie);
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&value).map_err(|e| ApiClientError::Config(e.to_string()))?,
        );
    }
    Ok(headers)
}
