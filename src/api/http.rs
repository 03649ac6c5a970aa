use super::{
    Authenticated, CreateStoryBody, Credentials, CredentialsBody, Profile, StoriesEnvelope,
    StoryEnvelope, StoryService, TokenBody, UserEnvelope,
};
use crate::config::RuntimeConfig;
use crate::error::ApiError;
use crate::stories::{NewStory, Story};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

/// `StoryService` over HTTPS with reqwest.
#[derive(Clone)]
pub struct HttpStoryService {
    client: Client,
    base: Url,
    max_response_bytes: usize,
}

impl HttpStoryService {
    pub fn new(cfg: &RuntimeConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(cfg.user_agent.as_str())
            .gzip(true)
            .connect_timeout(cfg.connect_timeout)
            .timeout(cfg.request_timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        if cfg.base_url.cannot_be_a_base() {
            return Err(ApiError::Validation(format!("unusable base URL: {}", cfg.base_url)));
        }
        Ok(Self {
            client,
            base: cfg.base_url.clone(),
            max_response_bytes: cfg.max_response_bytes,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        endpoint(&self.base, segments)
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        self.client.request(method, self.endpoint(segments))
    }

    async fn send(&self, req: RequestBuilder) -> Result<Vec<u8>, ApiError> {
        let resp = req.send().await.map_err(|e| ApiError::Network(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            // The status alone decides the error kind; the body only supplies a message.
            let message = self
                .read_body(resp)
                .await
                .ok()
                .and_then(|body| error_message(&body))
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_default();
            return Err(ApiError::from_status(status.as_u16(), message));
        }
        self.read_body(resp).await
    }

    // Streams the body with a size cap
    async fn read_body(&self, resp: Response) -> Result<Vec<u8>, ApiError> {
        let status = resp.status().as_u16();
        let mut stream = resp.bytes_stream();
        let mut buf: Vec<u8> = Vec::new();
        while let Some(chunk) = stream.next().await {
            let c = chunk.map_err(|e| ApiError::Network(format!("failed to read body: {}", e)))?;
            if buf.len() + c.len() > self.max_response_bytes {
                return Err(ApiError::Api {
                    status,
                    message: format!("response larger than {} bytes", self.max_response_bytes),
                });
            }
            buf.extend_from_slice(&c);
        }
        Ok(buf)
    }
}

#[async_trait]
impl StoryService for HttpStoryService {
    async fn fetch_all(&self) -> Result<Vec<Story>, ApiError> {
        let body = self.send(self.request(Method::GET, &["stories"])).await?;
        let env: StoriesEnvelope = decode(&body)?;
        Ok(env.stories)
    }

    async fn create(&self, token: &str, story: &NewStory) -> Result<Story, ApiError> {
        let req = self
            .request(Method::POST, &["stories"])
            .json(&CreateStoryBody { token, story });
        let env: StoryEnvelope = decode(&self.send(req).await?)?;
        Ok(env.story)
    }

    async fn delete(&self, token: &str, story_id: &str) -> Result<(), ApiError> {
        let req = self
            .request(Method::DELETE, &["stories", story_id])
            .json(&TokenBody { token });
        self.send(req).await?;
        Ok(())
    }

    async fn signup(&self, username: &str, password: &str, name: &str) -> Result<Authenticated, ApiError> {
        let req = self.request(Method::POST, &["signup"]).json(&CredentialsBody {
            user: Credentials { username, password, name: Some(name) },
        });
        decode(&self.send(req).await?)
    }

    async fn login(&self, username: &str, password: &str) -> Result<Authenticated, ApiError> {
        let req = self.request(Method::POST, &["login"]).json(&CredentialsBody {
            user: Credentials { username, password, name: None },
        });
        // The service answers 404 for an unknown username.
        let body = self.send(req).await.map_err(|e| match e {
            ApiError::NotFound(msg) => ApiError::Auth(msg),
            other => other,
        })?;
        decode(&body)
    }

    async fn fetch_user(&self, token: &str, username: &str) -> Result<Profile, ApiError> {
        let req = self
            .request(Method::GET, &["users", username])
            .query(&[("token", token)]);
        let env: UserEnvelope = decode(&self.send(req).await?)?;
        Ok(env.user)
    }

    async fn set_favorite(
        &self,
        token: &str,
        username: &str,
        story_id: &str,
        present: bool,
    ) -> Result<(), ApiError> {
        let method = if present { Method::POST } else { Method::DELETE };
        let req = self
            .request(method, &["users", username, "favorites", story_id])
            .json(&TokenBody { token });
        self.send(req).await?;
        Ok(())
    }
}

fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::Validation(format!("unexpected response shape: {}", e)))
}

// The service reports failures as {"error": {"message": ..., "status": ...}}
fn error_message(body: &[u8]) -> Option<String> {
    let v: Value = serde_json::from_slice(body).ok()?;
    let err = v.get("error")?;
    match err.get("message") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .filter_map(|x| x.as_str())
                .collect::<Vec<_>>()
                .join("; "),
        ),
        _ => err.as_str().map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_encodes_segments() {
        let base = Url::parse("https://hack-or-snooze-v3.herokuapp.com").unwrap();
        assert_eq!(
            endpoint(&base, &["stories"]).as_str(),
            "https://hack-or-snooze-v3.herokuapp.com/stories"
        );
        assert_eq!(
            endpoint(&base, &["users", "a b", "favorites", "x/y"]).as_str(),
            "https://hack-or-snooze-v3.herokuapp.com/users/a%20b/favorites/x%2Fy"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let base = Url::parse("http://localhost:3000/api/").unwrap();
        assert_eq!(endpoint(&base, &["login"]).as_str(), "http://localhost:3000/api/login");
    }

    #[test]
    fn test_error_message() {
        let body = br#"{"error":{"message":"Invalid password","status":401,"title":"Unauthorized"}}"#;
        assert_eq!(error_message(body).as_deref(), Some("Invalid password"));
        let body = br#"{"error":{"message":["instance.story requires property \"url\""],"status":400}}"#;
        assert_eq!(
            error_message(body).as_deref(),
            Some("instance.story requires property \"url\"")
        );
        assert_eq!(error_message(b"<html>"), None);
    }

    #[test]
    fn test_decode_shape_mismatch_is_validation() {
        let res: Result<StoriesEnvelope, _> = decode(br#"{"stories": [{"title": 1}]}"#);
        assert!(matches!(res, Err(ApiError::Validation(_))));
    }
}
