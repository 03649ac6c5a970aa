//! The remote story service: the trait the domain layer talks to, and the
//! JSON shapes exchanged with the Hack or Snooze API.

mod http;

pub use http::HttpStoryService;

use crate::error::ApiError;
use crate::stories::{NewStory, Story};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A user record as returned by signup, login and user lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub username: String,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default)]
    pub favorites: Vec<Story>,
    #[serde(default)]
    pub stories: Vec<Story>,
}

/// Result of a successful signup or login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authenticated {
    pub token: String,
    pub user: Profile,
}

/// Request/response round trips against the story service.
#[async_trait]
pub trait StoryService: Send + Sync {
    /// All stories in the global feed. No credential required.
    async fn fetch_all(&self) -> Result<Vec<Story>, ApiError>;

    /// Post a new story on behalf of the token's owner.
    async fn create(&self, token: &str, story: &NewStory) -> Result<Story, ApiError>;

    /// Delete a story; only its owner may do this.
    async fn delete(&self, token: &str, story_id: &str) -> Result<(), ApiError>;

    async fn signup(&self, username: &str, password: &str, name: &str) -> Result<Authenticated, ApiError>;

    async fn login(&self, username: &str, password: &str) -> Result<Authenticated, ApiError>;

    /// Look up a user with a previously issued token.
    async fn fetch_user(&self, token: &str, username: &str) -> Result<Profile, ApiError>;

    /// Mark (`present = true`) or unmark a favorite. Idempotent per desired state.
    async fn set_favorite(
        &self,
        token: &str,
        username: &str,
        story_id: &str,
        present: bool,
    ) -> Result<(), ApiError>;
}

#[derive(Serialize)]
pub(crate) struct TokenBody<'a> {
    pub token: &'a str,
}

#[derive(Serialize)]
pub(crate) struct CreateStoryBody<'a> {
    pub token: &'a str,
    pub story: &'a NewStory,
}

#[derive(Serialize)]
pub(crate) struct CredentialsBody<'a> {
    pub user: Credentials<'a>,
}

#[derive(Serialize)]
pub(crate) struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
}

#[derive(Deserialize)]
pub(crate) struct StoriesEnvelope {
    pub stories: Vec<Story>,
}

#[derive(Deserialize)]
pub(crate) struct StoryEnvelope {
    pub story: Story,
}

#[derive(Deserialize)]
pub(crate) struct UserEnvelope {
    pub user: Profile,
}
