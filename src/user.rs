use crate::api::{Authenticated, Profile, StoryService};
use crate::error::ApiError;
use crate::stories::{push_front, Story};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

/// What to do with an optimistic favorite change when the service rejects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FavoritePolicy {
    /// Undo the local change.
    #[default]
    Rollback,
    /// Keep the local change even though the service never recorded it.
    KeepLocal,
}

/// Outcome of a favorite toggle. The local change is always applied first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavoriteSync {
    Synced,
    RolledBack(ApiError),
    Unsynced(ApiError),
}

impl FavoriteSync {
    pub fn is_synced(&self) -> bool {
        matches!(self, FavoriteSync::Synced)
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            FavoriteSync::Synced => None,
            FavoriteSync::RolledBack(e) | FavoriteSync::Unsynced(e) => Some(e),
        }
    }
}

/// The logged-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    username: String,
    name: String,
    created_at: OffsetDateTime,
    login_token: String,
    own_stories: Vec<Story>,
    favorites: Vec<Story>,
}

impl User {
    pub fn from_profile(profile: Profile, token: String) -> Self {
        let mut favorites: Vec<Story> = Vec::with_capacity(profile.favorites.len());
        for s in profile.favorites {
            if !favorites.iter().any(|f| f.story_id == s.story_id) {
                favorites.push(s);
            }
        }
        User {
            username: profile.username,
            name: profile.name,
            created_at: profile.created_at,
            login_token: token,
            own_stories: profile.stories,
            favorites,
        }
    }

    pub async fn signup(
        service: &dyn StoryService,
        username: &str,
        password: &str,
        name: &str,
    ) -> Result<Self, ApiError> {
        log::debug!("signing up {}", username);
        let Authenticated { token, user } = service.signup(username, password, name).await?;
        Ok(User::from_profile(user, token))
    }

    pub async fn login(service: &dyn StoryService, username: &str, password: &str) -> Result<Self, ApiError> {
        log::debug!("logging in {}", username);
        let Authenticated { token, user } = service.login(username, password).await?;
        Ok(User::from_profile(user, token))
    }

    /// Rebuild a user from stored credentials. Any failure means "not logged
    /// in" and is only logged.
    pub async fn restore_session(service: &dyn StoryService, token: &str, username: &str) -> Option<Self> {
        match service.fetch_user(token, username).await {
            Ok(profile) => Some(User::from_profile(profile, token.to_string())),
            Err(e) => {
                log::warn!("restoring session for {} failed: {}", username, e);
                None
            }
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    /// Calendar date the account was created.
    pub fn member_since(&self) -> Date {
        self.created_at.date()
    }

    pub fn login_token(&self) -> &str {
        &self.login_token
    }

    pub fn own_stories(&self) -> &[Story] {
        &self.own_stories
    }

    pub fn favorites(&self) -> &[Story] {
        &self.favorites
    }

    pub fn is_favorite(&self, story: &Story) -> bool {
        self.favorites.iter().any(|s| s.story_id == story.story_id)
    }

    pub fn owns(&self, story: &Story) -> bool {
        story.username == self.username
    }

    pub async fn add_favorite(
        &mut self,
        service: &dyn StoryService,
        story: &Story,
        policy: FavoritePolicy,
    ) -> FavoriteSync {
        let added = !self.is_favorite(story);
        if added {
            self.favorites.push(story.clone());
        }
        let res = service
            .set_favorite(&self.login_token, &self.username, &story.story_id, true)
            .await;
        self.settle(res, policy, |favs| {
            if added {
                favs.retain(|s| s.story_id != story.story_id);
            }
        })
    }

    pub async fn delete_favorite(
        &mut self,
        service: &dyn StoryService,
        story: &Story,
        policy: FavoritePolicy,
    ) -> FavoriteSync {
        let idx = self.favorites.iter().position(|s| s.story_id == story.story_id);
        let removed = idx.map(|i| (i, self.favorites.remove(i)));
        let res = service
            .set_favorite(&self.login_token, &self.username, &story.story_id, false)
            .await;
        self.settle(res, policy, |favs| {
            if let Some((idx, s)) = removed {
                favs.insert(idx.min(favs.len()), s);
            }
        })
    }

    /// Flip a favorite to the opposite of its current state.
    pub async fn toggle_favorite(
        &mut self,
        service: &dyn StoryService,
        story: &Story,
        policy: FavoritePolicy,
    ) -> FavoriteSync {
        if self.is_favorite(story) {
            self.delete_favorite(service, story, policy).await
        } else {
            self.add_favorite(service, story, policy).await
        }
    }

    fn settle<F>(&mut self, res: Result<(), ApiError>, policy: FavoritePolicy, undo: F) -> FavoriteSync
    where
        F: FnOnce(&mut Vec<Story>),
    {
        match (res, policy) {
            (Ok(()), _) => FavoriteSync::Synced,
            (Err(e), FavoritePolicy::Rollback) => {
                log::warn!("favorite change for {} failed, rolling back: {}", self.username, e);
                undo(&mut self.favorites);
                FavoriteSync::RolledBack(e)
            }
            (Err(e), FavoritePolicy::KeepLocal) => {
                log::warn!("favorite change for {} not recorded remotely: {}", self.username, e);
                FavoriteSync::Unsynced(e)
            }
        }
    }

    pub(crate) fn record_own_story(&mut self, story: Story) {
        push_front(&mut self.own_stories, story);
    }

    pub(crate) fn forget_story(&mut self, story_id: &str) {
        self.own_stories.retain(|s| s.story_id != story_id);
        self.favorites.retain(|s| s.story_id != story_id);
    }

    /// The profile shape the service uses, rebuilt from local state.
    pub fn to_profile(&self) -> Profile {
        Profile {
            username: self.username.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
            favorites: self.favorites.clone(),
            stories: self.own_stories.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};
    use url::Url;

    fn story(id: &str, username: &str) -> Story {
        Story {
            story_id: id.into(),
            title: "t".into(),
            author: "a".into(),
            url: Url::parse("https://example.com").unwrap(),
            username: username.into(),
            created_at: datetime!(2022-02-07 00:00:48.422 UTC),
        }
    }

    fn profile() -> Profile {
        Profile {
            username: "GrayBurford".into(),
            name: "Gray".into(),
            created_at: datetime!(2022-01-28 19:16:35.908 UTC),
            favorites: vec![story("f1", "ji"), story("f1", "ji")],
            stories: vec![story("o1", "GrayBurford")],
        }
    }

    #[test]
    fn test_from_profile() {
        let u = User::from_profile(profile(), "tok".into());
        assert_eq!(u.username(), "GrayBurford");
        assert_eq!(u.login_token(), "tok");
        assert_eq!(u.member_since(), date!(2022 - 01 - 28));
        assert_eq!(u.favorites().len(), 1);
        assert!(u.is_favorite(&story("f1", "ji")));
        assert!(!u.is_favorite(&story("o1", "GrayBurford")));
        assert!(u.owns(&u.own_stories()[0]));
    }

    #[test]
    fn test_forget_story() {
        let mut u = User::from_profile(profile(), "tok".into());
        u.forget_story("f1");
        u.forget_story("o1");
        assert!(u.favorites().is_empty());
        assert!(u.own_stories().is_empty());
    }

    #[test]
    fn test_policy_from_toml_value() {
        #[derive(Deserialize)]
        struct Wrap {
            policy: FavoritePolicy,
        }
        let w: Wrap = toml::from_str(r#"policy = "keep-local""#).unwrap();
        assert_eq!(w.policy, FavoritePolicy::KeepLocal);
        assert_eq!(FavoritePolicy::default(), FavoritePolicy::Rollback);
    }
}
