#![allow(dead_code)]

use async_trait::async_trait;
use snooze_cli::{ApiError, Authenticated, NewStory, Profile, Story, StoryService};
use std::collections::HashMap;
use std::sync::Mutex;
use time::OffsetDateTime;
use time::macros::datetime;
use url::Url;

pub const CREATED: OffsetDateTime = datetime!(2022-01-28 19:16:35.908 UTC);

pub fn story(id: &str, username: &str) -> Story {
    Story {
        story_id: id.into(),
        title: format!("Story {}", id),
        author: "Matt Lane".into(),
        url: Url::parse("https://example.com/a/b").unwrap(),
        username: username.into(),
        created_at: CREATED,
    }
}

pub fn new_story(title: &str) -> NewStory {
    NewStory {
        title: title.into(),
        author: "Me".into(),
        url: Url::parse("http://meow.com").unwrap(),
    }
}

#[derive(Default)]
struct State {
    stories: Vec<Story>,
    users: HashMap<String, (String, Profile)>,
    tokens: HashMap<String, String>,
    failure: Option<ApiError>,
    next_id: u32,
    calls: Vec<String>,
}

/// In-memory stand-in for the story service.
#[derive(Default)]
pub struct FakeService {
    state: Mutex<State>,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user directly and return their token.
    pub fn add_user(&self, username: &str, password: &str) -> String {
        let mut st = self.state.lock().unwrap();
        let profile = Profile {
            username: username.into(),
            name: format!("{} name", username),
            created_at: CREATED,
            favorites: Vec::new(),
            stories: Vec::new(),
        };
        st.users.insert(username.into(), (password.into(), profile));
        let token = format!("token-{}", username);
        st.tokens.insert(token.clone(), username.into());
        token
    }

    pub fn add_token(&self, token: &str, username: &str) {
        let mut st = self.state.lock().unwrap();
        st.tokens.insert(token.into(), username.into());
    }

    pub fn seed(&self, story: Story) {
        let mut st = self.state.lock().unwrap();
        if let Some((_, p)) = st.users.get_mut(&story.username) {
            p.stories.insert(0, story.clone());
        }
        st.stories.insert(0, story);
    }

    /// Every following call fails with `err` until cleared.
    pub fn fail_with(&self, err: Option<ApiError>) {
        self.state.lock().unwrap().failure = err;
    }

    pub fn remote_stories(&self) -> Vec<Story> {
        self.state.lock().unwrap().stories.clone()
    }

    pub fn remote_favorites(&self, username: &str) -> Vec<String> {
        let st = self.state.lock().unwrap();
        st.users
            .get(username)
            .map(|(_, p)| p.favorites.iter().map(|s| s.story_id.clone()).collect())
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }
}

impl State {
    fn enter(&mut self, call: &str) -> Result<(), ApiError> {
        self.calls.push(call.to_string());
        match &self.failure {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn owner_of(&self, token: &str) -> Result<String, ApiError> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| ApiError::Auth("invalid token".into()))
    }
}

#[async_trait]
impl StoryService for FakeService {
    async fn fetch_all(&self) -> Result<Vec<Story>, ApiError> {
        let mut st = self.state.lock().unwrap();
        st.enter("fetch_all")?;
        Ok(st.stories.clone())
    }

    async fn create(&self, token: &str, new: &NewStory) -> Result<Story, ApiError> {
        let mut st = self.state.lock().unwrap();
        st.enter("create")?;
        let username = st.owner_of(token)?;
        if new.title.is_empty() {
            return Err(ApiError::Validation("title is required".into()));
        }
        st.next_id += 1;
        let story = Story {
            story_id: format!("new-{}", st.next_id),
            title: new.title.clone(),
            author: new.author.clone(),
            url: new.url.clone(),
            username: username.clone(),
            created_at: CREATED,
        };
        st.stories.insert(0, story.clone());
        if let Some((_, p)) = st.users.get_mut(&username) {
            p.stories.insert(0, story.clone());
        }
        Ok(story)
    }

    async fn delete(&self, token: &str, story_id: &str) -> Result<(), ApiError> {
        let mut st = self.state.lock().unwrap();
        st.enter("delete")?;
        let username = st.owner_of(token)?;
        let owner = st
            .stories
            .iter()
            .find(|s| s.story_id == story_id)
            .map(|s| s.username.clone())
            .ok_or_else(|| ApiError::NotFound(format!("no story {}", story_id)))?;
        if owner != username {
            return Err(ApiError::Auth("only the owner can delete a story".into()));
        }
        st.stories.retain(|s| s.story_id != story_id);
        for (_, p) in st.users.values_mut() {
            p.stories.retain(|s| s.story_id != story_id);
            p.favorites.retain(|s| s.story_id != story_id);
        }
        Ok(())
    }

    async fn signup(&self, username: &str, password: &str, name: &str) -> Result<Authenticated, ApiError> {
        {
            let mut st = self.state.lock().unwrap();
            st.enter("signup")?;
            if st.users.contains_key(username) {
                return Err(ApiError::Validation(format!("username {} taken", username)));
            }
        }
        let token = self.add_user(username, password);
        let mut st = self.state.lock().unwrap();
        if let Some((_, p)) = st.users.get_mut(username) {
            p.name = name.into();
        }
        let user = st.users[username].1.clone();
        Ok(Authenticated { token, user })
    }

    async fn login(&self, username: &str, password: &str) -> Result<Authenticated, ApiError> {
        let mut st = self.state.lock().unwrap();
        st.enter("login")?;
        match st.users.get(username) {
            Some((pw, profile)) if pw == password => Ok(Authenticated {
                token: format!("token-{}", username),
                user: profile.clone(),
            }),
            _ => Err(ApiError::Auth("invalid credentials".into())),
        }
    }

    async fn fetch_user(&self, token: &str, username: &str) -> Result<Profile, ApiError> {
        let mut st = self.state.lock().unwrap();
        st.enter("fetch_user")?;
        if st.owner_of(token)? != username {
            return Err(ApiError::Auth("token does not match user".into()));
        }
        st.users
            .get(username)
            .map(|(_, p)| p.clone())
            .ok_or_else(|| ApiError::NotFound(format!("no user {}", username)))
    }

    async fn set_favorite(
        &self,
        token: &str,
        username: &str,
        story_id: &str,
        present: bool,
    ) -> Result<(), ApiError> {
        let mut st = self.state.lock().unwrap();
        st.enter(if present { "favorite" } else { "unfavorite" })?;
        if st.owner_of(token)? != username {
            return Err(ApiError::Auth("token does not match user".into()));
        }
        let story = st
            .stories
            .iter()
            .find(|s| s.story_id == story_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("no story {}", story_id)))?;
        let (_, profile) = st
            .users
            .get_mut(username)
            .ok_or_else(|| ApiError::NotFound(format!("no user {}", username)))?;
        profile.favorites.retain(|s| s.story_id != story_id);
        if present {
            profile.favorites.push(story);
        }
        Ok(())
    }
}
