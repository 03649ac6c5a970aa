mod model;

pub use model::{NewStory, Story};

use crate::api::StoryService;
use crate::error::ApiError;
use crate::user::User;

/// The global story feed, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryList {
    stories: Vec<Story>,
}

impl StoryList {
    pub fn new(stories: Vec<Story>) -> Self {
        let mut list = StoryList { stories: Vec::with_capacity(stories.len()) };
        for s in stories {
            if list.get(&s.story_id).is_none() {
                list.stories.push(s);
            }
        }
        list
    }

    /// Fetch the whole feed. Either every story arrives or the call fails.
    pub async fn fetch_all(service: &dyn StoryService) -> Result<Self, ApiError> {
        log::debug!("fetching stories");
        let stories = service.fetch_all().await?;
        log::debug!("fetched {} stories", stories.len());
        Ok(StoryList::new(stories))
    }

    pub fn stories(&self) -> &[Story] {
        &self.stories
    }

    pub fn len(&self) -> usize {
        self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    pub fn get(&self, story_id: &str) -> Option<&Story> {
        self.stories.iter().find(|s| s.story_id == story_id)
    }

    /// Post a story as `user`. The feed and the user's own stories gain the
    /// new story only once the service has accepted it.
    pub async fn add_story(
        &mut self,
        service: &dyn StoryService,
        user: &mut User,
        new: &NewStory,
    ) -> Result<Story, ApiError> {
        log::debug!("adding story {:?} for {}", new.title, user.username());
        let story = service.create(user.login_token(), new).await?;
        push_front(&mut self.stories, story.clone());
        user.record_own_story(story.clone());
        Ok(story)
    }

    /// Delete a story owned by `user`. Local collections are only touched
    /// after the service confirms the deletion.
    pub async fn remove_story(
        &mut self,
        service: &dyn StoryService,
        user: &mut User,
        story_id: &str,
    ) -> Result<(), ApiError> {
        log::debug!("removing story {} for {}", story_id, user.username());
        service.delete(user.login_token(), story_id).await?;
        self.stories.retain(|s| s.story_id != story_id);
        user.forget_story(story_id);
        Ok(())
    }
}

// Insert at the front, dropping any stale copy with the same id.
pub(crate) fn push_front(stories: &mut Vec<Story>, story: Story) {
    stories.retain(|s| s.story_id != story.story_id);
    stories.insert(0, story);
}
