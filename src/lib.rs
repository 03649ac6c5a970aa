//! Client-side model for the Hack or Snooze story service: the story feed,
//! the logged-in user with their own and favorited stories, and session
//! persistence, all kept consistent with the remote API.

pub mod api;
pub mod config;
pub mod error;
pub mod session;
pub mod stories;
pub mod user;
pub mod util;

pub use api::{Authenticated, HttpStoryService, Profile, StoryService};
pub use error::{ApiError, StoreError};
pub use session::{FileStore, KeyValueStore, MemoryStore, SessionState, SessionStore};
pub use stories::{NewStory, Story, StoryList};
pub use user::{FavoritePolicy, FavoriteSync, User};
