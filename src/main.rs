mod ui;

use anyhow::{Context, Result, anyhow, bail};
use snooze_cli::config::{self, RuntimeConfig};
use snooze_cli::{FileStore, HttpStoryService, NewStory, SessionStore, Story, StoryList, User};
use std::env;
use std::path::PathBuf;
use url::Url;

enum Command {
    Stories,
    Signup(String),
    Login(String),
    Logout,
    Profile,
    Mine,
    Favorites,
    Post { title: String, author: String, url: String },
    Delete(String),
    Favorite(String),
    Unfavorite(String),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("warn"));

    let mut args = env::args().skip(1);
    let mut config_override: Option<String> = None;
    let mut base_url_override: Option<String> = None;
    let mut rest: Vec<String> = Vec::new();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config_override = args.next(),
            "--base-url" => base_url_override = args.next(),
            "-h" | "--help" => {
                print_help();
                return Ok(());
            }
            _ => rest.push(arg),
        }
    }
    let Some(cmd) = parse_command(rest)? else {
        print_help();
        return Ok(());
    };

    let cfg = config::load(config_override, base_url_override)?;
    run(&cfg, cmd).await
}

fn parse_command(args: Vec<String>) -> Result<Option<Command>> {
    let mut it = args.into_iter();
    let Some(name) = it.next() else { return Ok(None) };
    let cmd = match name.as_str() {
        "stories" => Command::Stories,
        "signup" => Command::Signup(required(&mut it, &name, "username")?),
        "login" => Command::Login(required(&mut it, &name, "username")?),
        "logout" => Command::Logout,
        "profile" | "whoami" => Command::Profile,
        "mine" => Command::Mine,
        "favorites" => Command::Favorites,
        "delete" => Command::Delete(required(&mut it, &name, "story id")?),
        "favorite" => Command::Favorite(required(&mut it, &name, "story id")?),
        "unfavorite" => Command::Unfavorite(required(&mut it, &name, "story id")?),
        "post" => {
            let (mut title, mut author, mut url) = (None, None, None);
            while let Some(flag) = it.next() {
                let slot = match flag.as_str() {
                    "--title" => &mut title,
                    "--author" => &mut author,
                    "--url" => &mut url,
                    other => bail!("unknown option for post: {}", other),
                };
                *slot = it.next();
            }
            Command::Post {
                title: title.context("post requires --title")?,
                author: author.context("post requires --author")?,
                url: url.context("post requires --url")?,
            }
        }
        other => bail!("unknown command: {}", other),
    };
    Ok(Some(cmd))
}

fn required(it: &mut impl Iterator<Item = String>, cmd: &str, what: &str) -> Result<String> {
    it.next().ok_or_else(|| anyhow!("{} requires a {}", cmd, what))
}

async fn run(cfg: &RuntimeConfig, cmd: Command) -> Result<()> {
    let service = HttpStoryService::new(cfg).context("failed to set up HTTP client")?;
    let session_path = cfg
        .session_file
        .clone()
        .unwrap_or_else(|| PathBuf::from("snooze-session.json"));
    let mut session = SessionStore::new(FileStore::open(session_path));
    let current = session.restore(&service).await;

    ui::print_header(cfg.header.as_deref());

    match cmd {
        Command::Stories => {
            let feed = StoryList::fetch_all(&service).await?;
            ui::print_stories("Stories", feed.stories(), current.as_ref(), "No stories yet.");
        }
        Command::Signup(username) => {
            let name = ui::prompt_name()?;
            let password = ui::prompt_password(true)?;
            let user = User::signup(&service, &username, &password, &name).await?;
            session.sign_in(&user).context("failed to save session")?;
            println!("Signed up as {}", user.username());
        }
        Command::Login(username) => {
            let password = ui::prompt_password(false)?;
            let user = User::login(&service, &username, &password).await?;
            session.sign_in(&user).context("failed to save session")?;
            println!("Logged in as {}", user.username());
        }
        Command::Logout => {
            session.logout().context("failed to clear session")?;
            println!("Logged out");
        }
        Command::Profile => ui::print_profile(&require(current)?),
        Command::Mine => {
            let user = require(current)?;
            ui::print_stories("My stories", user.own_stories(), Some(&user), "You don't have any stories yet!");
        }
        Command::Favorites => {
            let user = require(current)?;
            ui::print_stories("Favorites", user.favorites(), Some(&user), "You haven't favorited any stories!");
        }
        Command::Post { title, author, url } => {
            let mut user = require(current)?;
            let url = Url::parse(&url).with_context(|| format!("invalid story URL: {}", url))?;
            let mut feed = StoryList::fetch_all(&service).await?;
            let story = feed
                .add_story(&service, &mut user, &NewStory { title, author, url })
                .await?;
            println!("Posted {}", story.story_id);
        }
        Command::Delete(story_id) => {
            let mut user = require(current)?;
            let mut feed = StoryList::fetch_all(&service).await?;
            feed.remove_story(&service, &mut user, &story_id).await?;
            println!("Deleted {}", story_id);
        }
        Command::Favorite(story_id) => {
            let mut user = require(current)?;
            let story = find_story(&service, &user, &story_id).await?;
            let outcome = user.add_favorite(&service, &story, cfg.favorite_policy).await;
            ui::report_favorite("favorite", &outcome);
        }
        Command::Unfavorite(story_id) => {
            let mut user = require(current)?;
            let story = find_story(&service, &user, &story_id).await?;
            let outcome = user.delete_favorite(&service, &story, cfg.favorite_policy).await;
            ui::report_favorite("unfavorite", &outcome);
        }
    }
    Ok(())
}

fn require(user: Option<User>) -> Result<User> {
    user.ok_or_else(|| anyhow!("not logged in; run `snooze-cli login <username>` first"))
}

async fn find_story(service: &HttpStoryService, user: &User, story_id: &str) -> Result<Story> {
    if let Some(s) = user.favorites().iter().find(|s| s.story_id == story_id) {
        return Ok(s.clone());
    }
    let feed = StoryList::fetch_all(service).await?;
    feed.get(story_id)
        .cloned()
        .ok_or_else(|| anyhow!("no story with id {}", story_id))
}

fn print_help() {
    println!("snooze-cli");
    println!("Usage: snooze-cli [--config <path>] [--base-url <url>] <command>");
    println!("  stories                 List the story feed");
    println!("  signup <username>       Create an account and log in");
    println!("  login <username>        Log in");
    println!("  logout                  Forget the stored session");
    println!("  profile                 Show the logged-in user");
    println!("  mine                    List your own stories");
    println!("  favorites               List your favorites");
    println!("  post --title <t> --author <a> --url <u>");
    println!("  delete <story-id>       Delete one of your stories");
    println!("  favorite <story-id>     Add a favorite");
    println!("  unfavorite <story-id>   Remove a favorite");
}
