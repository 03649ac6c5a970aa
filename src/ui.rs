use anyhow::Result;
use console::style;
use dialoguer::{Input, Password};
use snooze_cli::util::sanitize::sanitize_for_terminal;
use snooze_cli::{FavoriteSync, Story, User};

const MAX_TITLE: usize = 200;

pub fn prompt_password(confirm: bool) -> Result<String> {
    let mut p = Password::new().with_prompt("Password");
    if confirm {
        p = p.with_confirmation("Repeat password", "Passwords do not match");
    }
    Ok(p.interact()?)
}

pub fn prompt_name() -> Result<String> {
    Ok(Input::<String>::new().with_prompt("Name").interact_text()?)
}

pub fn print_header(header: Option<&str>) {
    if let Some(h) = header {
        println!("{}", style(h).bold());
    }
}

pub fn print_stories(title: &str, stories: &[Story], user: Option<&User>, empty: &str) {
    println!("{}", style(title).underlined());
    if stories.is_empty() {
        println!("  {}", style(empty).dim());
        return;
    }
    for s in stories {
        println!("{}", story_line(s, user));
    }
}

fn story_line(story: &Story, user: Option<&User>) -> String {
    let star = match user {
        Some(u) if u.is_favorite(story) => format!("{} ", style("★").yellow()),
        Some(_) => "☆ ".to_string(),
        None => String::new(),
    };
    format!(
        "{}{} ({})\n    by {} | posted by {} | {}",
        star,
        style(sanitize_for_terminal(&story.title, MAX_TITLE)).bold(),
        sanitize_for_terminal(&story.host_name(), MAX_TITLE),
        sanitize_for_terminal(&story.author, MAX_TITLE),
        sanitize_for_terminal(&story.username, MAX_TITLE),
        style(&story.story_id).dim(),
    )
}

pub fn print_profile(user: &User) {
    println!("Name: {}", sanitize_for_terminal(user.name(), MAX_TITLE));
    println!("Username: {}", sanitize_for_terminal(user.username(), MAX_TITLE));
    println!("Account created: {}", user.member_since());
    println!(
        "{} own stories, {} favorites",
        user.own_stories().len(),
        user.favorites().len()
    );
}

pub fn report_favorite(action: &str, outcome: &FavoriteSync) {
    match outcome {
        FavoriteSync::Synced => println!("{} {}", style("✓").green(), action),
        FavoriteSync::RolledBack(e) => {
            println!("{} {} failed and was undone: {}", style("✗").red(), action, e)
        }
        FavoriteSync::Unsynced(e) => println!(
            "{} {} applied locally but not saved: {}",
            style("!").yellow(),
            action,
            e
        ),
    }
}
