use std::{env, path::PathBuf};

const APP_DIR: &str = "snooze-cli";

/// `$XDG_CONFIG_HOME/snooze-cli/<file_name>`, else `$HOME/.config/snooze-cli/<file_name>`.
pub fn config_file(file_name: &str) -> Option<PathBuf> {
    config_file_in(env::var("XDG_CONFIG_HOME").ok(), env::var("HOME").ok(), file_name)
}

fn config_file_in(xdg: Option<String>, home: Option<String>, file_name: &str) -> Option<PathBuf> {
    let mut p = match (xdg, home) {
        (Some(xdg), _) => PathBuf::from(xdg),
        (None, Some(home)) => PathBuf::from(home).join(".config"),
        (None, None) => return None,
    };
    p.push(APP_DIR);
    p.push(file_name);
    Some(p)
}
