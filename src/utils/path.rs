use std::path::Path;

use crate::core::Project;

/// Shorten a path for display, replacing home directory with ~ and truncating long paths
pub fn shorten_path_for_display(path: &str) -> String {
    let path_buf = Path::new(path);

    if let Some(user_dirs) = directories::UserDirs::new() {
        let home_dir = user_dirs.home_dir();
        if let Ok(relative_path) = path_buf.strip_prefix(home_dir) {
            let home_path = if relative_path.as_os_str().is_empty() {
                "~".to_string()
            } else {
                format!("~/{}", relative_path.to_string_lossy())
            };
            return shorten_long_path(&home_path);
        }
    }

    shorten_long_path(path)
}

/// Truncate the middle of long paths, keeping both ends readable
fn shorten_long_path(path: &str) -> String {
    const MAX_CHARS: usize = 50;

    let chars: Vec<char> = path.chars().collect();
    if chars.len() <= MAX_CHARS {
        return path.to_string();
    }

    let head: String = chars[..MAX_CHARS / 2 - 2].iter().collect();
    let tail: String = chars[chars.len() - (MAX_CHARS / 2 - 1)..].iter().collect();
    format!("{}...{}", head, tail)
}

/// One-line sidebar label: display name, session count, shortened path
pub fn project_label(project: &Project) -> String {
    let name = project.display_name.as_deref().unwrap_or(&project.name);
    let path = project
        .full_path
        .as_deref()
        .or(project.path.as_deref())
        .map(shorten_path_for_display)
        .unwrap_or_default();

    format!("{} ({} sessions) {}", name, project.session_meta.total, path)
        .trim_end()
        .to_string()
}
