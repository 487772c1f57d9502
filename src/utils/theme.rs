use colored::Colorize;
use std::process::{Command, Stdio};

use crate::utils::config::Config;
use crate::utils::path::{basename, current_dir};

pub const VERSION_BANNER: &str = "DSH version 1.0";

pub struct Theme {
    pub colored: bool,
    pub symbol: String,
}

impl Theme {
    pub fn new(config: &Config) -> Self {
        Theme {
            colored: config.prompt_theme,
            symbol: config.prompt_symbol.clone(),
        }
    }

    pub fn welcome(&self) -> String {
        if self.colored {
            VERSION_BANNER.bright_cyan().to_string()
        } else {
            VERSION_BANNER.to_string()
        }
    }

    pub fn prompt(&self) -> String {
        let cwd = current_dir();
        self.render_prompt(&basename(&cwd), git_branch().as_deref())
    }

    pub fn render_prompt(&self, dir: &str, branch: Option<&str>) -> String {
        match (self.colored, branch) {
            (true, Some(branch)) => format!(
                "{} {} {} ",
                dir.bright_blue(),
                format!("(git:{})", branch).bright_magenta(),
                self.symbol.bright_cyan()
            ),
            (true, None) => format!("{} {} ", dir.bright_blue(), self.symbol.bright_cyan()),
            (false, Some(branch)) => format!("{} (git:{}) {} ", dir, branch, self.symbol),
            (false, None) => format!("{} {} ", dir, self.symbol),
        }
    }

    pub fn error(&self, message: &str) -> String {
        if self.colored {
            format!("{} {}", "✗".red(), message.bright_red())
        } else {
            format!("dsh: {}", message)
        }
    }
}

/// Branch of the git work tree containing the current directory, if any.
fn git_branch() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--abbrev-ref", "HEAD"])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let branch = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!branch.is_empty()).then_some(branch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> Theme {
        Theme {
            colored: false,
            symbol: String::from(">"),
        }
    }

    #[test]
    fn test_plain_prompt() {
        let theme = plain();
        assert_eq!(theme.render_prompt("src", None), "src > ");
        assert_eq!(theme.render_prompt("src", Some("main")), "src (git:main) > ");
    }

    #[test]
    fn test_plain_error() {
        assert_eq!(plain().error("boom"), "dsh: boom");
        assert_eq!(plain().welcome(), VERSION_BANNER);
    }
}
