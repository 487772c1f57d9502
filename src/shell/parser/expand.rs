use std::borrow::Cow;

use crate::shell::error::{Result, ShellError};
use crate::utils::config::Config;
use crate::utils::path::home_dir;

use super::lexer::Token;

/// Reserved token replaced by the configured editor.
pub const EDITOR_PLACEHOLDER: &str = "$EDITOR";

/// Replaces an unquoted `~` that starts a word (and is followed by `/`,
/// whitespace or the end of the line) with the home directory.
pub fn expand_home(line: &str) -> Cow<'_, str> {
    if !line.contains('~') {
        return Cow::Borrowed(line);
    }
    let home = home_dir();
    let home = home.to_string_lossy();

    let mut out = String::with_capacity(line.len() + home.len());
    let mut in_quotes = false;
    let mut word_start = true;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => in_quotes = !in_quotes,
            '~' if !in_quotes && word_start => {
                let ends_word = match chars.peek() {
                    None => true,
                    Some(&next) => next == '/' || next.is_whitespace(),
                };
                if ends_word {
                    out.push_str(&home);
                    word_start = false;
                    continue;
                }
            }
            _ => {}
        }
        word_start = !in_quotes && c.is_whitespace();
        out.push(c);
    }
    Cow::Owned(out)
}

/// Turns a plain token into an argument. Quoted tokens are copied verbatim;
/// otherwise the editor placeholder wins over `$NAME` expansion.
pub fn expand_word(token: &Token<'_>, config: &Config) -> Result<String> {
    if token.quoted {
        return Ok(token.text.to_string());
    }
    if token.text == EDITOR_PLACEHOLDER {
        return config.editor.clone().ok_or(ShellError::EditorNotConfigured);
    }
    if token.text.starts_with('$') {
        return shellexpand::env(token.text)
            .map(Cow::into_owned)
            .map_err(|e| ShellError::UndefinedVariable(format!("${}", e.var_name)));
    }
    Ok(token.text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_editor(editor: Option<&str>) -> Config {
        let mut config = Config::default();
        config.editor = editor.map(String::from);
        config
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_env_variable() {
        let config = Config::default();
        let path = std::env::var("PATH").unwrap();
        let word = expand_word(&Token::word("$PATH"), &config).unwrap();
        assert_eq!(word, path);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_env_variable_with_suffix() {
        let config = Config::default();
        let path = std::env::var("PATH").unwrap();
        let word = expand_word(&Token::word("$PATH/extra"), &config).unwrap();
        assert_eq!(word, format!("{}/extra", path));
    }

    #[test]
    fn test_undefined_variable() {
        let config = Config::default();
        let err = expand_word(&Token::word("$DSH_UNDEFINED_VAR_XYZ"), &config);
        assert!(matches!(
            err,
            Err(ShellError::UndefinedVariable(ref name)) if name == "$DSH_UNDEFINED_VAR_XYZ"
        ));
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_quoted_is_verbatim() {
        let config = Config::default();
        let word = expand_word(&Token::quoted("$DSH_UNDEFINED_VAR_XYZ"), &config).unwrap();
        assert_eq!(word, "$DSH_UNDEFINED_VAR_XYZ");
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_editor_placeholder() {
        let config = config_with_editor(Some("/usr/bin/vim"));
        let word = expand_word(&Token::word(EDITOR_PLACEHOLDER), &config).unwrap();
        assert_eq!(word, "/usr/bin/vim");

        let config = config_with_editor(None);
        assert!(matches!(
            expand_word(&Token::word(EDITOR_PLACEHOLDER), &config),
            Err(ShellError::EditorNotConfigured)
        ));
    }

    #[test]
    fn test_expand_home() {
        let home = home_dir().to_string_lossy().into_owned();
        assert_eq!(expand_home("cd ~"), format!("cd {}", home));
        assert_eq!(expand_home("ls ~/src"), format!("ls {}/src", home));
        assert_eq!(expand_home("ls ~user"), "ls ~user");
        assert_eq!(expand_home("echo a~b"), "echo a~b");
        assert_eq!(expand_home(r#"echo "~""#), r#"echo "~""#);
        assert_eq!(expand_home("ls -l"), "ls -l");
    }
}
