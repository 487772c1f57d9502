use std::vec::IntoIter;

use log::debug;

use crate::shell::error::{Result, ShellError};
use crate::utils::config::Config;

use super::ast::{Pipeline, Stage, StageKind};
use super::expand::{expand_home, expand_word};
use super::lexer::{tokenize, Token};

pub struct Parser<'a, 'c> {
    tokens: IntoIter<Token<'a>>,
    config: &'c Config,
    stages: Vec<Stage>,
}

impl<'a, 'c> Parser<'a, 'c> {
    pub fn new(tokens: Vec<Token<'a>>, config: &'c Config) -> Self {
        Parser {
            tokens: tokens.into_iter(),
            config,
            stages: Vec::new(),
        }
    }

    /// Builds the stage sequence. A substitution failure abandons the whole
    /// line; none of the stages built so far are returned.
    pub fn parse(mut self) -> Result<Pipeline> {
        while let Some(token) = self.tokens.next() {
            match operator(&token) {
                Some(kind) => self.push_operator(kind)?,
                None => {
                    let word = expand_word(&token, self.config)?;
                    self.push_word(word);
                }
            }
        }
        Ok(Pipeline::new(self.stages))
    }

    /// Every operator follows a command or a redirection of that command.
    /// A missing command becomes an empty placeholder.
    fn push_operator(&mut self, kind: StageKind) -> Result<()> {
        let owned = self
            .stages
            .last()
            .is_some_and(|s| s.is_command() || s.kind.is_redirect());
        if !owned {
            self.stages.push(Stage::command(Vec::new()));
        }
        if kind.is_redirect() {
            let target = self
                .tokens
                .next()
                .ok_or(ShellError::MissingRedirectTarget(kind.symbol()))?;
            let target = expand_word(&target, self.config)?;
            self.stages.push(Stage::redirect(kind, target));
        } else {
            self.stages.push(Stage::operator(kind));
        }
        Ok(())
    }

    /// Words after a redirection target still belong to the redirected
    /// command, but never reach across a separator.
    fn push_word(&mut self, word: String) {
        let owner = self
            .stages
            .iter()
            .rposition(|s| !s.kind.is_redirect())
            .filter(|&i| self.stages[i].is_command());
        match owner {
            Some(i) => self.stages[i].argv.push(word),
            None => self.stages.push(Stage::command(vec![word])),
        }
    }
}

fn operator(token: &Token<'_>) -> Option<StageKind> {
    if token.quoted {
        None
    } else {
        StageKind::from_operator(token.text)
    }
}

/// Tilde expansion, tokenization and stage building for one raw line.
pub fn parse_line(line: &str, config: &Config) -> Result<Pipeline> {
    let line = expand_home(line);
    let tokens = tokenize(&line);
    debug!("tokens: {:?}", tokens);
    let pipeline = Parser::new(tokens, config).parse()?;
    debug!("parsed: {}", pipeline);
    Ok(pipeline)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Pipeline> {
        parse_line(line, &Config::default())
    }

    fn cmd(argv: &[&str]) -> Stage {
        Stage::command(argv.iter().map(|s| s.to_string()).collect())
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_simple_command() {
        let pipeline = parse("ls -l").unwrap();
        assert_eq!(pipeline.stages, vec![cmd(&["ls", "-l"])]);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_empty_line() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("  \t \n").unwrap().is_empty());
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_pipeline() {
        let pipeline = parse("ls -l | grep txt").unwrap();
        assert_eq!(
            pipeline.stages,
            vec![
                cmd(&["ls", "-l"]),
                Stage::operator(StageKind::Pipe),
                cmd(&["grep", "txt"]),
            ]
        );
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_redirections() {
        let pipeline = parse("sort < in.txt > out.txt 2> err.txt").unwrap();
        assert_eq!(
            pipeline.stages,
            vec![
                cmd(&["sort"]),
                Stage::redirect(StageKind::RedirectIn, "in.txt".into()),
                Stage::redirect(StageKind::RedirectOut, "out.txt".into()),
                Stage::redirect(StageKind::RedirectErr, "err.txt".into()),
            ]
        );
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_words_after_target_continue_command() {
        let pipeline = parse("echo >> log.txt hello world").unwrap();
        assert_eq!(
            pipeline.stages,
            vec![
                cmd(&["echo", "hello", "world"]),
                Stage::redirect(StageKind::RedirectAppend, "log.txt".into()),
            ]
        );
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_control_operators() {
        let pipeline = parse("make && ./app ; sleep 10 &").unwrap();
        assert_eq!(
            pipeline.stages,
            vec![
                cmd(&["make"]),
                Stage::operator(StageKind::Conditional),
                cmd(&["./app"]),
                Stage::operator(StageKind::Sequence),
                cmd(&["sleep", "10"]),
                Stage::operator(StageKind::Background),
            ]
        );
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_leading_operator_gets_placeholder() {
        let pipeline = parse("| wc").unwrap();
        assert_eq!(
            pipeline.stages,
            vec![cmd(&[]), Stage::operator(StageKind::Pipe), cmd(&["wc"])]
        );
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_quoted_operator_is_a_word() {
        let pipeline = parse(r#"echo "|" ">""#).unwrap();
        assert_eq!(pipeline.stages, vec![cmd(&["echo", "|", ">"])]);
    }

    #[test]
    fn test_missing_redirect_target() {
        assert!(matches!(
            parse("echo hi >"),
            Err(ShellError::MissingRedirectTarget(">"))
        ));
    }

    #[test]
    fn test_undefined_variable_aborts_line() {
        assert!(matches!(
            parse("echo ok ; $DSH_UNDEFINED_VAR_XYZ"),
            Err(ShellError::UndefinedVariable(_))
        ));
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_variable_in_target() {
        let path = std::env::var("PATH").unwrap();
        let pipeline = parse("echo hi > $PATH").unwrap();
        assert_eq!(pipeline.stages[1].target.as_deref(), Some(path.as_str()));
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_tilde_before_tokenizing() {
        let home = crate::utils::path::home_dir().to_string_lossy().into_owned();
        let src = format!("{}/src", home);
        let pipeline = parse("ls ~/src \"~\"").unwrap();
        assert_eq!(pipeline.stages, vec![cmd(&["ls", src.as_str(), "~"])]);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_redirect_after_separator_gets_own_command() {
        let pipeline = parse("echo one ; > out.txt echo two").unwrap();
        assert_eq!(
            pipeline.stages,
            vec![
                cmd(&["echo", "one"]),
                Stage::operator(StageKind::Sequence),
                cmd(&["echo", "two"]),
                Stage::redirect(StageKind::RedirectOut, "out.txt".into()),
            ]
        );
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_redirect_after_pipe_gets_own_command() {
        let pipeline = parse("echo a | < in.txt cat").unwrap();
        assert_eq!(
            pipeline.stages,
            vec![
                cmd(&["echo", "a"]),
                Stage::operator(StageKind::Pipe),
                cmd(&["cat"]),
                Stage::redirect(StageKind::RedirectIn, "in.txt".into()),
            ]
        );
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_leading_redirect_gets_placeholder() {
        let pipeline = parse("< in.txt wc -l").unwrap();
        assert_eq!(
            pipeline.stages,
            vec![
                cmd(&["wc", "-l"]),
                Stage::redirect(StageKind::RedirectIn, "in.txt".into()),
            ]
        );
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_adjacent_separators_get_placeholder() {
        let pipeline = parse("a && && b").unwrap();
        assert_eq!(
            pipeline.stages,
            vec![
                cmd(&["a"]),
                Stage::operator(StageKind::Conditional),
                cmd(&[]),
                Stage::operator(StageKind::Conditional),
                cmd(&["b"]),
            ]
        );
    }
}
