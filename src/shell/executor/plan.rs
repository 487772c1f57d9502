use std::fmt;

use crate::shell::parser::{Pipeline, Stage, StageKind};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Redirect<'p> {
    pub kind: StageKind,
    pub target: &'p str,
}

/// One command stage together with the redirections that follow it.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Invocation<'p> {
    pub argv: &'p [String],
    pub redirects: Vec<Redirect<'p>>,
}

impl<'p> Invocation<'p> {
    fn new(stage: &'p Stage) -> Self {
        Invocation {
            argv: &stage.argv,
            redirects: Vec::new(),
        }
    }

    /// Stands in for a missing command; nothing is spawned for it.
    fn empty() -> Self {
        Invocation {
            argv: &[],
            redirects: Vec::new(),
        }
    }

    pub fn program(&self) -> Option<&'p str> {
        self.argv.first().map(String::as_str)
    }
}

/// When a unit runs, decided by the operator in front of it.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Condition {
    Always,
    /// After `&&`: only if the last foreground status was 0.
    OnSuccess,
}

/// Commands joined by pipes, ended by `;`, `&&`, `&` or the end of the line.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Unit<'p> {
    pub commands: Vec<Invocation<'p>>,
    pub background: bool,
    pub condition: Condition,
}

impl<'p> Unit<'p> {
    fn new(condition: Condition) -> Self {
        Unit {
            commands: Vec::new(),
            background: false,
            condition,
        }
    }
}

impl fmt::Display for Unit<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, command) in self.commands.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            f.write_str(&shell_words::join(command.argv))?;
            for redirect in &command.redirects {
                write!(
                    f,
                    " {} {}",
                    redirect.kind.symbol(),
                    shell_words::quote(redirect.target)
                )?;
            }
        }
        if self.background {
            f.write_str(" &")?;
        }
        Ok(())
    }
}

/// Walks the stage sequence once. Each command stage absorbs the redirection
/// stages after it; the first non-redirection operator decides how it
/// connects to the next command.
pub fn plan(pipeline: &Pipeline) -> Vec<Unit<'_>> {
    let mut units = Vec::new();
    let mut unit = Unit::new(Condition::Always);

    for stage in pipeline.iter() {
        match stage.kind {
            StageKind::Command => unit.commands.push(Invocation::new(stage)),
            kind if kind.is_redirect() => {
                let target = stage.target.as_deref().unwrap_or_default();
                match unit.commands.last_mut() {
                    Some(command) => command.redirects.push(Redirect { kind, target }),
                    None => {
                        let mut command = Invocation::empty();
                        command.redirects.push(Redirect { kind, target });
                        unit.commands.push(command);
                    }
                }
            }
            StageKind::Pipe => {}
            StageKind::Background => {
                unit.background = true;
                units.push(std::mem::replace(&mut unit, Unit::new(Condition::Always)));
            }
            StageKind::Sequence => {
                units.push(std::mem::replace(&mut unit, Unit::new(Condition::Always)));
            }
            StageKind::Conditional => {
                units.push(std::mem::replace(&mut unit, Unit::new(Condition::OnSuccess)));
            }
            _ => {}
        }
    }
    units.push(unit);
    units.retain(|u| !u.commands.is_empty());
    units
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::parser::parse_line;
    use crate::utils::config::Config;

    fn parse(line: &str) -> Pipeline {
        parse_line(line, &Config::default()).unwrap_or_default()
    }

    fn programs<'a>(unit: &'a Unit<'a>) -> Vec<&'a str> {
        unit.commands.iter().filter_map(|c| c.program()).collect()
    }

    #[test]
    fn test_pipe_joins_commands() {
        let pipeline = parse("ls -l | grep txt | wc -l");
        let units = plan(&pipeline);
        assert_eq!(units.len(), 1);
        assert_eq!(programs(&units[0]), vec!["ls", "grep", "wc"]);
        assert!(!units[0].background);
    }

    #[test]
    fn test_redirects_attach_to_command() {
        let pipeline = parse("sort < in.txt | uniq > out.txt 2> err.txt");
        let units = plan(&pipeline);
        assert_eq!(units.len(), 1);
        let commands = &units[0].commands;
        assert_eq!(
            commands[0].redirects,
            vec![Redirect {
                kind: StageKind::RedirectIn,
                target: "in.txt"
            }]
        );
        assert_eq!(commands[1].redirects.len(), 2);
        assert_eq!(commands[1].redirects[1].kind, StageKind::RedirectErr);
    }

    #[test]
    fn test_control_operators_split_units() {
        let pipeline = parse("make && ./app ; sleep 5 & echo done");
        let units = plan(&pipeline);
        let summary: Vec<_> = units
            .iter()
            .map(|u| (programs(u), u.condition, u.background))
            .collect();
        assert_eq!(
            summary,
            vec![
                (vec!["make"], Condition::Always, false),
                (vec!["./app"], Condition::OnSuccess, false),
                (vec!["sleep"], Condition::Always, true),
                (vec!["echo"], Condition::Always, false),
            ]
        );
    }

    #[test]
    fn test_trailing_separator_adds_no_unit() {
        let pipeline = parse("echo one ;");
        assert_eq!(plan(&pipeline).len(), 1);
        assert!(plan(&Pipeline::default()).is_empty());
    }

    #[test]
    fn test_display() {
        let pipeline = parse("grep \"a b\" < in.txt | wc -l &");
        let units = plan(&pipeline);
        assert_eq!(units[0].to_string(), "grep 'a b' < in.txt | wc -l &");
    }

    #[test]
    fn test_redirect_after_separator_stays_in_its_unit() {
        let pipeline = parse("echo one ; > out.txt echo two");
        let units = plan(&pipeline);
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].commands[0].argv, ["echo", "one"]);
        assert!(units[0].commands[0].redirects.is_empty());
        assert_eq!(units[1].commands[0].argv, ["echo", "two"]);
        assert_eq!(
            units[1].commands[0].redirects,
            vec![Redirect {
                kind: StageKind::RedirectOut,
                target: "out.txt"
            }]
        );
    }

    #[test]
    fn test_unowned_redirect_is_kept() {
        let pipeline = Pipeline::new(vec![
            Stage::operator(StageKind::Sequence),
            Stage::redirect(StageKind::RedirectOut, "out.txt".into()),
        ]);
        let units = plan(&pipeline);
        assert_eq!(units.len(), 1);
        assert!(units[0].commands[0].argv.is_empty());
        assert_eq!(units[0].commands[0].redirects.len(), 1);
    }
}
