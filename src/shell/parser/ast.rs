use std::fmt;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum StageKind {
    Command,
    Pipe,           // |
    RedirectIn,     // <
    RedirectOut,    // >
    RedirectErr,    // 2>
    RedirectAppend, // >>
    Background,     // &
    Sequence,       // ;
    Conditional,    // &&
}

impl StageKind {
    pub fn from_operator(token: &str) -> Option<StageKind> {
        match token {
            "|" => Some(StageKind::Pipe),
            "<" => Some(StageKind::RedirectIn),
            ">" => Some(StageKind::RedirectOut),
            "2>" => Some(StageKind::RedirectErr),
            ">>" => Some(StageKind::RedirectAppend),
            "&" => Some(StageKind::Background),
            ";" => Some(StageKind::Sequence),
            "&&" => Some(StageKind::Conditional),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            StageKind::Command => "",
            StageKind::Pipe => "|",
            StageKind::RedirectIn => "<",
            StageKind::RedirectOut => ">",
            StageKind::RedirectErr => "2>",
            StageKind::RedirectAppend => ">>",
            StageKind::Background => "&",
            StageKind::Sequence => ";",
            StageKind::Conditional => "&&",
        }
    }

    pub fn is_redirect(self) -> bool {
        matches!(
            self,
            StageKind::RedirectIn
                | StageKind::RedirectOut
                | StageKind::RedirectErr
                | StageKind::RedirectAppend
        )
    }
}

/// One element of a pipeline: a command with its argv, or an operator.
/// Redirection stages carry their target file in `target`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Stage {
    pub kind: StageKind,
    pub argv: Vec<String>,
    pub target: Option<String>,
}

impl Stage {
    pub fn command(argv: Vec<String>) -> Self {
        Stage {
            kind: StageKind::Command,
            argv,
            target: None,
        }
    }

    pub fn operator(kind: StageKind) -> Self {
        Stage {
            kind,
            argv: Vec::new(),
            target: None,
        }
    }

    pub fn redirect(kind: StageKind, target: String) -> Self {
        Stage {
            kind,
            argv: Vec::new(),
            target: Some(target),
        }
    }

    pub fn is_command(&self) -> bool {
        self.kind == StageKind::Command
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.target) {
            (StageKind::Command, _) => f.write_str(&shell_words::join(&self.argv)),
            (kind, Some(target)) => write!(f, "{} {}", kind.symbol(), shell_words::quote(target)),
            (kind, None) => f.write_str(kind.symbol()),
        }
    }
}

/// The stages parsed from one input line, in lexical order. Owns every
/// string of the line and is dropped as a unit.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Pipeline {
    pub stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new(stages: Vec<Stage>) -> Self {
        Pipeline { stages }
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Stage> {
        self.stages.iter()
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for stage in self.stages.iter().filter(|s| !(s.is_command() && s.argv.is_empty())) {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{}", stage)?;
            first = false;
        }
        Ok(())
    }
}
