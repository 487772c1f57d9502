use log::{debug, error, info, warn};
use std::io::Write;

use crate::shell::context::ShellContext;
use crate::shell::error::{Result, ShellError};
use crate::shell::executor::{Executor, Flow, JobManager};
use crate::shell::history::History;
use crate::shell::parser::parse_line;
use crate::shell::readline::{ReadlineError, ReadlineManager};
use crate::shell::signals;
use crate::utils::config::Config;
use crate::utils::theme::Theme;

pub struct Shell {
    context: ShellContext,
    theme: Theme,
    readline: ReadlineManager,
    executor: Executor,
}

impl Shell {
    pub fn new(config: Config) -> Result<Self> {
        let history = match History::load(&config.history_file, config.history_size) {
            Ok(history) => history,
            Err(e) => {
                warn!(
                    "cannot load history {}: {}",
                    config.history_file.display(),
                    e
                );
                History::in_memory(config.history_size)
            }
        };
        let mut readline = ReadlineManager::new(&config)?;
        readline.seed(&history)?;

        Ok(Self {
            theme: Theme::new(&config),
            context: ShellContext::new(config, history),
            readline,
            executor: Executor::new(JobManager::new()),
        })
    }

    pub fn run(&mut self) -> Result<()> {
        debug!("starting dsh...");
        signals::ignore_interrupt()?;

        println!("{}", self.theme.welcome());
        self.run_loop()?;

        let jobs = self.executor.jobs();
        if !jobs.is_empty() {
            warn!("leaving with {} background job(s) running", jobs.len());
            for job in jobs.get_jobs() {
                warn!("still running: {}", job);
            }
        }
        debug!("leaving dsh...");
        Ok(())
    }

    fn run_loop(&mut self) -> Result<()> {
        loop {
            self.report_finished_jobs();
            std::io::stdout().flush()?;
            let prompt = self.theme.prompt();

            match self.readline.readline(&prompt) {
                Ok(line) => match self.handle_input(&line) {
                    Ok(Flow::Exit) => {
                        info!("exit requested");
                        break;
                    }
                    Ok(Flow::Continue) => {}
                    Err(e) if e.is_fatal() => {
                        error!("fatal: {}", e);
                        return Err(e);
                    }
                    Err(e) => {
                        error!("{}: {}", line.trim(), e);
                        eprintln!("{}", self.theme.error(&e.to_string()));
                    }
                },
                Err(ReadlineError::Eof) => {
                    info!("EOF, leaving dsh");
                    break;
                }
                Err(ReadlineError::Interrupted) => {
                    debug!("interrupted at the prompt");
                }
                Err(err) => {
                    error!("readline failed: {}", err);
                    return Err(ShellError::Readline(err));
                }
            }
        }
        Ok(())
    }

    fn handle_input(&mut self, line: &str) -> Result<Flow> {
        if line.trim().is_empty() {
            return Ok(Flow::Continue);
        }

        if let Err(e) = self.context.history.record(line) {
            warn!("cannot append to history: {}", e);
        }
        self.readline.add_history(line)?;
        debug!("input: {}", line);

        let pipeline = parse_line(line, &self.context.config)?;
        if pipeline.is_empty() {
            return Ok(Flow::Continue);
        }
        self.executor.execute(&pipeline, &mut self.context)
    }

    fn report_finished_jobs(&mut self) {
        for job in self.executor.reap_background() {
            info!("background job finished: {}", job);
            println!("{}", job);
        }
    }
}
