use std::fmt;

use log::{debug, warn};
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Done(i32),
    Killed(i32),
}

#[derive(Debug, Clone)]
pub struct Job {
    pub index: usize,
    pub pids: Vec<Pid>,
    pub command: String,
    pub status: JobStatus,
    /// Processes of the job not reaped yet.
    pending: Vec<Pid>,
}

impl Job {
    fn new(index: usize, pids: Vec<Pid>, command: String) -> Self {
        Self {
            index,
            pending: pids.clone(),
            pids,
            command,
            status: JobStatus::Running,
        }
    }

    /// Announcement printed when the job starts: `[1] 4242 4243`.
    pub fn started(&self) -> String {
        let pids: Vec<String> = self.pids.iter().map(|p| p.to_string()).collect();
        format!("[{}] {}", self.index, pids.join(" "))
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self.status {
            JobStatus::Running => "running".to_string(),
            JobStatus::Done(0) => "done".to_string(),
            JobStatus::Done(code) => format!("exit {}", code),
            JobStatus::Killed(signal) => format!("killed ({})", signal),
        };
        write!(f, "[{}] {} {}", self.index, status, self.command)
    }
}

/// Exit status in shell convention: the exit code, or 128 + signal.
pub fn status_code(status: WaitStatus) -> Option<i32> {
    match status {
        WaitStatus::Exited(_, code) => Some(code),
        WaitStatus::Signaled(_, signal, _) => Some(128 + signal as i32),
        _ => None,
    }
}

/// Background jobs, reaped without blocking between prompts.
#[derive(Default)]
pub struct JobManager {
    jobs: Vec<Job>,
}

impl JobManager {
    pub fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    pub fn get_jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    fn find_available_index(&self) -> usize {
        let mut index = 1;
        while self.jobs.iter().any(|job| job.index == index) {
            index += 1;
        }
        index
    }

    pub fn add_job(&mut self, pids: Vec<Pid>, command: String) -> &Job {
        let index = self.find_available_index();
        debug!("background job [{}] {:?}: {}", index, pids, command);
        self.jobs.push(Job::new(index, pids, command));
        &self.jobs[self.jobs.len() - 1]
    }

    /// Collects every finished background job. A job is finished once all of
    /// its processes are reaped; its status is that of the last process.
    pub fn reap(&mut self) -> Vec<Job> {
        for job in self.jobs.iter_mut() {
            let last = job.pids.last().copied();
            job.pending.retain(|&pid| match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) => true,
                Ok(status) => {
                    if Some(pid) == last {
                        job.status = match status {
                            WaitStatus::Signaled(_, signal, _) => JobStatus::Killed(signal as i32),
                            status => JobStatus::Done(status_code(status).unwrap_or(0)),
                        };
                    }
                    !matches!(status, WaitStatus::Exited(..) | WaitStatus::Signaled(..))
                }
                Err(Errno::ECHILD) => false,
                Err(e) => {
                    warn!("waitpid {} failed: {}", pid, e);
                    true
                }
            });
        }

        let (finished, running): (Vec<Job>, Vec<Job>) =
            self.jobs.drain(..).partition(|job| job.pending.is_empty());
        self.jobs = running;
        finished
            .into_iter()
            .map(|mut job| {
                if job.status == JobStatus::Running {
                    job.status = JobStatus::Done(0);
                }
                job
            })
            .collect()
    }
}
