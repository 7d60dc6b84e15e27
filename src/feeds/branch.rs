use {
    crate::{
        config,
        fetch::{FetchError, ProcessError},
    },
    std::{
        ffi::OsString,
        io::{BufRead, BufReader},
        path::PathBuf,
        process::{Child, Command, ExitStatus, Stdio},
        thread,
        time::{Duration, Instant},
    },
    tracing::debug,
};

/// a command that prints the current branch name on its first line of output.
#[derive(Clone, Debug)]
pub struct BranchCommand {
    program: OsString,
    args: Vec<OsString>,
    /// the working directory the command runs in.
    dir: PathBuf,
    /// how long to wait for the command to exit.
    wait: Duration,
}

// === impl BranchCommand ===

impl BranchCommand {
    /// how often a running child is checked for exit.
    const POLL: Duration = Duration::from_millis(10);

    /// `git rev-parse --abbrev-ref HEAD`, run in `dir`.
    pub fn git(dir: PathBuf) -> Self {
        Self::new("git", ["rev-parse", "--abbrev-ref", "HEAD"], dir, config::BRANCH_WAIT)
    }

    pub fn new(
        program: impl Into<OsString>,
        args: impl IntoIterator<Item = impl Into<OsString>>,
        dir: PathBuf,
        wait: Duration,
    ) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            dir,
            wait,
        }
    }

    /// runs the command, returning the trimmed first line of its output.
    ///
    /// the command must exit successfully within the wait, and print a non-empty first line.
    pub fn resolve(&self) -> Result<String, ProcessError> {
        let Self {
            program,
            args,
            dir,
            wait,
        } = self;

        let mut child = Command::new(program)
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(ProcessError::Spawn)?;

        let status = Self::wait(&mut child, *wait)?;
        if !status.success() {
            return Err(ProcessError::ExitStatus {
                code: status.code(),
            });
        }

        let mut line = String::new();
        if let Some(stdout) = child.stdout.take() {
            BufReader::new(stdout).read_line(&mut line)?;
        }

        let branch = line.trim();
        if branch.is_empty() {
            return Err(ProcessError::EmptyOutput);
        }

        debug!(event = "termdash.branch.resolved", branch);
        Ok(branch.to_owned())
    }

    /// waits for the child to exit, killing it once `wait` has passed.
    fn wait(child: &mut Child, wait: Duration) -> Result<ExitStatus, ProcessError> {
        let deadline = Instant::now() + wait;

        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }

            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ProcessError::Timeout { after: wait });
            }

            thread::sleep(Self::POLL);
        }
    }
}

/// the text shown in place of the branch after a failed resolution.
pub fn sentinel(_: &FetchError) -> String {
    config::BRANCH_SENTINEL.to_owned()
}
