use mockito::{Server, ServerGuard};
use once_cell::sync::Lazy;
use std::{
    env,
    ffi::OsStr,
    path::PathBuf,
    process::{Command, Output},
};
use tempfile::TempDir;

static CLI_PATH: Lazy<PathBuf> = Lazy::new(|| {
    env::current_exe()
        .ok()
        .and_then(|path| Some(path.parent()?.parent()?.join("cav")))
        .expect("Could not resolve CLI executable from test executable")
});

pub const TOKEN: &str = "s3cr3t";

/// Runs `cav` against a mock platform, with a private profiles file and working directory.
pub struct TestCli {
    pub server: ServerGuard,
    pub dir: TempDir,
}

impl TestCli {
    pub fn new() -> Self {
        Self {
            server: Server::new(),
            dir: TempDir::new().expect("Could not create temporary directory"),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, contents).expect("Could not write test input");
        path
    }

    pub fn config_path(&self) -> PathBuf {
        self.path("profiles.json")
    }

    /// A command with only the profiles file set, as if no profile had been configured.
    pub fn bare_command(&self) -> Command {
        let mut command = Command::new(&*CLI_PATH);
        command
            .current_dir(self.dir.path())
            .arg("--config-file")
            .arg(self.config_path());
        command
    }

    pub fn command(&self) -> Command {
        let mut command = self.bare_command();
        command
            .arg("--endpoint")
            .arg(self.server.url())
            .arg("--token")
            .arg(TOKEN);
        command
    }

    pub fn run(&self, args: impl IntoIterator<Item = impl AsRef<OsStr>>) -> String {
        output(self.command().args(args))
    }

    /// Like `run`, also returning what was logged to stderr.
    pub fn run_with_log(
        &self,
        args: impl IntoIterator<Item = impl AsRef<OsStr>>,
    ) -> (String, String) {
        output_with_log(self.command().args(args))
    }

    pub fn run_and_error(&self, args: impl IntoIterator<Item = impl AsRef<OsStr>>) -> String {
        output_error(self.command().args(args))
    }
}

pub fn output(command: &mut Command) -> String {
    output_with_log(command).0
}

pub fn output_with_log(command: &mut Command) -> (String, String) {
    let output = run(command);
    if !output.status.success() {
        panic!(
            "failed to run command:\n{}",
            String::from_utf8_lossy(&output.stderr)
        );
    }
    (
        String::from_utf8(output.stdout).unwrap(),
        String::from_utf8(output.stderr).unwrap(),
    )
}

pub fn output_error(command: &mut Command) -> String {
    let output = run(command);
    if output.status.success() {
        panic!(
            "succeeded running command (expected failure):\n{}",
            String::from_utf8_lossy(&output.stdout)
        );
    }
    assert_eq!(output.status.code(), Some(1));
    String::from_utf8(output.stderr).unwrap()
}

fn run(command: &mut Command) -> Output {
    command.output().expect("Could not run the CLI")
}
