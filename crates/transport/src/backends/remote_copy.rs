//! RemoteCopyBackend - `ssh` or `bbcp` child processes

use std::path::Path;
use std::process::Stdio;

use contracts::{ArtifactPath, ContractError, TransportBackend, TransportOptions};
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::destination::{CopyMode, RemoteTarget};

/// Bytes of stderr kept in error messages
const STDERR_TAIL: usize = 512;

/// Copies artifacts by running an external program per file
pub struct RemoteCopyBackend {
    target: RemoteTarget,
    program: String,
    keepalive_secs: Option<u64>,
}

impl RemoteCopyBackend {
    pub fn new(target: RemoteTarget, options: &TransportOptions) -> Self {
        let program = match target.mode {
            CopyMode::Ssh => options.ssh_program.clone(),
            CopyMode::Bbcp => options.bbcp_program.clone(),
        };
        Self {
            target,
            program,
            keepalive_secs: options.tcp_keepalive_secs,
        }
    }

    fn backend_name(&self) -> &'static str {
        match self.target.mode {
            CopyMode::Ssh => "ssh",
            CopyMode::Bbcp => "bbcp",
        }
    }

    /// `mkdir -p` and `cat >` in one round trip, file content on stdin
    async fn ssh_command(
        &self,
        local_file: &Path,
        remote_file: &str,
    ) -> Result<Command, ContractError> {
        let dir = remote_file
            .rsplit_once('/')
            .map(|(dir, _)| dir)
            .filter(|dir| !dir.is_empty())
            .unwrap_or(".");
        let stdin = tokio::fs::File::open(local_file)
            .await
            .map_err(|e| ContractError::transfer("ssh", remote_file, format!("open failed: {e}")))?
            .into_std()
            .await;

        let mut command = Command::new(&self.program);
        if let Some(secs) = self.keepalive_secs {
            command.arg("-o").arg(format!("ServerAliveInterval={secs}"));
        }
        command
            .arg(&self.target.host)
            .arg(format!(
                "mkdir -p {} && cat > {}",
                shell_quote(dir),
                shell_quote(remote_file)
            ))
            .stdin(Stdio::from(stdin));
        Ok(command)
    }

    fn bbcp_command(&self, local_file: &Path, remote_file: &str) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("-A")
            .arg(local_file)
            .arg(format!("{}:{}", self.target.host, remote_file))
            .stdin(Stdio::null());
        command
    }
}

impl TransportBackend for RemoteCopyBackend {
    fn name(&self) -> &str {
        self.backend_name()
    }

    #[instrument(
        name = "remote_copy_transfer",
        skip(self, local_file),
        fields(host = %self.target.host, remote = %remote)
    )]
    async fn transfer(
        &mut self,
        local_file: &Path,
        remote: &ArtifactPath,
    ) -> Result<(), ContractError> {
        let backend = self.backend_name();
        let remote_file = self.target.remote_path(remote.as_str());
        let destination = format!("{}:{}", self.target.host, remote_file);

        let mut command = match self.target.mode {
            CopyMode::Ssh => self.ssh_command(local_file, &remote_file).await?,
            CopyMode::Bbcp => self.bbcp_command(local_file, &remote_file),
        };
        let output = command
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                ContractError::transfer(
                    backend,
                    &destination,
                    format!("cannot run '{}': {e}", self.program),
                )
            })?;

        if !output.status.success() {
            let code = output
                .status
                .code()
                .map_or_else(|| "signal".to_string(), |c| c.to_string());
            return Err(ContractError::transfer(
                backend,
                destination,
                format!("exit status {code}: {}", stderr_tail(&output.stderr)),
            ));
        }

        debug!(destination = %destination, "Remote copy complete");
        Ok(())
    }
}

/// Single-quote for a POSIX shell
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let start = text
        .char_indices()
        .map(|(i, _)| i)
        .find(|&i| text.len() - i <= STDERR_TAIL)
        .unwrap_or(text.len());
    text[start..].to_string()
}
