//! Proposer backed by an external program
//!
//! The request is written to the program's stdin as one JSON document and the
//! response is read from its stdout.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, span, Instrument, Level};

use super::{parse_response, ProposerRequest, ProposerResponse, StructureProposer};
use crate::core::DfdError;

#[derive(Debug, Clone)]
pub struct CommandProposer {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandProposer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: None,
        }
    }

    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    async fn run(&self, payload: Vec<u8>) -> Result<std::process::Output, DfdError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| {
                DfdError::proposer_failure(format!("failed to start `{}`: {err}", self.program))
            })?;

        // stdin is written while stdout and stderr drain
        let stdin = child.stdin.take();
        let feed = async move {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            match stdin.write_all(&payload).await {
                // the program answered without reading its whole input
                Err(err) if err.kind() == ErrorKind::BrokenPipe => {
                    debug!("Proposer closed stdin early");
                    Ok(())
                }
                other => other,
            }
        };

        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output.map_err(|err| {
            DfdError::proposer_failure(format!("failed to run `{}`: {err}", self.program))
        })?;
        fed.map_err(|err| {
            DfdError::proposer_failure(format!("failed to write request to `{}`: {err}", self.program))
        })?;
        Ok(output)
    }
}

#[async_trait]
impl StructureProposer for CommandProposer {
    async fn propose(&self, request: ProposerRequest) -> Result<ProposerResponse, DfdError> {
        let propose_span = span!(Level::INFO, "propose", program = %self.program, kind = request.kind());
        self.exchange(request).instrument(propose_span).await
    }

    fn name(&self) -> &str {
        &self.program
    }
}

impl CommandProposer {
    async fn exchange(&self, request: ProposerRequest) -> Result<ProposerResponse, DfdError> {
        let payload = serde_json::to_vec(&request.to_wire())?;
        debug!(bytes = payload.len(), "Sending proposer request");

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.run(payload))
                .await
                .map_err(|_| {
                    DfdError::proposer_failure(format!(
                        "`{}` did not answer within {:?}",
                        self.program, limit
                    ))
                })??,
            None => self.run(payload).await?,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DfdError::proposer_failure(format!(
                "`{}` exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let response = parse_response(&String::from_utf8_lossy(&output.stdout))?;
        info!(action = ?response.action, "Proposer answered");
        Ok(response)
    }
}
