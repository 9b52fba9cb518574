//! Interactive command execution inside a running pod.
//!
//! [`ExecStreamer`] drives any [`ExecChannel`]: it writes one command per
//! line, waits a bounded time for the first output, then drains whatever
//! follows within a short grace window. [`KubeExecChannel`] is the channel
//! over the cluster's attached process.

use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, AttachParams, AttachedProcess};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use kubedeck_core::{ResourceKind, ResourceRef};

use crate::client::ClusterClient;
use crate::facade::ResourceFacade;
use crate::types::CommandOutput;
use crate::{FacadeError, Result};

/// How long to keep draining once output has started arriving.
pub const DRAIN_GRACE: Duration = Duration::from_millis(100);

/// Output stream of the remote process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

/// Result of waiting on a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// A chunk of output.
    Output(OutputStream, Vec<u8>),
    /// Nothing arrived within the wait.
    Idle,
    /// The remote process closed its streams.
    Closed,
}

/// A bidirectional byte channel to a remote shell.
#[async_trait]
pub trait ExecChannel: Send {
    /// Write raw bytes to the remote stdin.
    async fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Wait up to `wait` for the next output event.
    async fn next_event(&mut self, wait: Duration) -> Result<ChannelEvent>;

    /// Whether the remote side is still open.
    fn is_open(&self) -> bool;

    /// Close stdin and release the channel.
    async fn close(&mut self);
}

/// Runs a queue of commands over an [`ExecChannel`].
#[derive(Debug, Clone, Copy)]
pub struct ExecStreamer {
    poll: Duration,
    grace: Duration,
}

impl ExecStreamer {
    /// Create a streamer that waits `poll` for each command's first output.
    #[must_use]
    pub fn new(poll: Duration) -> Self {
        Self {
            poll,
            grace: DRAIN_GRACE,
        }
    }

    /// Override the drain grace window.
    #[must_use]
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Send each command in order, capturing its output.
    ///
    /// Stops early when the channel closes. The channel is closed afterwards,
    /// including when a write or read fails.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::Exec`] if writing or reading fails.
    pub async fn run<C>(&self, channel: &mut C, commands: Vec<String>) -> Result<Vec<CommandOutput>>
    where
        C: ExecChannel + ?Sized,
    {
        let result = self.send_all(channel, commands).await;
        channel.close().await;
        result
    }

    async fn send_all<C>(&self, channel: &mut C, commands: Vec<String>) -> Result<Vec<CommandOutput>>
    where
        C: ExecChannel + ?Sized,
    {
        let mut responses = Vec::with_capacity(commands.len());
        for command in commands {
            if !channel.is_open() {
                debug!(command = %command, "Channel closed, dropping remaining commands");
                break;
            }
            channel.write(format!("{command}\n").as_bytes()).await?;
            let output = self.collect(channel).await?;
            responses.push(CommandOutput { command, output });
        }
        Ok(responses)
    }

    async fn collect<C>(&self, channel: &mut C) -> Result<String>
    where
        C: ExecChannel + ?Sized,
    {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut wait = self.poll;
        loop {
            match channel.next_event(wait).await? {
                ChannelEvent::Output(OutputStream::Stdout, bytes) => stdout.extend(bytes),
                ChannelEvent::Output(OutputStream::Stderr, bytes) => stderr.extend(bytes),
                ChannelEvent::Idle | ChannelEvent::Closed => break,
            }
            wait = self.grace;
        }
        stdout.extend(stderr);
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

/// [`ExecChannel`] over a process attached through the cluster API.
pub struct KubeExecChannel {
    stdin: Option<Box<dyn AsyncWrite + Unpin + Send>>,
    output_rx: mpsc::Receiver<(OutputStream, Vec<u8>)>,
    readers: Vec<JoinHandle<()>>,
    attached: AttachedProcess,
    open: bool,
}

impl KubeExecChannel {
    /// Start `shell` in `name` with stdin, stdout and stderr attached and no tty.
    ///
    /// # Errors
    ///
    /// Returns an error if the attach request fails.
    pub async fn open(
        client: &ClusterClient,
        name: &str,
        namespace: &str,
        shell: &str,
    ) -> Result<Self> {
        let params = AttachParams::default()
            .stdin(true)
            .stdout(true)
            .stderr(true)
            .tty(false);
        let params = &params;
        let attached = client
            .call(|kube| async move {
                Api::<Pod>::namespaced(kube, namespace)
                    .exec(name, vec![shell], params)
                    .await
            })
            .await?;
        Ok(Self::new(attached))
    }

    /// Wrap an attached process, spawning one reader task per output stream.
    #[must_use]
    pub fn new(mut attached: AttachedProcess) -> Self {
        let (output_tx, output_rx) = mpsc::channel(64);
        let mut readers = Vec::new();

        if let Some(stdout) = attached.stdout() {
            readers.push(tokio::spawn(forward(stdout, OutputStream::Stdout, output_tx.clone())));
        }
        if let Some(stderr) = attached.stderr() {
            readers.push(tokio::spawn(forward(stderr, OutputStream::Stderr, output_tx.clone())));
        }
        drop(output_tx);

        let stdin = attached
            .stdin()
            .map(|w| Box::new(w) as Box<dyn AsyncWrite + Unpin + Send>);

        Self {
            stdin,
            output_rx,
            readers,
            attached,
            open: true,
        }
    }
}

async fn forward<R>(mut reader: R, stream: OutputStream, tx: mpsc::Sender<(OutputStream, Vec<u8>)>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; 4096];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                if tx.send((stream, buf[..n].to_vec())).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                debug!(stream = ?stream, error = %e, "Exec stream read failed");
                break;
            }
        }
    }
}

#[async_trait]
impl ExecChannel for KubeExecChannel {
    async fn write(&mut self, data: &[u8]) -> Result<()> {
        let writer = self
            .stdin
            .as_mut()
            .ok_or_else(|| FacadeError::Exec("stdin not available".to_string()))?;
        writer
            .write_all(data)
            .await
            .map_err(|e| FacadeError::Exec(e.to_string()))?;
        writer
            .flush()
            .await
            .map_err(|e| FacadeError::Exec(e.to_string()))
    }

    async fn next_event(&mut self, wait: Duration) -> Result<ChannelEvent> {
        match tokio::time::timeout(wait, self.output_rx.recv()).await {
            Ok(Some((stream, bytes))) => Ok(ChannelEvent::Output(stream, bytes)),
            Ok(None) => {
                self.open = false;
                Ok(ChannelEvent::Closed)
            }
            Err(_) => Ok(ChannelEvent::Idle),
        }
    }

    fn is_open(&self) -> bool {
        self.open
    }

    async fn close(&mut self) {
        drop(self.stdin.take());
        for reader in self.readers.drain(..) {
            reader.abort();
        }
        self.attached.abort();
        self.open = false;
    }
}

impl ResourceFacade {
    /// Run `commands` in an interactive shell inside pod `name`.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::NotFound`] ("instance not found") if the pod does
    /// not exist, or [`FacadeError::Exec`] if the channel fails.
    pub async fn exec_commands(
        &self,
        name: &str,
        namespace: &str,
        commands: Vec<String>,
    ) -> Result<Vec<CommandOutput>> {
        let target = ResourceRef::namespaced(ResourceKind::Pod, namespace, name);
        if !self.pod_exists(name, namespace).await? {
            return Err(FacadeError::NotFound(format!("instance not found: {target}")));
        }

        let config = self.config();
        let mut channel =
            KubeExecChannel::open(self.client(), name, namespace, &config.exec_shell).await?;
        let streamer = ExecStreamer::new(config.exec_poll_timeout());
        let responses = streamer.run(&mut channel, commands).await?;
        info!(target = %target, commands = responses.len(), "Exec session finished");
        Ok(responses)
    }
}
