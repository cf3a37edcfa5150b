use std::io;
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::process::Command;

use crate::error::{LaunchError, ParseStage, StreamKind, FAILURE_EXIT_CODE};
use crate::relay::{ReaderRelay, WriterRelay};
use crate::split::ParsedCommandLine;
use crate::support::command_line::CommandLineSource;

/// The streams of whoever invoked us. `stdin` is `None` when nothing is attached, in
/// which case the child gets a null stdin instead of a relay.
pub struct CallerStreams<I, O, E> {
    pub stdin: Option<I>,
    pub stdout: O,
    pub stderr: E,
}

impl CallerStreams<tokio::io::Stdin, tokio::io::Stdout, tokio::io::Stderr> {
    pub fn current() -> Self {
        Self {
            stdin: stdin_connected().then(tokio::io::stdin),
            stdout: tokio::io::stdout(),
            stderr: tokio::io::stderr(),
        }
    }
}

#[cfg(unix)]
fn stdin_connected() -> bool {
    use std::os::fd::AsFd;

    std::io::stdin().as_fd().try_clone_to_owned().is_ok()
}

#[cfg(windows)]
fn stdin_connected() -> bool {
    use std::os::windows::io::AsRawHandle;

    !std::io::stdin().as_raw_handle().is_null()
}

#[cfg(not(any(unix, windows)))]
fn stdin_connected() -> bool {
    true
}

/// Runs the command line held by `source` to completion and returns the exit code this
/// process should finish with.
///
/// Child stdout is forwarded live to the caller's stdout. Once every stream has hit EOF,
/// the caller's stderr receives a replay of that stdout followed by whatever the child
/// wrote to its own stderr.
pub async fn launch<S, I, O, E>(
    source: &S,
    streams: CallerStreams<I, O, E>,
) -> Result<i32, LaunchError>
where
    S: CommandLineSource + ?Sized,
    I: AsyncRead + Unpin,
    O: AsyncWrite + Unpin,
    E: AsyncWrite + Unpin,
{
    let line = source.fetch()?;
    tracing::debug!("command line: {line}");
    let target = resolve_target(&line, source.unwrap_layers())?;

    let CallerStreams {
        stdin,
        mut stdout,
        mut stderr,
    } = streams;

    let mut command = build_command(&target)?;
    command
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command.spawn().map_err(|source| LaunchError::Spawn {
        program: target.executable.clone(),
        source,
    })?;
    tracing::debug!(
        "started {} (pid {})",
        target.executable,
        child.id().unwrap_or_default()
    );

    let child_stdin = child.stdin.take();
    let child_stdout = child
        .stdout
        .take()
        .ok_or_else(|| not_captured(StreamKind::Stdout))?;
    let child_stderr = child
        .stderr
        .take()
        .ok_or_else(|| not_captured(StreamKind::Stderr))?;

    let stdin_relay = async {
        match (stdin, child_stdin) {
            (Some(input), Some(pipe)) => WriterRelay::new(input, pipe)
                .run()
                .await
                .map_err(LaunchError::relay(StreamKind::Stdin)),
            _ => Ok(0),
        }
    };
    let stdout_relay = async {
        ReaderRelay::new(child_stdout, &mut stdout)
            .with_tee()
            .run()
            .await
            .map_err(LaunchError::relay(StreamKind::Stdout))
    };
    let stderr_relay = async {
        ReaderRelay::buffered(child_stderr)
            .run()
            .await
            .map_err(LaunchError::relay(StreamKind::Stderr))
    };

    let (stdin_bytes, stdout_output, stderr_output) =
        tokio::try_join!(stdin_relay, stdout_relay, stderr_relay)?;
    tracing::debug!(
        "relayed stdin={stdin_bytes} stdout={} stderr={} bytes",
        stdout_output.bytes,
        stderr_output.bytes
    );

    let mirrored = stdout_output.tee.unwrap_or_default();
    write_out(&mut stderr, &mirrored).await?;
    write_out(&mut stderr, &stderr_output.sink).await?;

    let status = child.wait().await.map_err(LaunchError::Wait)?;
    Ok(exit_code(status))
}

/// Splits `line` once for every launcher layer wrapping it, then once more for the real
/// target. Only the first split sees the line exactly as it arrived.
pub fn resolve_target(
    line: &str,
    unwrap_layers: usize,
) -> Result<ParsedCommandLine, LaunchError> {
    let mut parsed = split_stage(line, ParseStage::Outer)?;
    for _ in 0..unwrap_layers {
        parsed = split_stage(&parsed.arguments, ParseStage::Unwrapped)?;
    }
    Ok(parsed)
}

fn split_stage(line: &str, stage: ParseStage) -> Result<ParsedCommandLine, LaunchError> {
    let parsed = ParsedCommandLine::parse(line).ok_or_else(|| LaunchError::Unparseable {
        stage,
        line: line.to_string(),
    })?;
    tracing::debug!(
        "FileName[{}] Arguments[{}]",
        parsed.executable,
        parsed.arguments
    );
    Ok(parsed)
}

/// The argument remainder reaches the OS as one string on Windows, quoting and all.
#[cfg(windows)]
fn build_command(target: &ParsedCommandLine) -> Result<Command, LaunchError> {
    let mut command = Command::new(&target.executable);
    if !target.arguments.is_empty() {
        command.raw_arg(&target.arguments);
    }
    Ok(command)
}

/// Without a raw argument string in `exec`, the remainder is tokenized with the same
/// shell quoting rules that produced it.
#[cfg(not(windows))]
fn build_command(target: &ParsedCommandLine) -> Result<Command, LaunchError> {
    let args = shell_words::split(&target.arguments).map_err(|err| {
        LaunchError::InvalidArguments {
            remainder: target.arguments.clone(),
            reason: err.to_string(),
        }
    })?;
    let mut command = Command::new(&target.executable);
    command.args(args);
    Ok(command)
}

fn not_captured(stream: StreamKind) -> LaunchError {
    LaunchError::Relay {
        stream,
        source: io::Error::other(format!("child {} was not captured", stream.as_str())),
    }
}

async fn write_out<W>(sink: &mut W, bytes: &[u8]) -> Result<(), LaunchError>
where
    W: AsyncWrite + Unpin,
{
    sink.write_all(bytes)
        .await
        .map_err(LaunchError::relay(StreamKind::Stderr))?;
    sink.flush()
        .await
        .map_err(LaunchError::relay(StreamKind::Stderr))
}

/// Signal deaths follow the shell convention of `128 + signal`.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;

        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    FAILURE_EXIT_CODE
}
