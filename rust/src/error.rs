use std::fmt;
use std::io;

/// Exit code when the command line handed to this process cannot be split.
pub const UNPARSEABLE_EXIT_CODE: i32 = 911911;
/// Exit code when the line left after stripping the launcher's own token cannot be split.
pub const UNPARSEABLE_UNWRAPPED_EXIT_CODE: i32 = 911912;
/// Exit code for every other failure.
pub const FAILURE_EXIT_CODE: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStage {
    /// The line exactly as it reached this process.
    Outer,
    /// The line left after discarding one or more launcher self-references.
    Unwrapped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdin,
    Stdout,
    Stderr,
}

impl StreamKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stdin => "stdin",
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

#[derive(Debug)]
pub enum LaunchError {
    #[cfg_attr(not(windows), allow(dead_code))]
    CommandLine(String),
    Unparseable {
        stage: ParseStage,
        line: String,
    },
    InvalidArguments {
        remainder: String,
        reason: String,
    },
    #[cfg_attr(windows, allow(dead_code))]
    Unrepresentable {
        argument: String,
        reason: &'static str,
    },
    Spawn {
        program: String,
        source: io::Error,
    },
    Relay {
        stream: StreamKind,
        source: io::Error,
    },
    Wait(io::Error),
}

impl LaunchError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Unparseable {
                stage: ParseStage::Outer,
                ..
            } => UNPARSEABLE_EXIT_CODE,
            Self::Unparseable {
                stage: ParseStage::Unwrapped,
                ..
            } => UNPARSEABLE_UNWRAPPED_EXIT_CODE,
            _ => FAILURE_EXIT_CODE,
        }
    }

    pub fn relay(stream: StreamKind) -> impl FnOnce(io::Error) -> Self {
        move |source| Self::Relay { stream, source }
    }
}

impl fmt::Display for LaunchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CommandLine(msg) => write!(f, "cannot read command line: {msg}"),
            Self::Unparseable {
                stage: ParseStage::Outer,
                line,
            } => write!(f, "unparseable command line: {line}"),
            Self::Unparseable {
                stage: ParseStage::Unwrapped,
                line,
            } => write!(f, "unparseable unwrapped command line: {line}"),
            Self::InvalidArguments { remainder, reason } => {
                write!(f, "cannot tokenize arguments [{remainder}]: {reason}")
            }
            Self::Unrepresentable { argument, reason } => {
                write!(f, "cannot pass {argument:?} through: {reason}")
            }
            Self::Spawn { program, source } => write!(f, "failed to start {program}: {source}"),
            Self::Relay { stream, source } => {
                write!(f, "{} relay failed: {source}", stream.as_str())
            }
            Self::Wait(source) => write!(f, "failed waiting for child: {source}"),
        }
    }
}

impl std::error::Error for LaunchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn { source, .. } | Self::Relay { source, .. } | Self::Wait(source) => {
                Some(source)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_failures_map_to_sentinels() {
        let outer = LaunchError::Unparseable {
            stage: ParseStage::Outer,
            line: String::new(),
        };
        let inner = LaunchError::Unparseable {
            stage: ParseStage::Unwrapped,
            line: " ".to_string(),
        };
        assert_eq!(outer.exit_code(), UNPARSEABLE_EXIT_CODE);
        assert_eq!(inner.exit_code(), UNPARSEABLE_UNWRAPPED_EXIT_CODE);
        assert_ne!(outer.exit_code(), inner.exit_code());
    }

    #[test]
    fn runtime_failures_exit_with_one() {
        let spawn = LaunchError::Spawn {
            program: "missing".to_string(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        let relay = LaunchError::relay(StreamKind::Stdout)(io::Error::from(
            io::ErrorKind::BrokenPipe,
        ));
        assert_eq!(spawn.exit_code(), FAILURE_EXIT_CODE);
        assert_eq!(relay.exit_code(), FAILURE_EXIT_CODE);
        assert!(relay.to_string().starts_with("stdout relay failed"));
    }

    #[test]
    fn unparseable_message_carries_line() {
        let err = LaunchError::Unparseable {
            stage: ParseStage::Outer,
            line: "\t".to_string(),
        };
        assert_eq!(err.to_string(), "unparseable command line: \t");
    }
}
