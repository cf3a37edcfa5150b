use std::ffi::OsString;

use crate::error::LaunchError;
use crate::split::ParsedCommandLine;

/// Where the unparsed invocation text comes from.
pub trait CommandLineSource {
    fn fetch(&self) -> Result<String, LaunchError>;

    /// How many leading launcher self-references wrap the real command line.
    fn unwrap_layers(&self) -> usize;
}

/// The invocation text of the current process, as faithfully as the platform allows.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsCommandLine;

#[cfg(windows)]
impl CommandLineSource for OsCommandLine {
    /// The untokenized line still starts with this process's own path.
    fn fetch(&self) -> Result<String, LaunchError> {
        use windows_sys::Win32::System::Environment::GetCommandLineW;

        // SAFETY: GetCommandLineW returns a pointer to a NUL-terminated UTF-16 string
        // owned by the process that stays valid for its whole lifetime.
        let wide = unsafe {
            let ptr = GetCommandLineW();
            if ptr.is_null() {
                return Err(LaunchError::CommandLine(
                    "GetCommandLineW returned null".to_string(),
                ));
            }
            let mut len = 0usize;
            while *ptr.add(len) != 0 {
                len += 1;
            }
            std::slice::from_raw_parts(ptr, len)
        };
        Ok(String::from_utf16_lossy(wide))
    }

    fn unwrap_layers(&self) -> usize {
        1
    }
}

#[cfg(not(windows))]
impl CommandLineSource for OsCommandLine {
    /// Only `argv` exists here, so the line is rebuilt from everything after `argv[0]`.
    fn fetch(&self) -> Result<String, LaunchError> {
        let args = utf8_args(std::env::args_os().skip(1))?;
        rebuild_command_line(&args)
    }

    fn unwrap_layers(&self) -> usize {
        0
    }
}

/// Arguments travel through text, so one that is not UTF-8 is refused instead of being
/// silently altered.
#[cfg_attr(windows, allow(dead_code))]
pub fn utf8_args<I>(args: I) -> Result<Vec<String>, LaunchError>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            arg.into_string().map_err(|raw| LaunchError::Unrepresentable {
                argument: raw.to_string_lossy().into_owned(),
                reason: "not valid UTF-8",
            })
        })
        .collect()
}

/// Joins an argument vector into text the splitter reads back as the same program and
/// the same arguments.
///
/// The program is double-quoted when it holds whitespace; the arguments use POSIX shell
/// quoting, which is what they are tokenized with again at spawn time. A program the
/// splitter would read back as something else (empty, or with quotes it would strip or
/// split on) is refused.
#[cfg_attr(windows, allow(dead_code))]
pub fn rebuild_command_line(args: &[String]) -> Result<String, LaunchError> {
    let Some((program, rest)) = args.split_first() else {
        return Ok(String::new());
    };
    let mut line = if program.chars().any(char::is_whitespace) {
        format!("\"{program}\"")
    } else {
        program.clone()
    };
    let round_trips = ParsedCommandLine::parse(&line)
        .is_some_and(|parsed| parsed.executable == *program && parsed.arguments.is_empty());
    if !round_trips {
        return Err(LaunchError::Unrepresentable {
            argument: program.clone(),
            reason: "program name cannot be written as a command-line token",
        });
    }
    if !rest.is_empty() {
        line.push(' ');
        line.push_str(&shell_words::join(rest));
    }
    Ok(line)
}

/// A fixed line, for driving the launcher without touching the real process state.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct FixedCommandLine {
    pub line: String,
    pub unwrap_layers: usize,
}

#[cfg(test)]
impl CommandLineSource for FixedCommandLine {
    fn fetch(&self) -> Result<String, LaunchError> {
        Ok(self.line.clone())
    }

    fn unwrap_layers(&self) -> usize {
        self.unwrap_layers
    }
}
