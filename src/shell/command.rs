//! Command description with redacted stdin.

use std::fmt;
use std::path::Path;

/// An external command to execute.
///
/// Data passed through [`with_stdin`](ShellCommand::with_stdin) is treated as
/// sensitive: it never appears in `Debug` or `Display` output, and therefore
/// never in logs or error messages.
///
/// # Example
///
/// ```rust
/// use twinaos_installer::ShellCommand;
/// use std::path::Path;
///
/// let cmd = ShellCommand::new("chpasswd")
///     .with_stdin("alice:secret\n")
///     .in_root(Path::new("/mnt/twinaos"));
///
/// assert_eq!(cmd.get_program(), "chroot");
/// assert_eq!(cmd.to_string(), "chroot /mnt/twinaos chpasswd <stdin redacted>");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ShellCommand {
    program: String,
    args: Vec<String>,
    stdin: Option<String>,
}

impl ShellCommand {
    /// Create a command for `program` with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Feed `input` to the process on stdin.
    pub fn with_stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Wrap this command so it runs with `root` as its filesystem root.
    pub fn in_root(self, root: &Path) -> Self {
        let mut args = Vec::with_capacity(self.args.len() + 2);
        args.push(root.to_string_lossy().into_owned());
        args.push(self.program);
        args.extend(self.args);
        Self {
            program: "chroot".to_string(),
            args,
            stdin: self.stdin,
        }
    }

    pub fn get_program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Input to write on stdin, if any.
    pub fn get_stdin(&self) -> Option<&str> {
        self.stdin.as_deref()
    }

    /// Program followed by its arguments.
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.argv().join(" "))?;
        if self.stdin.is_some() {
            f.write_str(" <stdin redacted>")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShellCommand")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("stdin", &self.stdin.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
