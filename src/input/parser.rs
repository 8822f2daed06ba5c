use std::borrow::Cow;
use std::fmt;

pub const MAX_LINE_LEN: usize = 2048;
pub const MAX_ARGS: usize = 512;

#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    LineTooLong(usize),
    TooManyArguments(usize),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::LineTooLong(len) => {
                write!(f, "line too long ({} > {} characters)", len, MAX_LINE_LEN)
            }
            ParseError::TooManyArguments(count) => {
                write!(f, "too many arguments ({} > {})", count, MAX_ARGS)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Replaces every `$$` with the shell's pid.
pub fn expand_pid(line: &str, pid: u32) -> Cow<'_, str> {
    if line.contains("$$") {
        Cow::Owned(line.replace("$$", &pid.to_string()))
    } else {
        Cow::Borrowed(line)
    }
}

/// Splits a line into words. Blank lines and `#` comments yield no words.
pub fn tokenize(line: &str) -> Result<Vec<String>, ParseError> {
    if line.len() > MAX_LINE_LEN {
        return Err(ParseError::LineTooLong(line.len()));
    }
    if line.starts_with('#') {
        return Ok(Vec::new());
    }

    let tokens: Vec<String> = line.split_whitespace().map(String::from).collect();
    if tokens.len() > MAX_ARGS {
        return Err(ParseError::TooManyArguments(tokens.len()));
    }
    Ok(tokens)
}

/// One external command with its redirections and background marker
/// already separated from the arguments.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandLine {
    pub argv: Vec<String>,
    pub input: Option<String>,
    pub output: Option<String>,
    pub background: bool,
}

impl CommandLine {
    /// Grammar: `command [arg]* [< infile] [> outfile] [&]`.
    ///
    /// `&` counts only as the last word. The argument list ends at the
    /// first redirection operator.
    pub fn from_tokens(tokens: &[String]) -> Option<Self> {
        let mut words = tokens;
        let mut background = false;
        if let Some((last, rest)) = words.split_last() {
            if last == "&" {
                background = true;
                words = rest;
            }
        }

        let mut command = CommandLine {
            background,
            ..Default::default()
        };
        let mut in_operators = false;
        let mut i = 0;

        while i < words.len() {
            let word = words[i].as_str();
            let target = words.get(i + 1);

            match (word, target) {
                ("<", Some(file)) => {
                    command.input = Some(file.clone());
                    in_operators = true;
                    i += 2;
                }
                (">", Some(file)) => {
                    command.output = Some(file.clone());
                    in_operators = true;
                    i += 2;
                }
                _ if in_operators => {
                    log::debug!("ignoring word after redirection: {}", word);
                    i += 1;
                }
                _ => {
                    command.argv.push(word.to_string());
                    i += 1;
                }
            }
        }

        if command.argv.is_empty() {
            None
        } else {
            Some(command)
        }
    }

    pub fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or_default()
    }
}
