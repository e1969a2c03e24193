use crate::error::ConvertError;

// Deeper bracket nesting than this is rejected before parsing.
pub const MAX_NESTING: usize = 128;

/// A named configuration file, kept around for rendering diagnostics.
#[derive(Debug, Clone)]
pub struct Source {
    file: String,
    contents: String,
}

impl Source {
    pub fn new(file: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            contents: contents.into(),
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    pub fn error(&self, msg: impl std::fmt::Display) -> ConvertError {
        ConvertError::Parse {
            message: format!("{}: {msg}", self.file),
        }
    }

    /// Reject sources whose brackets, braces, parentheses and template
    /// interpolations nest deeper than [`MAX_NESTING`].
    pub fn check_nesting(&self) -> Result<(), ConvertError> {
        // One entry per open frame; `true` marks an interpolation that
        // returns to string mode when closed.
        let mut frames: Vec<bool> = Vec::new();
        let mut in_string = false;
        let mut line = 1usize;
        let mut chars = self.contents.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '\n' {
                line += 1;
            }
            if in_string {
                match c {
                    '\\' => {
                        chars.next();
                    }
                    '"' => in_string = false,
                    '$' | '%' if chars.peek() == Some(&c) => {
                        chars.next();
                    }
                    '$' | '%' if chars.peek() == Some(&'{') => {
                        chars.next();
                        frames.push(true);
                        in_string = false;
                    }
                    _ => {}
                }
            } else {
                match c {
                    '"' => in_string = true,
                    '#' => skip_line(&mut chars, &mut line),
                    '/' if chars.peek() == Some(&'/') => skip_line(&mut chars, &mut line),
                    '/' if chars.peek() == Some(&'*') => {
                        chars.next();
                        let mut previous = '\0';
                        for next in chars.by_ref() {
                            if next == '\n' {
                                line += 1;
                            }
                            if previous == '*' && next == '/' {
                                break;
                            }
                            previous = next;
                        }
                    }
                    '<' if chars.peek() == Some(&'<') => {
                        chars.next();
                        skip_heredoc(&mut chars, &mut line);
                    }
                    '(' | '[' | '{' => frames.push(false),
                    ')' | ']' | '}' => in_string = frames.pop() == Some(true),
                    _ => {}
                }
            }
            if frames.len() > MAX_NESTING {
                return Err(ConvertError::Parse {
                    message: format!(
                        "{}:{line}: expressions are nested more than {MAX_NESTING} levels deep",
                        self.file
                    ),
                });
            }
        }
        Ok(())
    }
}

type Chars<'a> = std::iter::Peekable<std::str::Chars<'a>>;

fn skip_line(chars: &mut Chars<'_>, line: &mut usize) {
    for c in chars.by_ref() {
        if c == '\n' {
            *line += 1;
            return;
        }
    }
}

/// Skip a heredoc body after its `<<`. Anything that is not a heredoc
/// opener (`<<EOT` or `<<-EOT` followed by a newline) is left alone.
fn skip_heredoc(chars: &mut Chars<'_>, line: &mut usize) {
    if chars.peek() == Some(&'-') {
        chars.next();
    }
    let mut delimiter = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_alphanumeric() || c == '_' || c == '-' {
            delimiter.push(c);
            chars.next();
        } else {
            break;
        }
    }
    if delimiter.is_empty() || chars.peek() != Some(&'\n') {
        return;
    }
    chars.next();
    *line += 1;

    let mut current = String::new();
    for c in chars.by_ref() {
        if c == '\n' {
            *line += 1;
            if current.trim() == delimiter {
                return;
            }
            current.clear();
        } else {
            current.push(c);
        }
    }
}
