use std::fmt;

use crate::error::ConnectError;

const LINE_WIDTH: usize = 65;

/// Categorical outcome carried by a [`Status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    ConnectOK,
    ConnectFailed,
    ConnectedOK,
    NoConnection,
    DownloadOK,
    SaveOK,
    SaveFailed,
    True,
    False,
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResultCode::ConnectOK => "Connect to QB: Success",
            ResultCode::ConnectFailed => "Connect to QB: Fail",
            ResultCode::ConnectedOK => "Connect Success",
            ResultCode::NoConnection => "No Connection",
            ResultCode::DownloadOK => "Download Success",
            ResultCode::SaveOK => "Save to QB: Success",
            ResultCode::SaveFailed => "Save to QB: Fail",
            ResultCode::True => "True",
            ResultCode::False => "False",
        })
    }
}

/// Human message, outcome code and progress percentage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    message: String,
    code: ResultCode,
    progress: u8,
}

impl Status {
    /// `progress` is clamped to 100.
    pub fn new(message: impl Into<String>, code: ResultCode, progress: u8) -> Self {
        Self {
            message: message.into(),
            code,
            progress: progress.min(100),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn code(&self) -> ResultCode {
        self.code
    }

    #[must_use]
    pub fn progress(&self) -> u8 {
        self.progress
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.code == ResultCode::ConnectOK
    }

    /// Word-wraps the message at 65 columns, breaking only on spaces.
    ///
    /// Messages that already fit are returned untouched. A single word longer
    /// than the limit is kept whole on its own line.
    #[must_use]
    pub fn format_message(&self) -> String {
        wrap(&self.message, LINE_WIDTH)
    }

    #[must_use]
    pub fn progress_message(&self) -> String {
        format!("{} - {}%", self.message, self.progress)
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::new(String::new(), ResultCode::ConnectedOK, 0)
    }
}

impl From<ConnectError> for Status {
    fn from(value: ConnectError) -> Self {
        Status::new(value.to_string(), ResultCode::NoConnection, 0)
    }
}

fn wrap(message: &str, width: usize) -> String {
    if message.chars().count() <= width {
        return message.to_string();
    }

    let mut lines: Vec<String> = Vec::new();
    for paragraph in message.split('\n') {
        let mut line = String::new();
        let mut line_len = 0;
        for word in paragraph.split(' ').filter(|w| !w.is_empty()) {
            let word_len = word.chars().count();
            if line_len > 0 && line_len + 1 + word_len > width {
                lines.push(std::mem::take(&mut line));
                line_len = 0;
            }
            if line_len > 0 {
                line.push(' ');
                line_len += 1;
            }
            line.push_str(word);
            line_len += word_len;
        }
        lines.push(line);
    }
    lines.join("\n")
}
