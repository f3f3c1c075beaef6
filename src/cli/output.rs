use chrono::{DateTime, Utc};
use console::style;
use serde::Serialize;

use crate::app::AppContext;
use crate::config::RobotConfig;
use crate::corpus::{Answer, Document};
use crate::error::{HubError, Result};
use crate::search::preprocess::strip_markup;

/// Shown in place of the body of a question closed without an answer.
pub const CLOSED_MESSAGE: &str =
    "This question was closed as low-quality on Stack Overflow and does not have a formal answer.";

#[derive(Serialize)]
pub struct RobotResponse<T> {
    pub status: RobotStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub data: T,
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RobotStatus {
    Ok,
    Error { code: String, message: String },
}

pub fn robot_ok<T: Serialize>(data: T, config: &RobotConfig) -> RobotResponse<T> {
    let (timestamp, version) = metadata(config);
    RobotResponse {
        status: RobotStatus::Ok,
        timestamp,
        version,
        data,
    }
}

pub fn robot_error(err: &HubError, config: &RobotConfig) -> RobotResponse<serde_json::Value> {
    let (timestamp, version) = metadata(config);
    RobotResponse {
        status: RobotStatus::Error {
            code: err.code().to_string(),
            message: err.to_string(),
        },
        timestamp,
        version,
        data: serde_json::Value::Null,
    }
}

fn metadata(config: &RobotConfig) -> (Option<DateTime<Utc>>, Option<String>) {
    if config.include_metadata {
        (Some(Utc::now()), Some(env!("CARGO_PKG_VERSION").to_string()))
    } else {
        (None, None)
    }
}

pub fn emit_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let payload = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{payload}");
    Ok(())
}

/// Print `data` as a robot envelope, or the human layout built by `human`.
pub fn emit<T: Serialize>(
    ctx: &AppContext,
    data: &T,
    human: impl FnOnce() -> HumanLayout,
) -> Result<()> {
    if ctx.robot_mode {
        emit_json(&robot_ok(data, &ctx.config.robot), ctx.config.robot.pretty)
    } else {
        emit_human(human());
        Ok(())
    }
}

pub struct HumanLayout {
    lines: Vec<String>,
    key_width: usize,
}

impl Default for HumanLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl HumanLayout {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lines: Vec::new(),
            key_width: 12,
        }
    }

    pub fn title(&mut self, text: &str) -> &mut Self {
        self.lines.push(style(text).bold().to_string());
        self.lines.push(String::new());
        self
    }

    pub fn section(&mut self, text: &str) -> &mut Self {
        self.lines.push(style(text).bold().to_string());
        self.lines.push("-".repeat(text.chars().count().max(3)));
        self
    }

    pub fn kv(&mut self, key: &str, value: &str) -> &mut Self {
        let key_style = style(format!("{key:width$}", width = self.key_width)).dim();
        self.lines.push(format!("{key_style} {value}"));
        self
    }

    pub fn bullet(&mut self, text: &str) -> &mut Self {
        self.lines.push(format!("- {text}"));
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.lines.push(String::new());
        self
    }

    pub fn push_line(&mut self, line: impl Into<String>) -> &mut Self {
        self.lines.push(line.into());
        self
    }

    /// Numbered question line with its tags and link.
    pub fn question(&mut self, rank: usize, doc: &Document, detail: &str) -> &mut Self {
        self.lines.push(format!(
            "{:>2}. {} {}",
            rank,
            style(&doc.title).bold(),
            style(format!("[{}]", doc.id)).dim()
        ));
        let mut meta = format!("    tags: {}", doc.tags);
        if !detail.is_empty() {
            meta.push_str("  ");
            meta.push_str(detail);
        }
        self.lines.push(meta);
        self.lines
            .push(format!("    {}", style(question_url(doc.id)).underlined()));
        self
    }

    /// Indented plain-text rendering of an HTML answer body.
    pub fn answer(&mut self, body: &str) -> &mut Self {
        for line in strip_markup(body).lines().map(str::trim_end).filter(|l| !l.is_empty()) {
            self.lines.push(format!("    | {line}"));
        }
        self
    }

    #[must_use]
    pub fn build(self) -> String {
        self.lines.join("\n")
    }
}

pub fn emit_human(layout: HumanLayout) {
    println!("{}", layout.build());
}

#[must_use]
pub fn question_url(id: i64) -> String {
    format!("https://stackoverflow.com/questions/{id}")
}

/// Displayable text of the answer stored with a question.
#[must_use]
pub fn stored_answer_text(answer: &Answer) -> &str {
    match answer {
        Answer::Body(body) => body,
        Answer::Closed => CLOSED_MESSAGE,
    }
}
