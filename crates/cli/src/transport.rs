//! Line-command transport for `syspet run`.
//!
//! One request per input line, one JSON object per output line. Requests are
//! validated here; the keeper never sees an unknown action or an empty feed.

use std::str::FromStr;

use keeper::Keeper;
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Feed(String),
    Rest,
    Pet,
    Reset,
    Killed { pid: u32, name: Option<String> },
    Status,
    Health,
    Info,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("empty request")]
    Empty,
    #[error("unknown action `{0}`")]
    UnknownAction(String),
    #[error("no code to feed")]
    EmptyFeed,
    #[error("killed needs a pid")]
    MissingPid,
    #[error("invalid pid `{0}`")]
    BadPid(String),
}

impl FromStr for Request {
    type Err = RequestError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (action, rest) = match line.split_once(char::is_whitespace) {
            Some((action, rest)) => (action, rest.trim()),
            None => (line, ""),
        };

        match action {
            "" => Err(RequestError::Empty),
            "feed" => {
                let code = unescape(rest);
                if code.trim().is_empty() {
                    Err(RequestError::EmptyFeed)
                } else {
                    Ok(Request::Feed(code))
                }
            }
            "rest" => Ok(Request::Rest),
            "pet" => Ok(Request::Pet),
            "reset" => Ok(Request::Reset),
            "killed" => {
                let mut parts = rest.split_whitespace();
                let pid = parts.next().ok_or(RequestError::MissingPid)?;
                let pid = pid
                    .parse()
                    .map_err(|_| RequestError::BadPid(pid.to_string()))?;
                let name = parts.next().map(str::to_string);
                Ok(Request::Killed { pid, name })
            }
            "status" => Ok(Request::Status),
            "health" => Ok(Request::Health),
            "info" => Ok(Request::Info),
            "quit" | "exit" => Ok(Request::Quit),
            other => Err(RequestError::UnknownAction(other.to_string())),
        }
    }
}

/// Expands `\n`, `\t` and `\\` so multi-line snippets fit on one line.
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Runs one request against the keeper and renders the reply.
///
/// `Quit` is the caller's business and renders as an acknowledgement.
pub async fn dispatch(keeper: &Keeper, request: Request) -> serde_json::Result<Value> {
    match request {
        Request::Feed(code) => serde_json::to_value(keeper.feed(&code).await),
        Request::Rest => serde_json::to_value(keeper.rest().await),
        Request::Pet => serde_json::to_value(keeper.pet().await),
        Request::Reset => serde_json::to_value(keeper.reset().await),
        Request::Killed { pid, name } => {
            serde_json::to_value(keeper.process_killed(pid, name.as_deref()).await)
        }
        Request::Status => serde_json::to_value(keeper.snapshot().await),
        Request::Health => serde_json::to_value(keeper.health().await),
        Request::Info => serde_json::to_value(keeper.info().await),
        Request::Quit => Ok(json!({ "bye": true })),
    }
}

pub fn error_reply(err: &RequestError) -> Value {
    json!({ "error": err.to_string() })
}
