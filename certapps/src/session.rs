//! Line protocol.
//!
//! - `GET <path>[?query]` and `POST <path> [form-or-json]` are requests
//! - Lines starting with `#` are commands (user, logout, quit)
//! - Responses print as `[<status>] <body>`

use certapps_core::{App, HandlerResponse, Identity, Request};
use std::collections::HashMap;
use std::io::{self, BufRead};
use std::time::Duration;
use url::form_urlencoded;

/// Command line options.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionArgs {
    pub user: Option<String>,
    pub eventual_delay: Duration,
    pub log: String,
}

impl Default for SessionArgs {
    fn default() -> Self {
        Self {
            user: None,
            eventual_delay: Duration::ZERO,
            log: "info".to_string(),
        }
    }
}

pub fn parse_args(args: &[String]) -> Result<SessionArgs, String> {
    let mut parsed = SessionArgs::default();

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1);
        match (args[i].as_str(), value) {
            ("--user", Some(user)) => parsed.user = Some(user.clone()),
            ("--log", Some(filter)) => parsed.log = filter.clone(),
            ("--eventual-delay", Some(ms)) => {
                let ms: u64 = ms
                    .parse()
                    .map_err(|_| format!("--eventual-delay expects milliseconds, got {ms:?}"))?;
                parsed.eventual_delay = Duration::from_millis(ms);
            }
            (flag @ ("--user" | "--log" | "--eventual-delay"), None) => {
                return Err(format!("{flag} needs a value"));
            }
            (other, _) => return Err(format!("unknown argument: {other}")),
        }
        i += 2;
    }

    Ok(parsed)
}

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    Request(Request),
    SignIn(String),
    SignOut,
    Quit,
    Blank,
}

pub fn parse_line(line: &str) -> Result<Line, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Line::Blank);
    }

    if let Some(command) = line.strip_prefix('#') {
        let parts: Vec<&str> = command.split_whitespace().collect();
        return match parts.as_slice() {
            ["quit"] | ["exit"] => Ok(Line::Quit),
            ["logout"] => Ok(Line::SignOut),
            ["user", id] => Ok(Line::SignIn(id.to_string())),
            _ => Err(format!("unknown command: {line}")),
        };
    }

    let (method, rest) = line.split_once(' ').unwrap_or((line, ""));
    let (target, payload) = rest.trim().split_once(' ').unwrap_or((rest.trim(), ""));
    if target.is_empty() {
        return Err(format!("missing path: {line}"));
    }
    let (path, query) = target.split_once('?').unwrap_or((target, ""));

    let mut request = match method.to_ascii_uppercase().as_str() {
        "GET" => Request::get(path),
        "POST" => Request::post(path),
        other => return Err(format!("unsupported method: {other}")),
    };
    request.query = parse_pairs(query);

    let payload = payload.trim();
    if payload.starts_with('{') {
        request.body = payload.to_string();
    } else {
        request.form = parse_pairs(payload);
    }
    Ok(Line::Request(request))
}

fn parse_pairs(raw: &str) -> HashMap<String, String> {
    form_urlencoded::parse(raw.as_bytes()).into_owned().collect()
}

/// Identity used for a signed-in console user.
pub fn identity_for(id: &str) -> Identity {
    Identity::new(id, format!("{id}@example.com"))
}

pub fn format_response(response: &HandlerResponse) -> String {
    let status = response.status();
    match response {
        HandlerResponse::Html(body) => format!("[{status}]\n{body}"),
        HandlerResponse::Json(value) => format!("[{status}] {value}"),
        HandlerResponse::Redirect(to) => format!("[{status}] -> {to}"),
        HandlerResponse::Error { message, .. } => format!("[{status}] {message}"),
    }
}

/// Read requests from stdin until EOF or `#quit`.
pub async fn run(app: &App, mut identity: Option<Identity>) -> io::Result<()> {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        match parse_line(&line?) {
            Ok(Line::Blank) => {}
            Ok(Line::Quit) => break,
            Ok(Line::SignIn(id)) => {
                tracing::info!(user_id = %id, "signed in");
                identity = Some(identity_for(&id));
            }
            Ok(Line::SignOut) => identity = None,
            Ok(Line::Request(mut request)) => {
                request.identity = identity.clone();
                println!("{}", format_response(&app.handle(&request).await));
            }
            Err(e) => println!("[ERROR] {e}"),
        }
    }
    Ok(())
}
