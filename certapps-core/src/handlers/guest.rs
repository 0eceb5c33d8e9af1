//! Guestbook page and signing.

use super::{App, HandlerResponse, Request};
use crate::error::AppResult;
use crate::model::Greeting;
use serde::Serialize;
use std::fmt::Write;

/// Values rendered into the guestbook page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateContext {
    pub greetings: Vec<Greeting>,
    pub log_in_out_link: String,
    pub log_in_out_text: String,
}

impl App {
    /// `GET /guest`: provision the signed-in member, then list greetings.
    pub(super) async fn guest(&self, request: &Request) -> AppResult<HandlerResponse> {
        let return_path = request.url();

        let (link, text) = match &request.identity {
            None => {
                let url = self.identity.login_url(&return_path)?;
                tracing::info!(url = %url, "not logged in");
                (url, "Log In")
            }
            Some(identity) => {
                let url = self.identity.logout_url(&return_path)?;
                tracing::info!(url = %url, "logged in");
                self.members.find_or_create(identity).await?;
                (url, "Log Out")
            }
        };

        let context = TemplateContext {
            greetings: self.guestbook.list().await?,
            log_in_out_link: link,
            log_in_out_text: text.to_string(),
        };
        Ok(HandlerResponse::Html(render_guestbook(&context)))
    }

    /// `POST /sign`: store the `content` form field as a greeting.
    pub(super) async fn sign(&self, request: &Request) -> AppResult<HandlerResponse> {
        let content = request.form.get("content").map(String::as_str).unwrap_or("");
        self.guestbook
            .append(content, request.identity.as_ref())
            .await?;
        Ok(HandlerResponse::Redirect("/".to_string()))
    }
}

/// Render the guestbook page.
pub fn render_guestbook(context: &TemplateContext) -> String {
    let mut html = String::from("<html>\n  <body>\n");
    let _ = writeln!(
        html,
        "    <a href=\"{}\">{}</a>",
        escape(&context.log_in_out_link),
        escape(&context.log_in_out_text)
    );
    for greeting in &context.greetings {
        if greeting.is_anonymous() {
            html.push_str("    <p>An anonymous person wrote:</p>\n");
        } else {
            let _ = writeln!(html, "    <p><b>{}</b> wrote:</p>", escape(&greeting.author));
        }
        let _ = writeln!(html, "    <pre>{}</pre>", escape(&greeting.content));
    }
    html.push_str(concat!(
        "    <form action=\"/sign\" method=\"post\">\n",
        "      <div><textarea name=\"content\" rows=\"3\" cols=\"60\"></textarea></div>\n",
        "      <div><input type=\"submit\" value=\"Sign Guestbook\"></div>\n",
        "    </form>\n",
        "  </body>\n</html>\n",
    ));
    html
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
