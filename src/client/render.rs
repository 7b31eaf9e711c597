//! HTML fragments for the message feed. Everything user supplied goes through
//! [`escape_html`] before it lands in markup.

use chrono::{DateTime, Utc};
use std::fmt::Write;

use crate::models::Message;

pub const EMPTY_PLACEHOLDER: &str = "No messages yet. Be the first to share something!";

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// `YYYY-MM-DD HH:MM`, in UTC.
pub fn format_create_time(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M").to_string()
}

pub fn render_card(message: &Message) -> String {
    let mut card = String::with_capacity(256 + message.content.len());
    // writing into a String cannot fail
    let _ = write!(
        card,
        concat!(
            r#"<div class="message-card" data-id="{id}">"#,
            r#"<div class="message-header">"#,
            r#"<span class="nickname">{nickname}</span>"#,
            r#"<span class="create-time">{time}</span>"#,
            r#"</div>"#,
            r#"<div class="message-content">{content}</div>"#,
            r#"<div class="like-container">"#,
            r#"<button class="like-btn" data-message-id="{id}">👍</button>"#,
            r#"<span class="like-count">{likes}</span>"#,
            r#"</div>"#,
            r#"</div>"#,
        ),
        id = message.id,
        nickname = escape_html(&message.nickname),
        time = format_create_time(&message.create_time),
        content = escape_html(&message.content),
        likes = message.like_count,
    );
    card
}

/// The inner HTML of the feed container. An empty feed renders a placeholder.
pub fn render_list(messages: &[Message]) -> String {
    if messages.is_empty() {
        return format!(r#"<div class="empty-tip">{}</div>"#, EMPTY_PLACEHOLDER);
    }
    messages.iter().map(render_card).collect()
}
