//! Plain-text rendering of transcript messages for the terminal.

use chrono::{DateTime, Local, Utc};

use urlgenie_core::types::{Message, Sender};

/// Display name for a sender.
pub fn sender_tag(sender: Sender) -> &'static str {
    match sender {
        Sender::User => "You",
        Sender::Bot => "UrlGenie",
    }
}

/// Timestamp as local wall-clock `HH:MM`.
pub fn format_time(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M").to_string()
}

/// Render one message: header line, text, then a numbered source list.
pub fn format_message(message: &Message) -> String {
    let mut out = format!(
        "[{}] {}:\n{}",
        format_time(message.timestamp),
        sender_tag(message.sender),
        message.text
    );

    if let Some(ref sources) = message.sources {
        out.push_str("\nSources:");
        for (i, source) in sources.iter().enumerate() {
            out.push_str(&format!("\n  {}. {} <{}>", i + 1, source.title, source.uri));
        }
    }

    out
}

pub const HELP_TEXT: &str = "\
Commands:
  /url <address>  set the website to talk about
  /clear          clear the current website
  /voice          start or stop voice input
  /help           show this help
  /quit           exit
Anything else is sent as a question. An empty line sends the voice draft.";
