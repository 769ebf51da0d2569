//! Rendering feed batches into Telegram messages.
//!
//! Messages use Telegram's HTML parse mode.  Every piece of feed-provided
//! text is escaped, so a stray `<` or `&` in a title can never make the Bot
//! API reject a message (which would otherwise be retried every cycle).

use crate::poll::FeedBatch;
use crate::source::FeedItem;

/// Telegram's hard limit on the length of one text message, in UTF-16 code
/// units.
pub const MAX_MESSAGE_LENGTH: usize = 4096;

/// Summaries longer than this are cut and suffixed with `...`.
pub const SUMMARY_LIMIT: usize = 150;

const FEED_TITLE_LIMIT: usize = 256;
const ENTRY_TITLE_LIMIT: usize = 512;

/// One outgoing message and the identifiers of the entries it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub ids: Vec<String>,
}

pub fn startup_message() -> String {
    "🤖 <b>RSS Monitoring Bot started!</b>\nActive feed monitoring. Configuration loaded from file."
        .to_string()
}

/// Split a batch into as few messages as fit under `max_len` UTF-16 units.
///
/// Every message starts with the feed header.  Entries keep their feed
/// order and are never split across messages.
pub fn format_batch(batch: &FeedBatch, include_description: bool, max_len: usize) -> Vec<Message> {
    let header = format!(
        "📢 <b>New content from {}</b>\n\n",
        escape_html(&truncate_chars(&batch.title, FEED_TITLE_LIMIT))
    );
    let header_len = utf16_len(&header);
    let budget = max_len.saturating_sub(header_len);

    let mut messages = Vec::new();
    let mut body = String::new();
    let mut body_len = 0;
    let mut ids = Vec::new();

    for item in &batch.items {
        let entry = fit_entry(item, include_description, budget);
        let entry_len = utf16_len(&entry);

        if !ids.is_empty() && body_len + entry_len > budget {
            messages.push(Message {
                text: format!("{header}{body}"),
                ids: std::mem::take(&mut ids),
            });
            body.clear();
            body_len = 0;
        }

        body.push_str(&entry);
        body_len += entry_len;
        ids.push(item.id.clone());
    }

    if !ids.is_empty() {
        messages.push(Message {
            text: format!("{header}{body}"),
            ids,
        });
    }

    messages
}

/// Render `item` so it fits in `budget`, shrinking the title and summary.
///
/// The link is never shortened.  It is only left out when even an entry with
/// an empty title does not fit.
fn fit_entry(item: &FeedItem, include_description: bool, budget: usize) -> String {
    let link = item.link.as_deref().unwrap_or_default();
    let mut cap = ENTRY_TITLE_LIMIT;
    loop {
        let text = render_entry(item, include_description, cap, link);
        if utf16_len(&text) <= budget {
            return text;
        }
        if cap == 0 {
            return render_entry(item, include_description, 0, "");
        }
        cap /= 2;
    }
}

fn render_entry(item: &FeedItem, include_description: bool, cap: usize, link: &str) -> String {
    let mut text = format!("• <b>{}</b>\n", escape_html(&truncate_chars(&item.title, cap)));

    if include_description {
        if let Some(summary) = item.summary.as_deref().map(clean_summary) {
            if !summary.is_empty() {
                let summary = truncate_chars(&summary, SUMMARY_LIMIT.min(cap));
                text.push_str(&format!("  <i>{}</i>\n", escape_html(&summary)));
            }
        }
    }

    text.push_str(&format!("\n  {}\n\n", escape_html(link)));
    text
}

/// Strip markup from a feed summary and collapse its whitespace.
pub fn clean_summary(raw: &str) -> String {
    let mut plain = String::with_capacity(raw.len());
    let mut in_tag = false;
    for c in raw.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                plain.push(' ');
            }
            _ if !in_tag => plain.push(c),
            _ => {}
        }
    }

    decode_entities(&plain)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decode the common named entities and numeric references (`&#8217;`,
/// `&#x2026;`).  Anything unrecognised is kept as written.
fn decode_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        rest = &rest[start..];

        let decoded = rest
            .find(';')
            .filter(|&end| end <= 12)
            .and_then(|end| decode_entity(&rest[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let code = match name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => name.strip_prefix('#')?.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Cut `s` to at most `limit` characters, ending in `...` when shortened.
pub fn truncate_chars(s: &str, limit: usize) -> String {
    if char_len(s) <= limit {
        return s.to_string();
    }
    if limit <= 3 {
        return s.chars().take(limit).collect();
    }
    let mut out: String = s.chars().take(limit - 3).collect();
    out.push_str("...");
    out
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Length as Telegram measures it.
fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
