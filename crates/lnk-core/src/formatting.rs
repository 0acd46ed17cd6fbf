//! Reply formatting (Telegram HTML parse mode).

use chrono::{DateTime, Utc};

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Stay under Telegram's 4096-character message limit with some headroom.
pub const TELEGRAM_SAFE_LIMIT: usize = 4000;

/// Visible text of a link; the href keeps the full URL.
const LINK_TEXT_MAX_CHARS: usize = 120;

/// Summary card for a shortened link.
///
/// Telegram has no embeds, so the card is a short HTML block: title, the two
/// links, the source domain and a UTC timestamp footer. Long URLs are shown
/// truncated. If the full hrefs would push the card past
/// [`TELEGRAM_SAFE_LIMIT`], the links are dropped and only the truncated text
/// is shown.
pub fn format_link_reply(
    original_url: &str,
    short_url: &str,
    domain: &str,
    at: DateTime<Utc>,
) -> String {
    let domain = escape_html(&truncate_with_ellipsis(domain, LINK_TEXT_MAX_CHARS));
    let ts = at.format("%Y-%m-%d %H:%M:%S UTC").to_string();

    let card = link_card(&link(original_url), &link(short_url), &domain, &ts);
    if card.chars().count() <= TELEGRAM_SAFE_LIMIT {
        return card;
    }
    link_card(&link_text(original_url), &link_text(short_url), &domain, &ts)
}

fn link_card(original: &str, short: &str, domain: &str, ts: &str) -> String {
    format!(
        "🔗 <b>URL Shortened</b>\n\n\
         <b>Original URL</b>\n{original}\n\n\
         <b>Shortened URL</b>\n{short}\n\n\
         <b>Source</b>\n<code>{domain}</code>\n\n\
         <i>{ts}</i>"
    )
}

fn link(url: &str) -> String {
    format!("<a href=\"{}\">{}</a>", escape_html(url), link_text(url))
}

fn link_text(url: &str) -> String {
    escape_html(&truncate_with_ellipsis(url, LINK_TEXT_MAX_CHARS))
}

fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    format!("{}...", s.chars().take(max_chars).collect::<String>())
}

pub fn format_pong(latency_ms: i64) -> String {
    format!("🏓 <b>Pong!</b> Latency: <code>{}ms</code>", latency_ms.max(0))
}

pub fn format_help(prefix: &str) -> String {
    let p = escape_html(prefix);
    format!(
        "<b>Commands</b>\n\
         <code>{p}ping</code>: check that the bot is alive\n\
         <code>{p}help</code>: show this message\n\n\
         Links posted in the shortening channel are shortened automatically."
    )
}
