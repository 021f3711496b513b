//! HTML rendering for quote pages.
//!
//! `text` and `comment` go through `sanitize_for_display` (which keeps `<br>`) and are spliced in
//! pre-escaped; every other value is escaped by maud.

use crate::db::{Quote, timestamp};
use crate::sanitize::sanitize_for_display;
use chrono::{DateTime, Utc};
use maud::{DOCTYPE, Markup, PreEscaped, html};

/// A quote ready for embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteView {
    pub id: i64,
    pub text: String,
    pub comment: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub source_address: String,
    pub score: i64,
    pub vote_count: i64,
}

impl From<&Quote> for QuoteView {
    fn from(q: &Quote) -> Self {
        Self {
            id: q.id,
            text: sanitize_for_display(&q.text),
            comment: q
                .comment
                .as_deref()
                .filter(|c| !c.is_empty())
                .map(sanitize_for_display),
            submitted_at: q.submitted_at,
            source_address: q.source_address.clone(),
            score: q.score,
            vote_count: q.vote_count,
        }
    }
}

/// Previous/next navigation for listing pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pager {
    pub endpoint: &'static str,
    pub page: i64,
    pub has_next: bool,
}

impl Pager {
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}

fn format_date(ts: &DateTime<Utc>) -> String {
    if timestamp::is_zero(ts) {
        return "-".to_string();
    }
    ts.format("%Y-%m-%d %H:%M").to_string()
}

fn card(q: &QuoteView) -> Markup {
    html! {
        article.quote id=(format!("quote-{}", q.id)) {
            blockquote { (PreEscaped(&q.text)) }
            @if let Some(comment) = &q.comment {
                p.comment { (PreEscaped(comment)) }
            }
            footer {
                a href=(format!("/quote/{}", q.id)) { "#" (q.id) }
                time datetime=(q.submitted_at.to_rfc3339()) { (format_date(&q.submitted_at)) }
                span.score title=(format!("{} votes", q.vote_count)) { (q.score) }
                a.vote.up href=(format!("/vote?id={}&type=up", q.id)) { "+" }
                a.vote.down href=(format!("/vote?id={}&type=down", q.id)) { "-" }
            }
        }
    }
}

/// Card fragment returned after a vote.
pub fn render_card(q: &QuoteView) -> String {
    card(q).into_string()
}

fn pager_nav(pager: &Pager) -> Markup {
    html! {
        nav.pager {
            @if pager.has_prev() {
                a rel="prev" href=(format!("{}?page={}", pager.endpoint, pager.page - 1)) { "« newer" }
            }
            @if pager.has_next {
                a rel="next" href=(format!("{}?page={}", pager.endpoint, pager.page + 1)) { "older »" }
            }
        }
    }
}

fn submit_form() -> Markup {
    html! {
        form.submit method="post" action="/add" {
            textarea name="quote" rows="4" required placeholder="Quote" {}
            textarea name="comment" rows="2" placeholder="Comment (optional)" {}
            button type="submit" { "Add quote" }
        }
    }
}

/// Full document around a list of cards, with a pager when `pager` is set.
pub fn render_page(title: &str, quotes: &[QuoteView], pager: Option<&Pager>) -> String {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { (title) }
                link rel="stylesheet" href="/static/style.css";
            }
            body {
                header {
                    nav {
                        a href="/" { "Latest" } " "
                        a href="/top" { "Top" } " "
                        a href="/random" { "Random" }
                    }
                }
                main {
                    (submit_form())
                    @if quotes.is_empty() {
                        p.empty { "No quotes here yet." }
                    }
                    @for q in quotes {
                        (card(q))
                    }
                    @if let Some(pager) = pager {
                        (pager_nav(pager))
                    }
                }
            }
        }
    }
    .into_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn quote(text: &str, comment: Option<&str>) -> Quote {
        Quote {
            id: 7,
            text: text.to_string(),
            comment: comment.map(str::to_string),
            submitted_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
            source_address: "10.0.0.1:5555".to_string(),
            score: 3,
            vote_count: 5,
        }
    }

    #[test]
    fn view_sanitizes_text_fields_only() {
        let view = QuoteView::from(&quote("a<br />b", Some("<i>x</i>")));
        assert_eq!(view.text, "a<br>b");
        assert_eq!(view.comment.as_deref(), Some("&lt;i&gt;x&lt;/i&gt;"));
        assert_eq!(view.source_address, "10.0.0.1:5555");
        assert_eq!((view.score, view.vote_count), (3, 5));
    }

    #[test]
    fn empty_comment_is_omitted() {
        let view = QuoteView::from(&quote("t", Some("")));
        assert!(view.comment.is_none());
        assert!(!render_card(&view).contains("class=\"comment\""));
    }

    #[test]
    fn card_shows_score_and_vote_links() {
        let html = render_card(&QuoteView::from(&quote("hello", None)));
        assert!(html.contains("id=\"quote-7\""));
        assert!(html.contains("<blockquote>hello</blockquote>"));
        assert!(html.contains("title=\"5 votes\">3</span>"));
        assert!(html.contains("/vote?id=7&amp;type=up"));
        assert!(html.contains("2024-05-01 12:30"));
    }

    #[test]
    fn pager_links_follow_page_state() {
        let first = Pager {
            endpoint: "/top",
            page: 1,
            has_next: true,
        };
        let nav = pager_nav(&first).into_string();
        assert!(!nav.contains("rel=\"prev\""));
        assert!(nav.contains("href=\"/top?page=2\""));

        let last = Pager {
            endpoint: "/",
            page: 3,
            has_next: false,
        };
        let nav = pager_nav(&last).into_string();
        assert!(nav.contains("href=\"/?page=2\""));
        assert!(!nav.contains("rel=\"next\""));
    }

    #[test]
    fn page_escapes_plain_fields_and_keeps_sanitized_text() {
        let view = QuoteView::from(&quote("<script>x</script><br />y", None));
        let page = render_page("Quote <#7>", &[view], None);
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<title>Quote &lt;#7&gt;</title>"));
        assert!(page.contains("<blockquote>&lt;script&gt;x&lt;/script&gt;<br>y</blockquote>"));
        assert!(!page.contains("<script>"));
        assert!(!page.contains("class=\"pager\""));
    }

    #[test]
    fn empty_listing_says_so() {
        let page = render_page("Latest quotes", &[], None);
        assert!(page.contains("No quotes here yet."));
    }
}
