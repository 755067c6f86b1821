//! HTML projection of reviews as sticky notes.
//!
//! All user text goes through askama's HTML escaper, so a title such as
//! `<script>` comes out as literal text. Input slices are expected newest
//! first and are emitted in that order.

use crate::storage::review::{Review, StickyColor, UserId, parse_hex_rgb};
use askama::Template;

/// Display-ready view of one review.
#[derive(Debug, Clone)]
pub struct ReviewCard {
    pub id: String,
    pub title: String,
    pub content: String,
    pub date_time: String,
    pub color: String,
    pub likes: u32,
    pub liked: bool,
    pub interactive: bool,
    pub rotation: String,
}

impl ReviewCard {
    pub fn new(review: &Review, interactive: bool, already_liked: bool) -> Self {
        ReviewCard {
            id: review.id.clone(),
            title: review.title.clone(),
            content: review.content.clone(),
            date_time: review.date_time.clone(),
            color: safe_color(&review.color),
            likes: review.likes,
            // Everything on the read-only liked page is liked by construction
            liked: already_liked || !interactive,
            interactive,
            rotation: format!("{:.2}", random_rotation()),
        }
    }
}

#[derive(Template)]
#[template(path = "review_item.html")]
pub struct ReviewItemTemplate<'a> {
    pub card: &'a ReviewCard,
}

#[derive(Template)]
#[template(path = "page.html")]
pub struct PageTemplate<'a> {
    pub heading: &'a str,
    pub container_id: &'a str,
    pub items: &'a [String],
    pub show_empty_notice: bool,
}

/// Render a single sticky note.
pub fn render_review(review: &Review, interactive: bool, already_liked: bool) -> askama::Result<String> {
    let card = ReviewCard::new(review, interactive, already_liked);
    ReviewItemTemplate { card: &card }.render()
}

/// Full page of every review, with live like buttons for `user`.
pub fn render_board_page(reviews: &[Review], user: &UserId) -> askama::Result<String> {
    let items = reviews
        .iter()
        .map(|review| render_review(review, true, review.is_liked_by(user)))
        .collect::<askama::Result<Vec<_>>>()?;

    PageTemplate {
        heading: "Reviews",
        container_id: "reviews-container",
        items: &items,
        show_empty_notice: false,
    }
    .render()
}

/// Read-only page of the reviews a user liked, or the empty-state notice.
pub fn render_liked_page(liked: &[Review]) -> askama::Result<String> {
    let items = liked
        .iter()
        .map(|review| render_review(review, false, true))
        .collect::<askama::Result<Vec<_>>>()?;

    PageTemplate {
        heading: "Liked reviews",
        container_id: "liked-reviews-container",
        items: &items,
        show_empty_notice: true,
    }
    .render()
}

/// Only a plain `#RRGGBB` value may reach the `style` attribute; anything else
/// could smuggle extra CSS declarations in after a `;`.
fn safe_color(stored: &str) -> String {
    match parse_hex_rgb(stored) {
        Some(_) => stored.trim().to_string(),
        None => StickyColor::default().hex().to_string(),
    }
}

/// Cosmetic tilt in degrees, within [-3, 3).
pub fn random_rotation() -> f64 {
    rand::random_range(-3.0..3.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(id: &str, title: &str) -> Review {
        Review {
            id: id.to_string(),
            title: title.to_string(),
            content: "Loved it".to_string(),
            date_time: "2025/6/1 12:00".to_string(),
            color: "#A8DDA8".to_string(),
            likes: 0,
            liked_by: Vec::new(),
        }
    }

    #[test]
    fn script_in_title_is_escaped() {
        let html = render_review(&review("1", "<script>alert(1)</script>"), true, false).unwrap();
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn markup_in_content_and_color_is_escaped() {
        let mut r = review("1", "t");
        r.content = "<img src=x onerror=alert(1)>".to_string();
        r.color = "red\" onclick=\"x".to_string();

        let html = render_review(&r, true, false).unwrap();
        assert!(!html.contains("<img"));
        assert!(!html.contains("\" onclick"));
    }

    #[test]
    fn stored_color_cannot_add_css_declarations() {
        let mut r = review("1", "t");
        r.color = "red; background-image: url(https://evil.example/x)".to_string();

        let html = render_review(&r, true, false).unwrap();
        assert!(!html.contains("background-image"));
        assert!(!html.contains("evil.example"));
        assert!(html.contains("background-color: #A8DDA8;"));
    }

    #[test]
    fn palette_color_is_kept() {
        let mut r = review("1", "t");
        r.color = "#FFC6D9".to_string();

        let html = render_review(&r, true, false).unwrap();
        assert!(html.contains("background-color: #FFC6D9;"));
    }

    #[test]
    fn interactive_item_reflects_current_like_state() {
        let mut r = review("42", "t");
        r.likes = 3;

        let unliked = render_review(&r, true, false).unwrap();
        assert!(unliked.contains("class=\"like-button\""));
        assert!(unliked.contains("data-review-id=\"42\""));
        assert!(unliked.contains("<span class=\"like-count\">3</span>"));
        assert!(!unliked.contains("disabled"));

        let liked = render_review(&r, true, true).unwrap();
        assert!(liked.contains("class=\"like-button liked\""));
    }

    #[test]
    fn read_only_item_is_disabled_and_marked_liked() {
        let html = render_review(&review("1", "t"), false, false).unwrap();
        assert!(html.contains("class=\"like-button liked\""));
        assert!(html.contains("disabled"));
    }

    #[test]
    fn board_page_keeps_newest_first_order() {
        let reviews = vec![review("2", "Newer"), review("1", "Older")];
        let html = render_board_page(&reviews, &UserId::new("user_me")).unwrap();

        let newer = html.find("Newer").unwrap();
        let older = html.find("Older").unwrap();
        assert!(newer < older);
        assert!(!html.contains("id=\"no-liked-reviews\""));
    }

    #[test]
    fn board_page_marks_items_liked_by_viewer() {
        let mut liked = review("1", "t");
        liked.liked_by = vec!["user_me".to_string()];
        liked.likes = 1;

        let html = render_board_page(&[liked], &UserId::new("user_me")).unwrap();
        assert!(html.contains("like-button liked"));
    }

    #[test]
    fn empty_liked_page_shows_notice_and_no_items() {
        let html = render_liked_page(&[]).unwrap();
        assert!(html.contains("id=\"no-liked-reviews\""));
        assert!(!html.contains("review-item\""));
    }

    #[test]
    fn rotation_stays_in_range() {
        for _ in 0..100 {
            let r = random_rotation();
            assert!((-3.0..3.0).contains(&r));
        }
    }
}
