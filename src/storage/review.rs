use chrono::{DateTime, Datelike, Local, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub title: String,
    pub content: String,
    pub date_time: String,
    pub color: String,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub liked_by: Vec<String>, // ephemeral user IDs, no duplicates
}

impl Review {
    /// Build a fresh, unliked review. Title and content are expected to be trimmed already.
    pub fn new(id: String, title: String, content: String, color: StickyColor, now: &DateTime<Local>) -> Self {
        Review {
            id,
            title,
            content,
            date_time: format_date_time(now),
            color: color.hex().to_string(),
            likes: 0,
            liked_by: Vec::new(),
        }
    }

    pub fn is_liked_by(&self, user: &UserId) -> bool {
        self.liked_by.iter().any(|id| id == user.as_str())
    }

    /// Flip `user` in the liker set and return whether the review is now liked.
    ///
    /// The counter is recomputed from the set afterwards, so `likes == liked_by.len()`
    /// holds after every toggle even if the stored count had drifted.
    pub fn toggle_like(&mut self, user: &UserId) -> bool {
        let liked = if self.is_liked_by(user) {
            self.liked_by.retain(|id| id != user.as_str());
            false
        } else {
            self.liked_by.push(user.as_str().to_string());
            true
        };
        self.likes = self.liked_by.len() as u32;
        liked
    }
}

/// Creation timestamp as the `ja-JP` locale shows it: `2025/3/7 09:05`.
pub fn format_date_time(now: &DateTime<Local>) -> String {
    format!(
        "{}/{}/{} {:02}:{:02}",
        now.year(),
        now.month(),
        now.day(),
        now.hour(),
        now.minute()
    )
}

/// Fixed sticky-note palette offered by the composer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StickyColor {
    #[default]
    LightGreen,
    Yellow,
    Pink,
    Blue,
    Orange,
    Purple,
}

impl StickyColor {
    pub const ALL: [StickyColor; 6] = [
        StickyColor::LightGreen,
        StickyColor::Yellow,
        StickyColor::Pink,
        StickyColor::Blue,
        StickyColor::Orange,
        StickyColor::Purple,
    ];

    pub fn hex(self) -> &'static str {
        match self {
            StickyColor::LightGreen => "#A8DDA8",
            StickyColor::Yellow => "#FFF3A8",
            StickyColor::Pink => "#FFC6D9",
            StickyColor::Blue => "#A8D8F0",
            StickyColor::Orange => "#FFD8A8",
            StickyColor::Purple => "#D9C6F0",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StickyColor::LightGreen => "light green",
            StickyColor::Yellow => "yellow",
            StickyColor::Pink => "pink",
            StickyColor::Blue => "blue",
            StickyColor::Orange => "orange",
            StickyColor::Purple => "purple",
        }
    }

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let i = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Parse a `#RRGGBB` string into its channels.
pub fn parse_hex_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.trim().strip_prefix('#')?;
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
    let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
    let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Liking-session token. A new one is minted for every session and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    const ALPHABET: &'static [u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    /// `user_` followed by seven random base-36 characters.
    pub fn ephemeral() -> Self {
        let suffix: String = (0..7)
            .map(|_| Self::ALPHABET[rand::random_range(0..Self::ALPHABET.len())] as char)
            .collect();
        UserId(format!("user_{}", suffix))
    }

    #[cfg(test)]
    pub fn new(id: impl Into<String>) -> Self {
        UserId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
