use crate::error::{Result, ReviewError};
use crate::storage::local_store::KeyValueStore;
use crate::storage::review::{Review, StickyColor, UserId};
use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

/// Slot holding the whole collection as a JSON array, newest first.
pub const STORE_KEY: &str = "aiReviews";

/// Result of a like toggle, enough to refresh one counter in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeOutcome {
    pub liked: bool,
    pub likes: u32,
}

pub struct ReviewService<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> ReviewService<S> {
    pub fn new(store: S) -> Self {
        ReviewService { store }
    }

    /// Read the whole collection. Never fails: a missing, unreadable or
    /// malformed slot yields an empty list.
    pub fn load_all(&self) -> Vec<Review> {
        let raw = match self.store.get_item(STORE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "could not read review store, treating as empty");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Review>>(&raw) {
            Ok(reviews) => reviews,
            Err(e) => {
                warn!(error = %e, "stored reviews are malformed, treating as empty");
                Vec::new()
            }
        }
    }

    /// Overwrite the slot with `reviews`. No merging with what was there.
    pub fn save_all(&self, reviews: &[Review]) -> Result<()> {
        let json = serde_json::to_string(reviews)?;
        self.store.set_item(STORE_KEY, &json)?;
        debug!(count = reviews.len(), "reviews saved");
        Ok(())
    }

    /// Validate and persist a new review at the head of the collection.
    pub fn submit(
        &self,
        title: &str,
        content: &str,
        color: Option<StickyColor>,
        now: &DateTime<Local>,
    ) -> Result<Review> {
        let title = title.trim();
        let content = content.trim();
        if title.is_empty() || content.is_empty() {
            return Err(ReviewError::Validation(
                "Please enter both a title and content.".to_string(),
            ));
        }

        let mut reviews = self.load_all();
        let id = next_id(&reviews, now);
        let review = Review::new(
            id,
            title.to_string(),
            content.to_string(),
            color.unwrap_or_default(),
            now,
        );

        reviews.insert(0, review.clone());
        self.save_all(&reviews)?;

        info!(id = %review.id, title = %review.title, "review posted");
        Ok(review)
    }

    /// Flip `user`'s like on review `id`. `Ok(None)` when the review no longer exists.
    pub fn toggle_like(&self, id: &str, user: &UserId) -> Result<Option<LikeOutcome>> {
        let mut reviews = self.load_all();
        let Some(review) = reviews.iter_mut().find(|r| r.id == id) else {
            debug!(id, "like toggled on a review that is gone, ignoring");
            return Ok(None);
        };

        let liked = review.toggle_like(user);
        let outcome = LikeOutcome {
            liked,
            likes: review.likes,
        };
        self.save_all(&reviews)?;

        debug!(id, user = %user, liked, likes = outcome.likes, "like toggled");
        Ok(Some(outcome))
    }

    /// Reviews `user` has liked, newest first.
    pub fn liked_by(&self, user: &UserId) -> Vec<Review> {
        self.load_all()
            .into_iter()
            .filter(|review| review.is_liked_by(user))
            .collect()
    }
}

/// Millisecond timestamp, bumped past any id already in use.
fn next_id(reviews: &[Review], now: &DateTime<Local>) -> String {
    let mut candidate = now.timestamp_millis();
    while reviews.iter().any(|r| r.id == candidate.to_string()) {
        candidate += 1;
    }
    candidate.to_string()
}
