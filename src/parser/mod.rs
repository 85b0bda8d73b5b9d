pub mod adjustment;
pub mod free_text;
pub mod notes;
pub mod price;
pub mod table;

use tracing::debug;

use crate::model::{Post, Prediction, Source};

/// Two-strategy pipeline: table rows first, prose fallback, then notes.
///
/// Pure over the post: the timestamp is the post's creation time, so parsing
/// the same post twice gives identical output.
pub fn parse_post(post: &Post, source: Source) -> Prediction {
    let text = format!("{}\n{}", post.title, post.body);

    let mut slots = table::extract(&text);
    if slots.is_empty() {
        debug!(id = %post.id, "no table rows, falling back to free text");
        slots = free_text::extract(&text);
    }

    Prediction {
        gas: slots.gas,
        diesel: slots.diesel,
        notes: notes::extract(&post.body),
        source,
        identifier: Some(post.id.clone()),
        timestamp: post.created,
    }
}
