//! Feed reading: position-addressable pagination over the feed log, with
//! on-demand promotion from the feed queue.
//!
//! A chunk does not exist in the log until a forward read promotes it; the
//! log is the single source of truth for pagination, resumption, and
//! accuracy reporting.

use crate::db::{feed_log_repo, feed_state_repo, queue_repo};
use crate::error::{AppError, Result};
use crate::metrics;
use crate::models::FeedItemFull;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

/// Where to read from. `From` is inclusive, `After`/`Before` exclusive;
/// `Resume` resolves the saved position (inclusive) or the log start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedCursor {
    Resume,
    From(Uuid),
    After(Uuid),
    Before(Uuid),
}

#[derive(Debug)]
pub struct FeedPage {
    /// Always ascending by position, whatever the cursor direction.
    pub items: Vec<FeedItemFull>,
    pub has_more: bool,
    pub has_before: bool,
}

pub async fn read_page(
    pool: &PgPool,
    user_id: Uuid,
    cursor: FeedCursor,
    limit: i64,
) -> Result<FeedPage> {
    if let FeedCursor::Before(feed_item_id) = cursor {
        return read_backward(pool, user_id, feed_item_id, limit).await;
    }

    // Resolve the forward start position and whether it is included.
    let (start_position, inclusive) = match cursor {
        FeedCursor::Resume => match resolve_saved_position(pool, user_id).await? {
            Some(position) => (position, true),
            None => (0, false),
        },
        FeedCursor::From(id) => (owned_position(pool, user_id, id).await?, true),
        FeedCursor::After(id) => (owned_position(pool, user_id, id).await?, false),
        FeedCursor::Before(_) => unreachable!(),
    };

    let mut items =
        feed_log_repo::page_forward(pool, user_id, start_position, inclusive, limit).await?;

    // Shortfall: surface fresh chunks by promoting queue entries into the
    // log. This is the only path by which a chunk becomes "shown".
    let shortfall = limit - items.len() as i64;
    if shortfall > 0 {
        let drained = queue_repo::oldest_for_user(pool, user_id, shortfall).await?;
        if !drained.is_empty() {
            let promoted_ids = feed_log_repo::promote_entries(pool, user_id, &drained).await?;
            metrics::FEED_ITEMS_PROMOTED.inc_by(promoted_ids.len() as u64);
            debug!(
                user_id = %user_id,
                drained = drained.len(),
                promoted = promoted_ids.len(),
                "promoted queue entries on read"
            );
            let promoted = feed_log_repo::enriched_by_ids(pool, user_id, &promoted_ids).await?;
            // New positions all sort after the existing page.
            items.extend(promoted);
        }
    }

    let has_more = items.len() as i64 == limit;
    let reference_position = items
        .first()
        .map(|item| item.position)
        .unwrap_or(start_position + if inclusive { 0 } else { 1 });
    let has_before = feed_log_repo::exists_before(pool, user_id, reference_position).await?;

    Ok(FeedPage {
        items,
        has_more,
        has_before,
    })
}

async fn read_backward(
    pool: &PgPool,
    user_id: Uuid,
    feed_item_id: Uuid,
    limit: i64,
) -> Result<FeedPage> {
    let before_position = owned_position(pool, user_id, feed_item_id).await?;
    let mut items = feed_log_repo::page_backward(pool, user_id, before_position, limit).await?;

    // Fetched descending for the LIMIT; returned ascending like every page.
    let fetched = items.len() as i64;
    items.reverse();

    Ok(FeedPage {
        items,
        // The reference item itself lies past this window.
        has_more: true,
        has_before: fetched == limit,
    })
}

async fn owned_position(pool: &PgPool, user_id: Uuid, feed_item_id: Uuid) -> Result<i64> {
    feed_log_repo::find_owned(pool, user_id, feed_item_id)
        .await?
        .map(|item| item.position)
        .ok_or_else(|| AppError::NotFound("feed item not found".to_string()))
}

/// The saved resume position, if it still points at a live feed item.
/// A stale pointer (e.g. the item was rerolled away) falls back to the
/// log start rather than erroring.
async fn resolve_saved_position(pool: &PgPool, user_id: Uuid) -> Result<Option<i64>> {
    let Some(state) = feed_state_repo::get_state(pool, user_id).await? else {
        return Ok(None);
    };
    let Some(last_seen) = state.last_seen_feed_item_id else {
        return Ok(None);
    };
    Ok(feed_log_repo::find_owned(pool, user_id, last_seen)
        .await?
        .map(|item| item.position))
}

/// Rewind-and-reset: drop unrated future log entries past the cut point
/// (explicit id, else the saved position, else everything unrated) and
/// clear the queue so the next replenish re-scores from scratch. Rated
/// entries are immutable history and always survive.
pub async fn reroll(pool: &PgPool, user_id: Uuid, explicit_cut: Option<Uuid>) -> Result<()> {
    let cut_position = match explicit_cut {
        Some(id) => feed_log_repo::find_owned(pool, user_id, id)
            .await?
            .map(|item| item.position),
        None => resolve_saved_position(pool, user_id).await?,
    };

    let deleted = feed_log_repo::delete_unrated_after(pool, user_id, cut_position).await?;
    let cleared = queue_repo::clear_for_user(pool, user_id).await?;

    info!(
        user_id = %user_id,
        ?cut_position,
        deleted,
        cleared,
        "feed rerolled"
    );
    Ok(())
}
