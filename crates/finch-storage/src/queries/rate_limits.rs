// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-window request counters.

use finch_core::FinchError;
use rusqlite::params;

use crate::database::{Database, map_tr_err};

/// Atomically count one request in `(user_id, window_start)` and return the new total.
///
/// The first request of a window creates the row with a count of 1.
pub async fn increment_window(
    db: &Database,
    user_id: &str,
    window_start: i64,
) -> Result<u32, FinchError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let count: i64 = conn.query_row(
                "INSERT INTO rate_limit_windows (user_id, window_start, count)
                 VALUES (?1, ?2, 1)
                 ON CONFLICT(user_id, window_start) DO UPDATE SET count = count + 1
                 RETURNING count",
                params![user_id, window_start],
                |row| row.get(0),
            )?;
            Ok(u32::try_from(count).unwrap_or(u32::MAX))
        })
        .await
        .map_err(map_tr_err)
}

/// Delete windows that started before `cutoff`. Returns the number removed.
pub async fn prune_before(db: &Database, cutoff: i64) -> Result<usize, FinchError> {
    db.connection()
        .call(move |conn| {
            let removed = conn.execute(
                "DELETE FROM rate_limit_windows WHERE window_start < ?1",
                params![cutoff],
            )?;
            Ok(removed)
        })
        .await
        .map_err(map_tr_err)
}
