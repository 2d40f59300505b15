use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::db::{helpers::to_percentage, Database};
use crate::models::ProgressCheckpoint;

impl Database {
    /// Upsert the watched percentage for a video. The stored value never
    /// decreases, so checkpoints written out of order cannot lose progress.
    pub async fn save_checkpoint(&self, checkpoint: &ProgressCheckpoint) -> Result<()> {
        let record = checkpoint.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO progress_checkpoints (video_id, percentage, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(video_id) DO UPDATE SET
                     percentage = MAX(percentage, excluded.percentage),
                     updated_at = excluded.updated_at",
                params![
                    record.video_id,
                    i64::from(record.percentage),
                    Utc::now().to_rfc3339(),
                ],
            )
            .with_context(|| format!("failed to save checkpoint for {}", record.video_id))?;
            Ok(())
        })
        .await
    }

    pub async fn get_checkpoint(&self, video_id: &str) -> Result<Option<u8>> {
        let video_id = video_id.to_string();
        self.execute(move |conn| {
            let stored: Option<i64> = conn
                .query_row(
                    "SELECT percentage FROM progress_checkpoints WHERE video_id = ?1",
                    params![video_id],
                    |row| row.get(0),
                )
                .optional()
                .context("failed to query checkpoint")?;

            stored
                .map(|value| to_percentage(value, "percentage"))
                .transpose()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;
    use crate::models::ProgressCheckpoint;

    #[tokio::test]
    async fn checkpoint_upserts_per_video() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("repcast.sqlite3")).unwrap();

        assert_eq!(db.get_checkpoint("a").await.unwrap(), None);
        db.save_checkpoint(&ProgressCheckpoint::new("a", 12)).await.unwrap();
        db.save_checkpoint(&ProgressCheckpoint::new("a", 100)).await.unwrap();
        db.save_checkpoint(&ProgressCheckpoint::new("b", 5)).await.unwrap();

        assert_eq!(db.get_checkpoint("a").await.unwrap(), Some(100));
        assert_eq!(db.get_checkpoint("b").await.unwrap(), Some(5));
    }

    #[tokio::test]
    async fn late_lower_checkpoint_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("repcast.sqlite3")).unwrap();

        db.save_checkpoint(&ProgressCheckpoint::new("a", 50)).await.unwrap();
        db.save_checkpoint(&ProgressCheckpoint::new("a", 11)).await.unwrap();

        assert_eq!(db.get_checkpoint("a").await.unwrap(), Some(50));
    }
}
