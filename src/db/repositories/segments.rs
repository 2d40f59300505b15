use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::db::{helpers::parse_datetime, models::StoredVideo, Database};
use crate::models::Overlay;
use crate::segmentation::PersistedSegments;

impl Database {
    /// Insert or replace the committed segments and overlays for a video.
    pub async fn save_video_segments(
        &self,
        video_id: &str,
        segments: &PersistedSegments,
        overlays: &[Overlay],
        output_url: Option<&str>,
    ) -> Result<StoredVideo> {
        let record = StoredVideo {
            video_id: video_id.to_string(),
            segments: segments.clone(),
            overlays: overlays.to_vec(),
            output_url: output_url.map(str::to_string),
            updated_at: Utc::now(),
        };
        let segments_json =
            serde_json::to_string(&record.segments).context("failed to encode segments")?;
        let overlays_json =
            serde_json::to_string(&record.overlays).context("failed to encode overlays")?;

        let stored = record.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO video_segments (video_id, segments_json, overlays_json, output_url, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(video_id) DO UPDATE SET
                     segments_json = excluded.segments_json,
                     overlays_json = excluded.overlays_json,
                     output_url = excluded.output_url,
                     updated_at = excluded.updated_at",
                params![
                    stored.video_id,
                    segments_json,
                    overlays_json,
                    stored.output_url,
                    stored.updated_at.to_rfc3339(),
                ],
            )
            .with_context(|| format!("failed to save segments for video {}", stored.video_id))?;
            Ok(())
        })
        .await?;

        Ok(record)
    }

    /// Load committed segments for a video, verbatim as saved.
    pub async fn get_video_segments(&self, video_id: &str) -> Result<Option<StoredVideo>> {
        let video_id = video_id.to_string();
        self.execute(move |conn| {
            let row = conn
                .query_row(
                    "SELECT video_id, segments_json, overlays_json, output_url, updated_at
                     FROM video_segments
                     WHERE video_id = ?1",
                    params![video_id],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, Option<String>>(3)?,
                            row.get::<_, String>(4)?,
                        ))
                    },
                )
                .optional()
                .context("failed to query video segments")?;

            let Some((video_id, segments_json, overlays_json, output_url, updated_at)) = row
            else {
                return Ok(None);
            };

            Ok(Some(StoredVideo {
                segments: serde_json::from_str(&segments_json)
                    .with_context(|| format!("corrupt segments for video {video_id}"))?,
                overlays: serde_json::from_str(&overlays_json)
                    .with_context(|| format!("corrupt overlays for video {video_id}"))?,
                output_url,
                updated_at: parse_datetime(&updated_at, "updated_at")?,
                video_id,
            }))
        })
        .await
    }
}
