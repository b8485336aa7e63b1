/*
[INPUT]:  Meeting or recording identifiers
[OUTPUT]: Recording listings and publish/delete outcomes
[POS]:    HTTP layer - recording management endpoints
[UPDATE]: When adding recording endpoints or filters
*/

use tracing::warn;

use crate::http::{BbbClient, Result};
use crate::types::{Params, Recording};
use crate::xml::{decode_deleted, decode_published, decode_recordings};

impl BbbClient {
    /// Recordings for the given meetings, or all recordings when empty.
    /// Failures read as an empty list.
    ///
    /// GET /getRecordings?meetingID={id1,id2}
    pub async fn recordings(&self, meeting_ids: &[String]) -> Vec<Recording> {
        self.recording_list(meeting_ids).await.unwrap_or_else(|err| {
            warn!(error = %err, "recording list unavailable");
            Vec::new()
        })
    }

    async fn recording_list(&self, meeting_ids: &[String]) -> Result<Vec<Recording>> {
        let mut params = Params::new();
        if !meeting_ids.is_empty() {
            params.set("meetingID", meeting_ids.join(","));
        }
        let url = self.api_url("getRecordings", params)?;
        let body = self.get_text(url).await?;
        decode_recordings(&body)
    }

    /// Publish or unpublish recordings; `true` when the server confirms
    ///
    /// GET /publishRecordings?publish={bool}&recordID={id1,id2}
    pub async fn publish_recordings(&self, record_ids: &[String], publish: bool) -> bool {
        if record_ids.is_empty() {
            return false;
        }
        let params = Params::new()
            .with("publish", publish.to_string())
            .with("recordID", record_ids.join(","));
        self.update("publishRecordings", params, decode_published).await
    }

    /// Delete recordings; `true` when the server confirms
    ///
    /// GET /deleteRecordings?recordID={id1,id2}
    pub async fn delete_recordings(&self, record_ids: &[String]) -> bool {
        if record_ids.is_empty() {
            return false;
        }
        let params = Params::new().with("recordID", record_ids.join(","));
        self.update("deleteRecordings", params, decode_deleted).await
    }

    async fn update(&self, action: &str, params: Params, decode: fn(&str) -> Result<bool>) -> bool {
        let outcome = match self.api_url(action, params) {
            Ok(url) => self.get_text(url).await.and_then(|body| decode(&body)),
            Err(err) => Err(err),
        };
        outcome.unwrap_or_else(|err| {
            warn!(action, error = %err, "recording update failed");
            false
        })
    }
}
