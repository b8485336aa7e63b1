/*
[INPUT]:  Meeting identifiers, passwords and create/join options
[OUTPUT]: Meetings, join URLs and running-state probes
[POS]:    HTTP layer - meeting lifecycle endpoints
[UPDATE]: When adding meeting endpoints or changing failure policy
*/

use tracing::{debug, warn};

use crate::http::{BbbClient, Result};
use crate::types::{CreateOptions, JoinOptions, Meeting, Params};
use crate::xml::{
    check_envelope, decode_create, decode_meeting_info, decode_meetings, decode_running,
    decode_version, presentation_modules,
};

impl BbbClient {
    /// Create a meeting
    ///
    /// GET /create?meetingID={id}&...
    /// POST /create with a `<modules>` body when documents are attached
    pub async fn create(&self, meeting_id: &str, options: &CreateOptions) -> Result<Meeting> {
        let params = Params::new()
            .with("meetingID", meeting_id)
            .merge(options.encode());
        let url = self.api_url("create", params)?;

        let body = if options.documents.is_empty() {
            self.get_text(url).await?
        } else {
            let modules = presentation_modules(&options.documents)?;
            self.post_xml(url, modules).await?
        };
        decode_create(&body)
    }

    /// Signed URL a browser follows to enter the meeting; no request is made
    ///
    /// /join?fullName={name}&meetingID={id}&password={password}&...
    pub fn join_url(
        &self,
        full_name: &str,
        meeting_id: &str,
        password: &str,
        options: &JoinOptions,
    ) -> Result<String> {
        let params = Params::new()
            .with("fullName", full_name)
            .with("meetingID", meeting_id)
            .with("password", password)
            .merge(options.encode());
        Ok(self.api_url("join", params)?.to_string())
    }

    /// Best-effort probe; any failure reads as not running
    ///
    /// GET /isMeetingRunning?meetingID={id}
    pub async fn is_meeting_running(&self, meeting_id: &str) -> bool {
        match self.running_state(meeting_id).await {
            Ok(running) => running,
            Err(err) => {
                debug!(meeting_id, error = %err, "running probe failed");
                false
            }
        }
    }

    async fn running_state(&self, meeting_id: &str) -> Result<bool> {
        let url = self.api_url("isMeetingRunning", Params::new().with("meetingID", meeting_id))?;
        let body = self.get_text(url).await?;
        decode_running(&body)
    }

    /// End a meeting and wait until the server no longer knows it.
    ///
    /// Returns `Ok(false)` when the meeting is still reported after the
    /// polling budget in [`ClientConfig`](crate::http::ClientConfig).
    ///
    /// GET /end?meetingID={id}&password={password}
    pub async fn end(&self, meeting_id: &str, password: &str) -> Result<bool> {
        let params = Params::new()
            .with("meetingID", meeting_id)
            .with("password", password);
        let url = self.api_url("end", params)?;
        let body = self.get_text(url).await?;
        if let Err(err) = check_envelope(&body) {
            warn!(meeting_id, error = %err, "end request rejected; polling anyway");
        }

        for attempt in 0..self.config().end_poll_attempts {
            if self.meeting_info(meeting_id, password).await.is_err() {
                debug!(meeting_id, attempt, "meeting gone");
                return Ok(true);
            }
            tokio::time::sleep(self.config().end_poll_interval).await;
        }

        warn!(
            meeting_id,
            attempts = self.config().end_poll_attempts,
            "meeting still reported after end"
        );
        Ok(false)
    }

    /// Full meeting details, attendees included
    ///
    /// GET /getMeetingInfo?meetingID={id}&password={password}
    pub async fn meeting_info(&self, meeting_id: &str, password: &str) -> Result<Meeting> {
        let params = Params::new()
            .with("meetingID", meeting_id)
            .with("password", password);
        let url = self.api_url("getMeetingInfo", params)?;
        let body = self.get_text(url).await?;
        decode_meeting_info(&body)
    }

    /// All meetings on the server; failures read as an empty list
    ///
    /// GET /getMeetings
    pub async fn meetings(&self) -> Vec<Meeting> {
        self.meeting_list().await.unwrap_or_else(|err| {
            warn!(error = %err, "meeting list unavailable");
            Vec::new()
        })
    }

    async fn meeting_list(&self) -> Result<Vec<Meeting>> {
        let url = self.api_url("getMeetings", Params::new())?;
        let body = self.get_text(url).await?;
        decode_meetings(&body)
    }

    /// Server version for display; failures come back as a readable message
    ///
    /// GET / (unsigned)
    pub async fn server_version(&self) -> String {
        match self.probe_version().await {
            Ok(version) => version,
            Err(err) => format!("Error: {err}"),
        }
    }

    /// Strict variant of [`BbbClient::server_version`] that keeps the error
    pub async fn probe_version(&self) -> Result<String> {
        let body = self.get_text(self.base_url().clone()).await?;
        decode_version(&body)
    }
}
