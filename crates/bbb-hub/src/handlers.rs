/*
[INPUT]:  Typed requests from a connection plus its API session
[OUTPUT]: Replies routed privately or broadcast to every connection
[POS]:    Hub layer - the fixed set of event handlers
[UPDATE]: When adding event tags or changing what a tag broadcasts
*/

use async_trait::async_trait;
use bbb_adapter::BbbClient;
use tracing::{info, warn};

use crate::connection::Connection;
use crate::error::Result;
use crate::event::{
    ConnectRequest, ConnectedReply, CreateRequest, DeleteRecordingsRequest, DeletedReply,
    EndedReply, FailureReply, JoinRequest, JoinUrlReply, MeetingAuth, MeetingDetails,
    MeetingSummary, MeetingsReply, MeetingsRequest, PublishRecordingsRequest, PublishedReply,
    RecordingSummary, RecordingsReply, RecordingsRequest, Reply, RunningReply, RunningRequest,
    STATUS_FAILURE, STATUS_SUCCESS,
};
use crate::router::{Delivery, EventHandler, HandlerTable};

/// Handler table with every supported tag
pub fn default_handlers() -> HandlerTable {
    HandlerTable::new()
        .with("connect", ConnectHandler)
        .with("create", CreateHandler)
        .with("joinURL", JoinUrlHandler)
        .with("end", EndHandler)
        .with("running", RunningHandler)
        .with("info", InfoHandler)
        .with("meetings", MeetingsHandler)
        .with("recordings", RecordingsHandler)
        .with("recordings.publish", PublishRecordingsHandler)
        .with("recordings.delete", DeleteRecordingsHandler)
}

/// Replaces the connection's API session after a version probe succeeds
pub struct ConnectHandler;

#[async_trait]
impl EventHandler for ConnectHandler {
    type Request = ConnectRequest;

    async fn handle(&self, connection: &Connection, request: ConnectRequest) -> Result<Delivery> {
        let failure = |error: String| ConnectedReply {
            status: STATUS_FAILURE.to_string(),
            version: String::new(),
            error,
        };

        let reply = match BbbClient::new(&request.url, &request.secret) {
            Err(err) => failure(err.to_string()),
            Ok(client) => match client.probe_version().await {
                Ok(version) if !version.is_empty() => {
                    info!(connection = %connection.id(), %version, "api session established");
                    connection.set_session(client);
                    ConnectedReply {
                        status: STATUS_SUCCESS.to_string(),
                        version,
                        error: String::new(),
                    }
                }
                Ok(_) => failure("server reported no version".to_string()),
                Err(err) => failure(err.to_string()),
            },
        };
        Ok(Delivery::Reply(Reply::Connected(reply)))
    }
}

pub struct CreateHandler;

#[async_trait]
impl EventHandler for CreateHandler {
    type Request = CreateRequest;

    async fn handle(&self, connection: &Connection, request: CreateRequest) -> Result<Delivery> {
        let client = connection.session()?;
        match client.create(&request.id, &request.options).await {
            Ok(meeting) => Ok(Delivery::Broadcast(Reply::CreateSuccess(
                MeetingSummary::from(&meeting),
            ))),
            Err(err) => {
                warn!(meeting_id = %request.id, error = %err, "create failed");
                Ok(Delivery::Reply(Reply::CreateFail(FailureReply {
                    error: err.to_string(),
                })))
            }
        }
    }
}

pub struct JoinUrlHandler;

#[async_trait]
impl EventHandler for JoinUrlHandler {
    type Request = JoinRequest;

    async fn handle(&self, connection: &Connection, request: JoinRequest) -> Result<Delivery> {
        let url = connection.session()?.join_url(
            &request.name,
            &request.id,
            &request.password,
            &request.options,
        )?;
        Ok(Delivery::Reply(Reply::JoinUrl(JoinUrlReply { url })))
    }
}

/// Broadcasts only once the meeting is confirmed gone
pub struct EndHandler;

#[async_trait]
impl EventHandler for EndHandler {
    type Request = MeetingAuth;

    async fn handle(&self, connection: &Connection, request: MeetingAuth) -> Result<Delivery> {
        let (ended, error) = match connection.session()?.end(&request.id, &request.password).await {
            Ok(ended) => (ended, None),
            Err(err) => {
                warn!(meeting_id = %request.id, error = %err, "end failed");
                (false, Some(err.to_string()))
            }
        };

        let reply = Reply::Ended(EndedReply {
            ended,
            id: request.id,
            error,
        });
        if ended {
            Ok(Delivery::Broadcast(reply))
        } else {
            Ok(Delivery::Reply(reply))
        }
    }
}

pub struct RunningHandler;

#[async_trait]
impl EventHandler for RunningHandler {
    type Request = RunningRequest;

    async fn handle(&self, connection: &Connection, request: RunningRequest) -> Result<Delivery> {
        let running = connection.session()?.is_meeting_running(&request.id).await;
        Ok(Delivery::Reply(Reply::Running(RunningReply { running })))
    }
}

pub struct InfoHandler;

#[async_trait]
impl EventHandler for InfoHandler {
    type Request = MeetingAuth;

    async fn handle(&self, connection: &Connection, request: MeetingAuth) -> Result<Delivery> {
        let reply = match connection
            .session()?
            .meeting_info(&request.id, &request.password)
            .await
        {
            Ok(meeting) => Reply::InfoSuccess(MeetingDetails::from(&meeting)),
            Err(err) => Reply::InfoFail(FailureReply {
                error: err.to_string(),
            }),
        };
        Ok(Delivery::Reply(reply))
    }
}

pub struct MeetingsHandler;

#[async_trait]
impl EventHandler for MeetingsHandler {
    type Request = MeetingsRequest;

    async fn handle(&self, connection: &Connection, _request: MeetingsRequest) -> Result<Delivery> {
        let meetings = connection.session()?.meetings().await;
        Ok(Delivery::Reply(Reply::Meetings(MeetingsReply {
            meetings: meetings.iter().map(MeetingSummary::from).collect(),
        })))
    }
}

pub struct RecordingsHandler;

#[async_trait]
impl EventHandler for RecordingsHandler {
    type Request = RecordingsRequest;

    async fn handle(
        &self,
        connection: &Connection,
        request: RecordingsRequest,
    ) -> Result<Delivery> {
        let recordings = connection.session()?.recordings(&request.meetings).await;
        Ok(Delivery::Reply(Reply::Recordings(RecordingsReply {
            recordings: recordings.iter().map(RecordingSummary::from).collect(),
        })))
    }
}

pub struct PublishRecordingsHandler;

#[async_trait]
impl EventHandler for PublishRecordingsHandler {
    type Request = PublishRecordingsRequest;

    async fn handle(
        &self,
        connection: &Connection,
        request: PublishRecordingsRequest,
    ) -> Result<Delivery> {
        let published = connection
            .session()?
            .publish_recordings(&request.recordings, request.publish)
            .await;
        let reply = Reply::Published(PublishedReply {
            recordings: request.recordings,
            published,
        });
        Ok(if published {
            Delivery::Broadcast(reply)
        } else {
            Delivery::Reply(reply)
        })
    }
}

pub struct DeleteRecordingsHandler;

#[async_trait]
impl EventHandler for DeleteRecordingsHandler {
    type Request = DeleteRecordingsRequest;

    async fn handle(
        &self,
        connection: &Connection,
        request: DeleteRecordingsRequest,
    ) -> Result<Delivery> {
        let deleted = connection
            .session()?
            .delete_recordings(&request.recordings)
            .await;
        let reply = Reply::Deleted(DeletedReply {
            recordings: request.recordings,
            deleted,
        });
        Ok(if deleted {
            Delivery::Broadcast(reply)
        } else {
            Delivery::Reply(reply)
        })
    }
}
