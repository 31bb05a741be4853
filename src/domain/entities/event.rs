//! Feed events and their routing classification.
//!
//! An event is a JSON object carrying at least a `type` and a `uid` (the
//! source profile id). `roomID` and `profileID` are the only other fields the
//! gateway reads; everything else is payload and is re-emitted untouched.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use crate::shared::error::FrameError;
use crate::shared::validation::validation_error;

/// Known event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Join,
    GetId,
    RoomLeave,
    AccountDelete,
    ProfileChange,
    PostNew,
    PostEdit,
    PostDelete,
    PostReact,
    CommentNew,
    CommentEdit,
    CommentDelete,
    CommentReact,
    RoomJoin,
    MessageNew,
    MessageEdit,
    MessageDelete,
    Relation,
    Notification,
    /// Any type the gateway does not route. Silently ignored.
    Unrecognized,
}

impl EventKind {
    /// Parse the wire `type` string.
    pub fn parse(value: &str) -> Self {
        match value {
            "join" => Self::Join,
            "getID" => Self::GetId,
            "room_leave" => Self::RoomLeave,
            "account_delete" => Self::AccountDelete,
            "profile_change" => Self::ProfileChange,
            "post_new" => Self::PostNew,
            "post_edit" => Self::PostEdit,
            "post_delete" => Self::PostDelete,
            "post_react" => Self::PostReact,
            "comment_new" => Self::CommentNew,
            "comment_edit" => Self::CommentEdit,
            "comment_delete" => Self::CommentDelete,
            "comment_react" => Self::CommentReact,
            "room_join" => Self::RoomJoin,
            "message_new" => Self::MessageNew,
            "message_edit" => Self::MessageEdit,
            "message_delete" => Self::MessageDelete,
            "relation" => Self::Relation,
            "notification" => Self::Notification,
            _ => Self::Unrecognized,
        }
    }

    /// Wire name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::GetId => "getID",
            Self::RoomLeave => "room_leave",
            Self::AccountDelete => "account_delete",
            Self::ProfileChange => "profile_change",
            Self::PostNew => "post_new",
            Self::PostEdit => "post_edit",
            Self::PostDelete => "post_delete",
            Self::PostReact => "post_react",
            Self::CommentNew => "comment_new",
            Self::CommentEdit => "comment_edit",
            Self::CommentDelete => "comment_delete",
            Self::CommentReact => "comment_react",
            Self::RoomJoin => "room_join",
            Self::MessageNew => "message_new",
            Self::MessageEdit => "message_edit",
            Self::MessageDelete => "message_delete",
            Self::Relation => "relation",
            Self::Notification => "notification",
            Self::Unrecognized => "unrecognized",
        }
    }

    /// Audience strategy for this type. Pure function of the type.
    pub fn route(&self) -> Route {
        match self {
            Self::Join => Route::Register,
            Self::GetId | Self::RoomLeave | Self::AccountDelete => Route::Room,
            Self::ProfileChange => Route::NotBlocked,
            Self::PostNew
            | Self::PostEdit
            | Self::PostDelete
            | Self::PostReact
            | Self::CommentNew
            | Self::CommentEdit
            | Self::CommentDelete
            | Self::CommentReact => Route::NotBlockedAndFollowers,
            Self::RoomJoin
            | Self::MessageNew
            | Self::MessageEdit
            | Self::MessageDelete
            | Self::Relation => Route::Direct,
            Self::Notification => Route::Owner,
            Self::Unrecognized => Route::Ignore,
        }
    }
}

/// How the recipients of an event are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Registers the sending connection; nothing is broadcast.
    Register,
    /// Every connection joined to the event's room.
    Room,
    /// Everyone the source has not blocked, plus the source.
    NotBlocked,
    /// Everyone not blocked plus the source's followers, minus blocked.
    NotBlockedAndFollowers,
    /// The source and the addressed profile.
    Direct,
    /// The source only.
    Owner,
    /// No-op.
    Ignore,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Room => "room",
            Self::NotBlocked => "not_blocked",
            Self::NotBlockedAndFollowers => "not_blocked_and_followers",
            Self::Direct => "direct",
            Self::Owner => "owner",
            Self::Ignore => "ignore",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Routing-relevant fields of an inbound event.
#[derive(Debug, Clone, Deserialize, Validate)]
struct EventHeader {
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "must not be empty"))]
    kind: String,

    #[validate(length(min = 1, message = "must not be empty"))]
    uid: String,

    #[serde(rename = "roomID", default)]
    room_id: Option<String>,

    #[serde(rename = "profileID", default)]
    profile_id: Option<String>,
}

impl EventHeader {
    /// JSON key for a header field.
    fn wire_name(field: &str) -> &str {
        match field {
            "kind" => "type",
            "room_id" => "roomID",
            "profile_id" => "profileID",
            other => other,
        }
    }
}

/// A transient feed event, as received from a client.
#[derive(Debug, Clone)]
pub struct Event {
    kind: EventKind,
    header: EventHeader,
    body: Value,
}

impl Event {
    /// Build an event from a decoded JSON value.
    ///
    /// # Errors
    ///
    /// Returns `FrameError` if the value is not an object, lacks a string
    /// `type` or `uid`, or a routing field fails validation.
    pub fn from_value(body: Value) -> Result<Self, FrameError> {
        if !body.is_object() {
            return Err(FrameError::NotAnObject);
        }

        let header = EventHeader::deserialize(&body).map_err(FrameError::Malformed)?;
        header
            .validate()
            .map_err(|errors| validation_error(errors, EventHeader::wire_name))?;

        Ok(Self {
            kind: EventKind::parse(&header.kind),
            header,
            body,
        })
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn route(&self) -> Route {
        self.kind.route()
    }

    /// The `type` string exactly as sent, including unrecognized ones.
    pub fn type_name(&self) -> &str {
        &self.header.kind
    }

    /// Source profile id.
    pub fn uid(&self) -> &str {
        &self.header.uid
    }

    pub fn room_id(&self) -> Option<&str> {
        self.header.room_id.as_deref()
    }

    /// Addressed profile id for direct events.
    pub fn profile_id(&self) -> Option<&str> {
        self.header.profile_id.as_deref()
    }

    /// The full event object.
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Serialize the full event for delivery. Nothing is added or stripped.
    pub fn to_frame(&self) -> Result<Arc<str>, serde_json::Error> {
        serde_json::to_string(&self.body).map(Arc::from)
    }
}
