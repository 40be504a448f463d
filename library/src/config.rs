use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_SIGNALING_SERVER_URL: &str = "ws://0.0.0.0:9001/call";
pub const DEFAULT_STUN_SERVER: &str = "stun:stun.l.google.com:19302";

/// Specifies what kind of peer connection to create
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConnectionType {
    /// Within local network
    Local,
    /// Setup with STUN server, WAN capabilities but can fail
    Stun { urls: String },
    /// Setup with STUN and TURN servers, will fallback to TURN if needed, most stable connection
    StunAndTurn {
        stun_urls: String,
        turn_urls: String,
        username: String,
        credential: String,
    },
}

impl Default for ConnectionType {
    fn default() -> Self {
        Self::Stun {
            urls: DEFAULT_STUN_SERVER.to_owned(),
        }
    }
}

/// One entry of the peer link's ICE server list.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct IceServer {
    pub urls: String,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl ConnectionType {
    #[must_use]
    pub fn ice_servers(&self) -> Vec<IceServer> {
        match *self {
            Self::Local => Vec::new(),
            Self::Stun { ref urls } => vec![IceServer {
                urls: urls.clone(),
                username: None,
                credential: None,
            }],
            Self::StunAndTurn {
                ref stun_urls,
                ref turn_urls,
                ref username,
                ref credential,
            } => vec![
                IceServer {
                    urls: stun_urls.clone(),
                    username: None,
                    credential: None,
                },
                IceServer {
                    urls: turn_urls.clone(),
                    username: Some(username.clone()),
                    credential: Some(credential.clone()),
                },
            ],
        }
    }
}

/// Which local devices to capture for a call.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
        }
    }
}

/// Everything needed to join the relay and place calls.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallConfig {
    pub signaling_server_url: String,
    pub connection_type: ConnectionType,
    pub media: MediaConstraints,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            signaling_server_url: DEFAULT_SIGNALING_SERVER_URL.to_owned(),
            connection_type: ConnectionType::default(),
            media: MediaConstraints::default(),
        }
    }
}

impl CallConfig {
    /// # Errors
    /// Fails when no signaling URL is set, when neither audio nor video is requested
    /// or when a TURN server lacks credentials.
    pub fn validate(&self) -> Result<()> {
        if self.signaling_server_url.is_empty() {
            return Err(Error::InvalidConfig(
                "signaling server url cannot be empty".to_owned(),
            ));
        }
        if !self.media.audio && !self.media.video {
            return Err(Error::InvalidConfig(
                "at least one of audio or video must be requested".to_owned(),
            ));
        }
        if let ConnectionType::StunAndTurn {
            ref username,
            ref credential,
            ..
        } = self.connection_type
        {
            if username.is_empty() || credential.is_empty() {
                return Err(Error::InvalidConfig(
                    "TURN servers require username and credential".to_owned(),
                ));
            }
        }
        Ok(())
    }
}
