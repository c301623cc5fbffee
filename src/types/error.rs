use thiserror::Error;

/// Errors that can occur when using the deepstream client.
#[derive(Error, Debug)]
pub enum DeepstreamError {
    /// WebSocket protocol error (connection failed, broken pipe, invalid frame)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Inbound frame could not be split into topic/action/data fields
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// Inbound message carried a topic token this client does not know
    #[error("unknown topic: {0}")]
    UnknownTopic(String),

    /// Inbound message carried an action token this client does not know
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// Feature the client deliberately does not implement (RPC)
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(&'static str),

    /// Server rejected the connection challenge; sticky until a fresh login
    /// with new credentials
    #[error("authentication rejected by server")]
    AuthenticationRejected,

    /// Connection refused or reset during a reconnection attempt
    #[error("connection unavailable: {0}")]
    ConnectionUnavailable(String),

    /// Two connection heartbeats missed successively
    #[error("two connection heartbeats missed successively")]
    HeartbeatTimeout,

    /// JSON serialization error (credentials payload)
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing error (malformed endpoint URL)
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Convenience type alias for `Result<T, DeepstreamError>`.
pub type Result<T> = std::result::Result<T, DeepstreamError>;
