/// Wire framing control characters (deepstream text protocol).
///
/// Fields within a message are joined by the ASCII unit separator and each
/// message is terminated by the ASCII record separator, so a single transport
/// frame may carry several messages.
pub const FIELD_SEPARATOR: char = '\u{1f}';
pub const MESSAGE_SEPARATOR: char = '\u{1e}';

/// Topic tokens (magic strings layer)
pub mod topics {
    pub const AUTH: &str = "A";
    pub const CONNECTION: &str = "C";
    pub const EVENT: &str = "E";
    pub const ERROR: &str = "X";
    pub const RECORD: &str = "R";
    pub const RPC: &str = "P";
}

/// Action tokens (magic strings layer)
pub mod actions {
    pub const ACK: &str = "A";
    pub const CHALLENGE: &str = "CH";
    pub const CHALLENGE_RESPONSE: &str = "CHR";
    pub const ERROR: &str = "E";
    pub const PING: &str = "PI";
    pub const PONG: &str = "PO";
    pub const REDIRECT: &str = "RED";
    pub const REJECTION: &str = "REJ";
    pub const REQUEST: &str = "REQ";

    pub const SUBSCRIBE: &str = "S";
    pub const UNSUBSCRIBE: &str = "US";
    pub const EVENT: &str = "EVT";
    pub const CREATE_OR_READ: &str = "CR";
    pub const READ: &str = "RD";
    pub const UPDATE: &str = "U";
    pub const PATCH: &str = "P";
    pub const DELETE: &str = "D";
}

/// Default delay between reconnection attempts (milliseconds)
pub const DEFAULT_RECONNECT_INTERVAL: u64 = 1_000;

/// Default cap on the reconnection backoff delay (milliseconds)
pub const DEFAULT_MAX_RECONNECT_INTERVAL: u64 = 30_000;

/// Default time-to-live for buffered outgoing messages (milliseconds)
pub const DEFAULT_MESSAGE_TTL: u64 = 10_000;

/// How long a reconnect attempt waits for the handshake to reach OPEN
/// before tearing the socket down and retrying (milliseconds)
pub const AUTH_WAIT_WINDOW: u64 = 5_000;
