//! Stream handling
//!
//! Connects to station streams, strips ICY metadata from the audio bytes
//! and runs one session per active connection.

pub mod connector;
pub mod metadata;
pub mod session;

pub use connector::{ByteStream, HttpConnector, StreamConnector, StreamTransport};
pub use metadata::{extract_stream_title, IcyDemuxer, Metadata};
pub use session::{ConnectionState, SessionContext, StreamSession};
