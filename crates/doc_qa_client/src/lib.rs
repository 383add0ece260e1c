//! Document Q&A client library: attach documents, ask a question, and follow
//! the answer as it streams back. Used by the `doc-qa` terminal frontend.

pub mod batch;
pub mod compose;
pub mod config;
pub mod decode;
pub mod error;
pub mod render;
pub mod state;
pub mod stream;
pub mod transport;
pub mod turn;

pub use batch::{Document, UploadBatch};
pub use compose::{compose, Payload};
pub use config::{default_config_path, ClientSection, Config, ConfigError, ServerSection};
pub use decode::{DecodeMode, Utf8StreamDecoder};
pub use error::{
    DecodeError, InvalidTransition, StreamError, SubmitError, TransportError, ValidationError,
};
pub use render::{follow, RenderOutcome};
pub use state::{ConversationState, ConversationView, Phase, ABANDONED_MESSAGE};
pub use stream::StreamConsumer;
pub use transport::HttpTransport;
pub use turn::{ConversationTurn, TurnStatus};
