use thiserror::Error;

/// Top-level error type for the `mountlink-bus` crate.
///
/// Transports report their own delivery problems through logging; these
/// variants only cover misuse of the transport handle itself.
#[derive(Debug, Error)]
pub enum Error {
    /// The transport was stopped and must not be used again.
    #[error("bus transport has been stopped")]
    Stopped,

    /// A request that needs an attached client was made before `attach_client`.
    #[error("no client is attached to the bus")]
    NotAttached,

    /// `attach_client` was called while another client is still attached.
    #[error("client '{client}' is already attached to the bus")]
    AlreadyAttached { client: String },

    /// The transport's background task is gone.
    #[error("bus transport channel closed")]
    ChannelClosed,
}
