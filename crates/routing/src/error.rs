#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot route a message without a channel id")]
    MissingChannel,

    #[error("cannot route a message without a peer id")]
    MissingPeer,
}

pub type Result<T> = std::result::Result<T, Error>;
