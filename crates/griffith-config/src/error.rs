/// Failure to read or write `config.ron`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read settings file: {0}")]
    ReadError(#[source] std::io::Error),

    #[error("cannot write settings file: {0}")]
    WriteError(#[source] std::io::Error),

    /// The file is not valid RON for [`crate::Config`].
    #[error("malformed settings file: {0}")]
    ParseError(#[source] ron::error::SpannedError),

    #[error("cannot encode settings: {0}")]
    SerializeError(#[source] ron::Error),
}
