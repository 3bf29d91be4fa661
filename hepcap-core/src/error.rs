use thiserror::Error;

/// Errors that can occur while decoding, enriching, or serving HEP traffic.
#[derive(Error, Debug)]
pub enum HepError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("missing \"HEP3\" magic")]
    Magic,

    #[error("declared length {declared} does not match received length {actual}")]
    Length { declared: usize, actual: usize },

    #[error("chunk declares length {declared}, exceeding {remaining} remaining bytes")]
    ChunkOverflow { declared: usize, remaining: usize },

    #[error("SIP parser reported a parse error: {0}")]
    SipParse(String),

    #[error("CSeq method shorter than 3 characters")]
    NoCseq,

    #[error("Call-ID shorter than 3 characters")]
    NoCallId,

    #[error("bind failed: {0}")]
    Bind(std::io::Error),
}

pub type Result<T> = std::result::Result<T, HepError>;
