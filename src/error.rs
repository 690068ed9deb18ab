/// Errors raised while executing commands or moving snapshots to and from disk.
///
/// The `Display` output of the command-level variants is exactly the text sent
/// back to clients after the `-` error marker.
#[derive(Debug, thiserror::Error)]
pub enum MinidisError {
    #[error("ERR empty command")]
    EmptyCommand,

    #[error("ERR unknown command")]
    UnknownCommand,

    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongArgCount(String),

    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,

    #[error("ERR value is not an integer or out of range")]
    NotInteger,

    #[error("ERR invalid key or field: not valid UTF-8")]
    InvalidUtf8,

    #[error("ERR no such key")]
    NoSuchKey,

    #[error("ERR index out of range")]
    IndexOutOfRange,

    #[error("ERR corrupt snapshot: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MinidisError {
    pub fn wrong_args(cmd: &str) -> Self {
        MinidisError::WrongArgCount(cmd.to_ascii_lowercase())
    }
}

pub type MinidisResult<T> = Result<T, MinidisError>;
