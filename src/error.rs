use thiserror::Error;

pub type TimelineResult<T> = Result<T, TimelineError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimelineError {
    #[error("invalid viewport size: width={width}, height={height}")]
    InvalidViewport { width: u32, height: u32 },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("unknown time scale: `{0}`")]
    UnknownTimeScale(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("query server reported failure: {0}")]
    Server(String),
}
