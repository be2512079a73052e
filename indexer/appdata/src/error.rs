use {indexer_schema::SchemaError, thiserror::Error};

#[derive(Debug, Error)]
pub enum AppDataError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("failed to decode data of module `{module}`: {reason}")]
    Decoding { module: String, reason: String },

    #[error("catch-up sync failed: {0}")]
    Sync(String),

    #[error("listener has stopped and no longer accepts packets")]
    ListenerStopped,

    #[error("cancelled")]
    Cancelled,

    #[error("commit packets cannot be batched")]
    CommitInBatch,

    #[error("mutex poison error: {0}")]
    Poison(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error("{0}")]
    Generic(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppDataError {
    pub fn decoding<M, R>(module: M, reason: R) -> Self
    where
        M: Into<String>,
        R: ToString,
    {
        Self::Decoding {
            module: module.into(),
            reason: reason.to_string(),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for AppDataError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        AppDataError::Poison(err.to_string())
    }
}

pub type AppDataResult<T> = core::result::Result<T, AppDataError>;

#[macro_export]
macro_rules! bail {
    ($variant:path, $msg:expr) => {
        return Err($variant($msg.into()).into());
    };
    ($($arg:tt)*) => {
        return Err($crate::AppDataError::Generic(format!($($arg)*)).into());
    };
}
