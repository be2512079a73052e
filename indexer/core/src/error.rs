use {indexer_appdata::AppDataError, thiserror::Error};

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("invalid indexing config: {0}")]
    Config(String),

    #[error("target `{target}` has unknown indexer type `{ty}`")]
    UnknownIndexerType { target: String, ty: String },

    #[error("target `{target}` has a filter, but filters aren't supported yet")]
    FilterNotSupported { target: String },

    #[error("indexer type `{0}` is already registered")]
    DuplicateIndexerType(String),

    #[error("failed to initialize target `{target}`: {source}")]
    Init {
        target: String,
        #[source]
        source: AppDataError,
    },

    #[error(
        "target `{target}` last persisted block {last_persisted}, can't resume at block {height}"
    )]
    Consistency {
        target: String,
        last_persisted: i64,
        height: u64,
    },

    #[error("target `{target}` is empty and needs a sync source to start at block {height}")]
    MissingSyncSource { target: String, height: u64 },

    #[error(transparent)]
    AppData(#[from] AppDataError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    ConfigParser(#[from] config_parser::Error),
}

impl From<IndexerError> for AppDataError {
    fn from(err: IndexerError) -> Self {
        match err {
            IndexerError::AppData(err) => err,
            err => AppDataError::Other(err.into()),
        }
    }
}

pub type IndexerResult<T> = core::result::Result<T, IndexerError>;

#[macro_export]
macro_rules! bail {
    ($variant:path, $msg:expr) => {
        return Err($variant($msg.into()).into());
    };
    ($($arg:tt)*) => {
        return Err($crate::IndexerError::Config(format!($($arg)*)).into());
    };
}
