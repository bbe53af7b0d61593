use sqlx::Error as SqlxError;
use std::fmt;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum BrokerDbError {
    #[error(transparent)]
    Vcap(#[from] VcapError),

    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("Configuration already installed; it is written once at startup")]
    ConfigAlreadyInstalled,

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("Detail blob error: {0}")]
    Blob(#[from] serde_json::Error),

    #[error("Revision {revision} of table `{table}` is already registered")]
    DuplicateRevision { table: &'static str, revision: u32 },

    #[error("Revision {revision} of table `{table}` is older than registered revision {latest}")]
    StaleRevision {
        table: &'static str,
        revision: u32,
        latest: u32,
    },

    #[error(
        "Revision {revision} of table `{table}` drops or retypes column `{column}` from revision {previous}"
    )]
    NonAdditiveRevision {
        table: &'static str,
        revision: u32,
        previous: u32,
        column: &'static str,
    },

    #[error("Migration counter can only increase: current {current}, requested {requested}")]
    MigrationRegression { current: i32, requested: i32 },
}

/// Errors raised while resolving the database binding from `VCAP_SERVICES`.
#[derive(Debug, ThisError)]
pub enum VcapError {
    #[error("Error parsing VCAP_SERVICES {stage}: {source}")]
    Parse {
        stage: ParseStage,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(
        "The variable VCAP_SERVICES must have one VCAP service with a tag of '{tag}'. There are currently {count} VCAP services with the tag '{tag}'."
    )]
    Selection { tag: &'static str, count: usize },
}

impl VcapError {
    pub(crate) fn parse(
        stage: ParseStage,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Parse {
            stage,
            source: Box::new(source),
        }
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    pub fn is_selection(&self) -> bool {
        matches!(self, Self::Selection { .. })
    }
}

/// Which step of VCAP_SERVICES parsing failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseStage {
    /// The top-level `{ label: [...] }` object.
    Payload,
    /// The descriptor array stored under `label`.
    Descriptors { label: String },
    /// The `uri` credential of the selected binding.
    CredentialsUri,
}

impl fmt::Display for ParseStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseStage::Payload => f.write_str("payload"),
            ParseStage::Descriptors { label } => write!(f, "services under label '{label}'"),
            ParseStage::CredentialsUri => f.write_str("credentials URI"),
        }
    }
}
