use thiserror::Error;

#[derive(Debug, Error)]
pub enum FspecError {
    #[error("not initialized: run 'fspec init'")]
    NotInitialized,

    #[error("work unit not found: {0}")]
    WorkUnitNotFound(String),

    #[error("work unit already exists: {0}")]
    WorkUnitExists(String),

    #[error("epic not found: {0}")]
    EpicNotFound(String),

    #[error("epic already exists: {0}")]
    EpicExists(String),

    #[error("epic '{epic}' is still assigned to work unit {unit}")]
    EpicInUse { epic: String, unit: String },

    #[error("prefix not registered: {0} (run 'fspec prefix register')")]
    PrefixNotRegistered(String),

    #[error("prefix already registered: {0}")]
    PrefixExists(String),

    #[error("invalid prefix '{0}': must be 2-10 uppercase letters or digits, starting with a letter")]
    InvalidPrefix(String),

    #[error("tag not found: {0}")]
    TagNotFound(String),

    #[error("tag already registered: {0}")]
    TagExists(String),

    #[error("invalid tag name '{0}': must start with '@' followed by lowercase letters, digits, or hyphens")]
    InvalidTagName(String),

    #[error("{collection} item {id} not found")]
    ItemNotFound { collection: &'static str, id: u32 },

    #[error("invalid status: {0}")]
    InvalidStatus(String),

    #[error("invalid work unit type: {0}")]
    InvalidType(String),

    #[error("invalid relation kind: {0}")]
    InvalidRelation(String),

    #[error("invalid event storm level: {0}")]
    InvalidLevel(String),

    #[error("invalid event storm item kind: {0}")]
    InvalidItemKind(String),

    #[error("transition to blocked requires --reason")]
    BlockedReasonRequired,

    #[error("{id} has unanswered questions: {open:?}")]
    UnansweredQuestions { id: String, open: Vec<u32> },

    #[error("missing {artifact} for {id}: create it before transitioning")]
    MissingArtifact { artifact: String, id: String },

    #[error("{artifact} for {id} predates the current state: update it or pass --skip-artifact-check")]
    StaleArtifact { artifact: String, id: String },

    #[error("{id} is blocked by {blocker} (status: {blocker_status})")]
    ActiveBlocker {
        id: String,
        blocker: String,
        blocker_status: String,
    },

    #[error("circular reference: {parent} is a descendant of {id}")]
    CircularReference { id: String, parent: String },

    #[error("cannot add a relationship from {0} to itself")]
    SelfRelation(String),

    #[error("work unit type is immutable: {id} is already a {current}")]
    ImmutableType { id: String, current: String },

    #[error("cannot compact {id} while status is {status}: compaction is only allowed when done (use --force to override)")]
    CompactionNotAllowed { id: String, status: String },

    #[error("could not acquire lock on {0} after repeated attempts")]
    LockTimeout(String),

    #[error("schema validation failed for {file}: {reason}")]
    SchemaValidation { file: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FspecError>;
