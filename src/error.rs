use thiserror::Error;

/// Failures of the exact linear-algebra layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatrixError {
    #[error("incompatible shapes for {op}: {left:?} and {right:?}")]
    ShapeMismatch {
        op: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("matrix is not square ({rows} x {cols})")]
    NotSquare { rows: usize, cols: usize },

    #[error("row {row} has {found} entries, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("matrix is non-invertible")]
    Singular,

    #[error("rational with zero denominator")]
    ZeroDenominator,

    #[error("column {column} sums to {total}, not 1")]
    NotStochastic { column: usize, total: String },

    #[error("transient block never drains into an absorbing state")]
    NotAbsorbing,
}

/// Failures of the combat model. All of these mean a rule table or the
/// state catalog is wrong; none of them are retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BattleError {
    #[error("{stage}: probabilities sum to {total}, not 1")]
    NotADistribution { stage: &'static str, total: String },

    #[error("no state matches damage {0}")]
    NoStateForDamage(String),

    #[error("damage {damage} belongs to both state {first} and state {second}")]
    DuplicateDamage {
        damage: String,
        first: usize,
        second: usize,
    },

    #[error("state {state} is outside 1..={count}")]
    StateOutOfRange { state: usize, count: usize },

    #[error("state {state} has {members} damage members, expected exactly one")]
    AmbiguousState { state: usize, members: usize },

    #[error("{category} hits left over but {unit} is at {damage}/{threshold}")]
    LeftoverHits {
        category: &'static str,
        unit: &'static str,
        damage: u8,
        threshold: u8,
    },

    #[error("invalid die: {0}")]
    InvalidDie(String),

    #[error("{unit} does not fight in the {battle} battle")]
    UnitNotInBattle {
        unit: &'static str,
        battle: &'static str,
    },

    #[error("simulation plan needs at least one {field}")]
    EmptyPlan { field: &'static str },

    #[error("combat from state {start} not absorbed within {cap} rounds")]
    RoundCapExceeded { start: usize, cap: u32 },

    #[error(transparent)]
    Matrix(#[from] MatrixError),
}

/// Failures loading [crate::config::AnalysisConfig].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid value '{value}' for {name}")]
    InvalidEnv { name: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, BattleError>;
