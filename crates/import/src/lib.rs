pub mod match_engine;
pub mod pipeline;
pub mod statement;

pub use match_engine::{
    score_pair, AutoMatchEngine, MatchCandidate, MatchMap, MatchPolicy, AUTO_RECONCILE_THRESHOLD,
    MAX_CONFIDENCE, SUGGESTION_THRESHOLD,
};
pub use pipeline::{import_statement, ImportError, ImportRequest, ImportSummary};
pub use statement::{
    read_statement, ColumnMapping, ParsedStatement, StatementError, StatementProfile, StatementRow,
};
