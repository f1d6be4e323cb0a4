pub mod batch;
pub mod content;
pub mod error;
pub mod matcher;
pub mod method;
pub mod overwrite;
pub mod owner;
pub mod patterns;
pub mod storage;
pub mod verify;

pub use batch::{BatchShredder, BatchSummary};
pub use content::{
    count_occurrences, ContentInspector, ContentMatch, FormatAwareInspector, NoContentInspector,
    TextExtractor,
};
pub use error::ShredError;
pub use matcher::{ContentPredicate, FileMatcher, MatchCriteria, MatchResult};
pub use method::{Pass, PassPattern, PatternGenerator, ShredMethod, DEFAULT_BASIC_PASSES};
pub use overwrite::{OverwriteEngine, ShredJob, ShredOutcome, ShredState, DEFAULT_CHUNK_SIZE};
pub use patterns::parse_pattern_list;
pub use storage::{OsStorage, Storage};
pub use verify::verify_pass;
