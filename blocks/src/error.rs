use thiserror::Error;

use crate::pattern::PatternRole;

#[derive(Debug, Error)]
pub enum BlocksError {
    #[error("bad {role} regex '{pattern}': {source}")]
    Pattern {
        role: PatternRole,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("ambiguous: block start and block end cannot be the same.")]
    AmbiguousDelimiters,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
