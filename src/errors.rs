//! errors that abort a clustering run.
//!
//! All of them are fatal: a partial clustering is worse than no clustering, so
//! each error is propagated up to the pipeline which stops at the first one.

use thiserror::Error;


#[derive(Debug, Error)]
pub enum ClusterError {
    /// the one time indexing of the combined database failed
    #[error("index build failed on {path} : {reason}")]
    IndexBuildFailure { path : String, reason : String },
    /// the search tool failed for one query
    #[error("search tool failed for query {query} : {reason}")]
    SearchToolFailure { query : String, reason : String },
    /// a hit returned by the search tool is neither in the database nor in the queries
    #[error("query {query} got hit {hit} not found in database nor in queries")]
    IntegrityError { query : String, hit : String },
    /// bad fasta input or bad parameter value
    #[error("malformed input : {0}")]
    MalformedInputError(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
} // end of ClusterError


impl ClusterError {
    /// true if the error comes from the external search tool
    pub fn is_search_failure(&self) -> bool {
        matches!(self, ClusterError::SearchToolFailure { .. })
    }
} // end of impl ClusterError


#[cfg(test)]
mod tests {

use super::*;

#[test]
fn test_error_display() {
    let err = ClusterError::IntegrityError{ query : "q1".to_string(), hit : "h7".to_string()};
    assert_eq!(err.to_string(), "query q1 got hit h7 not found in database nor in queries");
    assert!(!err.is_search_failure());
    //
    let err = ClusterError::SearchToolFailure{ query : "q2".to_string(), reason : "exit status: 2".to_string()};
    assert!(err.is_search_failure());
    assert!(err.to_string().contains("q2"));
    //
    let io_err : ClusterError = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file").into();
    assert_eq!(io_err.to_string(), "no such file");
} // end of test_error_display

} // end of mod tests
