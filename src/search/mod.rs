//! Seams to the external homology search tool.
//!
//! A [SimilaritySearch] runs one query against the combined database and returns the identifiers
//! of the hits, an [IndexBuilder] indexes the combined database once before any search.
//! Both are blocking calls.

use std::io::{Read, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::errors::ClusterError;
use crate::seqstore::SeqRecord;

pub mod psiblast;

pub use psiblast::{MakeBlastDb, PsiBlast};


/// search of one query against a database. Implementations are shared between workers.
pub trait SimilaritySearch : Send + Sync {
    /// returns hit identifiers, in order of appearance in tool output, possibly with repetitions.
    fn search(&self, query : &SeqRecord, database : &Path) -> Result<Vec<String>, ClusterError>;
}


/// builds the searchable index of a fasta database.
pub trait IndexBuilder {
    fn build_index(&self, database : &Path) -> Result<(), ClusterError>;
}


//=====================================================================================


/// A fasta file holding one query, private to one search job.
/// The name is chosen with exclusive creation and a random suffix so concurrent jobs
/// in the same directory never share a file. The file is removed when dropped.
pub struct ScratchQuery {
    file : NamedTempFile,
}


impl ScratchQuery {
    /// dumps record in a new scratch file inside dir
    pub fn create(dir : &Path, record : &SeqRecord) -> Result<Self, ClusterError> {
        let mut file = tempfile::Builder::new().prefix("query_").suffix(".fasta").tempfile_in(dir)?;
        record.write_fasta(file.as_file_mut())?;
        file.as_file_mut().flush()?;
        log::trace!("scratch file {:?} for query {}", file.path(), record.get_id());
        Ok(ScratchQuery{file})
    } // end of create

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// removes the file. A failure is only logged, it must not change the outcome of the job.
    pub fn close(self) {
        let path = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            log::warn!("could not remove scratch file {:?} : {}", path, e);
        }
    }
} // end of impl ScratchQuery


//=====================================================================================


/// decodes a tabular search output with query id and subject id as 2 first columns.
/// Lines with less than 2 fields (blank lines, iteration messages) are skipped.
pub fn parse_hit_table<R : Read>(reader : R) -> Result<Vec<String>, ClusterError> {
    let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(reader);
    let mut hits = Vec::<String>::new();
    for record in csv_reader.records() {
        let record = record.map_err(|e| ClusterError::MalformedInputError(format!("bad hit table line : {}", e)))?;
        if let Some(hit) = record.get(1) {
            let hit = hit.trim();
            if !hit.is_empty() {
                hits.push(hit.to_string());
            }
        }
    }
    Ok(hits)
} // end of parse_hit_table



// end of mod tests
