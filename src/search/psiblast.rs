//! psiblast runner and makeblastdb index builder.
//!
//! Each search writes its query in a private scratch file and gets psiblast tabular output
//! (format 6, columns qseqid sseqid) in another private scratch file.
//! Both are removed whatever the outcome of the search.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use crate::errors::ClusterError;
use crate::seqstore::SeqRecord;
use crate::utils::{sanitize_file_stem, SearchParams};

use super::{parse_hit_table, IndexBuilder, ScratchQuery, SimilaritySearch};


/// suffix of raw search output files kept on request
pub const SEARCH_OUTPUT_SUFFIX : &str = "_psi_blast.out";


/// name of the kept output file of a query.
/// An id that had to be sanitized gets a hash of the raw id appended, so "a|b" and "a_b" do not share a file.
pub fn kept_output_name(id : &str) -> String {
    let stem = sanitize_file_stem(id);
    if stem == id {
        format!("{}{}", stem, SEARCH_OUTPUT_SUFFIX)
    }
    else {
        format!("{}_{:016x}{}", stem, fxhash::hash64(id), SEARCH_OUTPUT_SUFFIX)
    }
} // end of kept_output_name


// last non empty line of stderr, to give a hint on failure
fn stderr_hint(output : &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("").trim().to_string()
}


/// Runs psiblast as a blocking subprocess.
pub struct PsiBlast {
    /// psiblast executable
    program : PathBuf,
    /// thresholds passed to psiblast
    params : SearchParams,
    /// where scratch query and output files are created
    scratch_dir : PathBuf,
    /// if set, raw output of each query is copied there
    keep_dir : Option<PathBuf>,
} // end of struct PsiBlast


impl PsiBlast {
    pub fn new(program : &Path, params : SearchParams, scratch_dir : &Path) -> Self {
        PsiBlast{program : program.to_path_buf(), params, scratch_dir : scratch_dir.to_path_buf(), keep_dir : None}
    }

    /// asks for a copy of raw output of each query in dir
    pub fn keep_output_in(mut self, dir : &Path) -> Self {
        self.keep_dir = Some(dir.to_path_buf());
        self
    }

    pub fn get_params(&self) -> &SearchParams {
        &self.params
    }


    /// the psiblast command for one query file, output file and database
    pub fn command(&self, query_path : &Path, database : &Path, out_path : &Path) -> Command {
        let mut command = Command::new(&self.program);
        command.arg("-query").arg(query_path)
            .arg("-db").arg(database)
            .arg("-evalue").arg(self.params.get_evalue().to_string())
            .arg("-num_iterations").arg(self.params.get_nb_iterations().to_string())
            .arg("-inclusion_ethresh").arg(self.params.get_inclusion_ethresh().to_string())
            .arg("-outfmt").arg("6 qseqid sseqid")
            .arg("-out").arg(out_path);
        command.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::piped());
        command
    } // end of command


    fn run(&self, query : &SeqRecord, scratch : &ScratchQuery, out_path : &Path, database : &Path) -> Result<Vec<String>, ClusterError> {
        let failure = |reason : String| ClusterError::SearchToolFailure{query : query.get_id().to_string(), reason};
        //
        let output = self.command(scratch.path(), database, out_path).output()
                .map_err(|e| failure(format!("cannot launch {:?} : {}", self.program, e)))?;
        if !output.status.success() {
            log::error!("psiblast failed for query {}, {}", query.get_id(), output.status);
            return Err(failure(format!("{} {}", output.status, stderr_hint(&output))));
        }
        let hits = parse_hit_table(BufReader::new(File::open(out_path)?))?;
        log::debug!("query {} got {} hit lines", query.get_id(), hits.len());
        //
        if let Some(keep_dir) = &self.keep_dir {
            let kept = keep_dir.join(kept_output_name(query.get_id()));
            if kept.exists() {
                log::warn!("query {} : overwriting kept output {:?}", query.get_id(), kept);
            }
            std::fs::copy(out_path, &kept)?;
        }
        Ok(hits)
    } // end of run

} // end of impl PsiBlast



impl SimilaritySearch for PsiBlast {

    fn search(&self, query : &SeqRecord, database : &Path) -> Result<Vec<String>, ClusterError> {
        log::debug!("psiblast search for query {}", query.get_id());
        let scratch = ScratchQuery::create(&self.scratch_dir, query)?;
        let out_file = tempfile::Builder::new().prefix("hits_").suffix(".tsv").tempfile_in(&self.scratch_dir)?;
        //
        let res = self.run(query, &scratch, out_file.path(), database);
        // on error both are removed by drop
        if res.is_ok() {
            scratch.close();
            let out_path = out_file.path().to_path_buf();
            if let Err(e) = out_file.close() {
                log::warn!("could not remove search output {:?} : {}", out_path, e);
            }
        }
        res
    } // end of search

} // end of impl SimilaritySearch for PsiBlast


//======================================================================


/// Runs makeblastdb on the combined database.
pub struct MakeBlastDb {
    program : PathBuf,
    /// prot or nucl
    dbtype : String,
}


impl Default for MakeBlastDb {
    fn default() -> Self {
        MakeBlastDb{program : PathBuf::from("makeblastdb"), dbtype : String::from("prot")}
    }
}


impl MakeBlastDb {
    pub fn new(program : &Path, dbtype : &str) -> Self {
        MakeBlastDb{program : program.to_path_buf(), dbtype : dbtype.to_string()}
    }

    pub fn command(&self, database : &Path) -> Command {
        let mut command = Command::new(&self.program);
        command.arg("-in").arg(database).arg("-dbtype").arg(&self.dbtype);
        command.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::piped());
        command
    }
} // end of impl MakeBlastDb


impl IndexBuilder for MakeBlastDb {

    fn build_index(&self, database : &Path) -> Result<(), ClusterError> {
        log::info!("building index of {:?}", database);
        let failure = |reason : String| ClusterError::IndexBuildFailure{path : database.display().to_string(), reason};
        let output = self.command(database).output()
                .map_err(|e| failure(format!("cannot launch {:?} : {}", self.program, e)))?;
        if !output.status.success() {
            log::error!("makeblastdb failed on {:?} : {}", database, output.status);
            return Err(failure(format!("{} {}", output.status, stderr_hint(&output))));
        }
        Ok(())
    } // end of build_index

} // end of impl IndexBuilder for MakeBlastDb



// end of mod tests
