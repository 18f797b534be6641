//! A clustering run from fasta files to group files.
//!
//! 1. parameters and both fasta collections are checked before any work.
//! 2. database and queries are concatenated in a temporary directory created in the output directory
//!    and indexed once.
//! 3. one search job by query, all must succeed.
//! 4. hits are resolved, queries grouped by union find, one fasta file dumped by group.
//!
//! The temporary directory is removed at the end of the run whatever the outcome.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::aggregate::HitAggregator;
use crate::assemble::{ClusterReport, OutputAssembler};
use crate::errors::ClusterError;
use crate::scheduler::JobScheduler;
use crate::search::{IndexBuilder, SimilaritySearch};
use crate::seqstore::{SeqSource, SeqStore};
use crate::unionfind::group_queries;
use crate::utils::ClusterParams;


/// directory receiving group files, under output directory
pub const GROUP_DIR : &str = "group_files";
/// directory receiving raw search outputs if asked for, under output directory
pub const SEARCH_OUTPUT_DIR : &str = "blast_out_files";
/// name of the combined database in the temporary directory
pub const COMBINED_DB : &str = "temp_db.fasta";


/// input files and output directory of a run
#[derive(Clone, Debug)]
pub struct ClusterInputs {
    pub query_path : PathBuf,
    pub database_path : PathBuf,
    pub outdir : PathBuf,
}


/// directories a search tool must use during a run
pub struct RunLayout {
    /// private temporary directory of the run, for scratch files
    pub work_dir : PathBuf,
    /// where to copy raw search output, if asked for
    pub search_output_dir : Option<PathBuf>,
}


// dumps database records then query records in one fasta file
fn write_combined_database(path : &Path, corpus : &SeqStore, queries : &SeqStore) -> Result<(), ClusterError> {
    let mut out = BufWriter::new(File::create(path)?);
    for record in corpus.records().iter().chain(queries.records().iter()) {
        record.write_fasta(&mut out)?;
    }
    out.flush()?;
    log::info!("combined database {:?} : {} sequences", path, corpus.len() + queries.len());
    Ok(())
} // end of write_combined_database



/// Runs the whole clustering. make_search receives the run layout and returns the search tool to use.
/// The two diagnostics counters are written to report.
pub fn run_clustering<I, F, S>(params : &ClusterParams, inputs : &ClusterInputs, index_builder : &I, make_search : F,
                        report : &mut dyn Write) -> Result<ClusterReport, ClusterError>
        where I : IndexBuilder + ?Sized,
              F : FnOnce(&RunLayout) -> S,
              S : SimilaritySearch {
    //
    params.validate()?;
    let queries = SeqStore::from_path(&inputs.query_path, SeqSource::Query)?;
    let corpus = SeqStore::from_path(&inputs.database_path, SeqSource::Corpus)?;
    //
    std::fs::create_dir_all(&inputs.outdir)?;
    let work_dir = tempfile::Builder::new().prefix("tmp_").tempdir_in(&inputs.outdir)?;
    log::debug!("run temporary directory {:?}", work_dir.path());
    let combined = work_dir.path().join(COMBINED_DB);
    write_combined_database(&combined, &corpus, &queries)?;
    index_builder.build_index(&combined)?;
    params.dump_json(&inputs.outdir)?;
    //
    let search_output_dir = if params.keep_search_output() {
        let dir = inputs.outdir.join(SEARCH_OUTPUT_DIR);
        std::fs::create_dir_all(&dir)?;
        Some(dir)
    } else {
        None
    };
    let layout = RunLayout{work_dir : work_dir.path().to_path_buf(), search_output_dir};
    let search = make_search(&layout);
    //
    let scheduler = JobScheduler::new(params.get_nb_workers())?;
    let raw_hits = scheduler.run(&search, queries.records(), &combined)?;
    // all jobs are done, we can cluster
    let resolved = HitAggregator::new(&corpus, &queries).resolve(&raw_hits)?;
    let partition = group_queries(&resolved.hit_sets());
    let assembler = OutputAssembler::new(&inputs.outdir.join(GROUP_DIR))?;
    let cluster_report = assembler.write(&resolved, &partition)?;
    cluster_report.write_diagnostics(report)?;
    //
    let work_path = work_dir.path().to_path_buf();
    if let Err(e) = work_dir.close() {
        log::warn!("could not remove temporary directory {:?} : {}", work_path, e);
    }
    Ok(cluster_report)
} // end of run_clustering
