//! Job scheduler : one search job by query, run on a pool of nb_workers threads.
//!
//! Jobs report on a channel, results are gathered by the calling thread once all jobs are done,
//! so the aggregation has a single writer. The end of the pool scope is the barrier before clustering.
//! The first failing job raises an abort flag, jobs not yet started then report
//! [JobOutcome::Cancelled] without running the search tool.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::SystemTime;

use cpu_time::ProcessTime;

use crate::errors::ClusterError;
use crate::search::SimilaritySearch;
use crate::seqstore::SeqRecord;


/// what a job reports
#[derive(Debug)]
pub enum JobOutcome {
    /// raw hit identifiers returned by the search tool
    Hits(Vec<String>),
    Failed(ClusterError),
    /// not run because another job failed before it started
    Cancelled,
}


// message sent from a job to the collecting thread
struct JobMsg {
    rank : usize,
    outcome : JobOutcome,
}


pub struct JobScheduler {
    nb_workers : usize,
    /// number of jobs run (not cancelled)
    nb_run : AtomicUsize,
}


impl JobScheduler {

    pub fn new(nb_workers : usize) -> Result<Self, ClusterError> {
        if nb_workers == 0 {
            return Err(ClusterError::MalformedInputError("scheduler needs at least one worker".to_string()));
        }
        Ok(JobScheduler{nb_workers, nb_run : AtomicUsize::new(0)})
    }

    pub fn get_nb_workers(&self) -> usize {
        self.nb_workers
    }

    /// number of search tool invocations done by last call to run_all
    pub fn get_nb_run(&self) -> usize {
        self.nb_run.load(Ordering::Acquire)
    }


    /// runs one search by query, blocks until every job has reported.
    /// The returned vector is indexed by query rank, whatever the completion order.
    pub fn run_all<S>(&self, search : &S, queries : &[SeqRecord], database : &Path) -> Result<Vec<JobOutcome>, ClusterError>
            where S : SimilaritySearch + ?Sized {
        //
        log::info!("JobScheduler dispatching {} queries on {} workers", queries.len(), self.nb_workers);
        let start_t = SystemTime::now();
        let cpu_start = ProcessTime::now();
        self.nb_run.store(0, Ordering::Release);
        //
        let pool = rayon::ThreadPoolBuilder::new().num_threads(self.nb_workers).build()
                .map_err(|e| ClusterError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?;
        let (sender, receiver) = crossbeam_channel::unbounded::<JobMsg>();
        let abort = AtomicBool::new(false);
        let abort_ref = &abort;
        let nb_run_ref = &self.nb_run;
        //
        pool.scope(|scope| {
            for (rank, query) in queries.iter().enumerate() {
                let sender = sender.clone();
                scope.spawn(move |_| {
                    let outcome = if abort_ref.load(Ordering::Acquire) {
                        log::debug!("query {} cancelled", query.get_id());
                        JobOutcome::Cancelled
                    }
                    else {
                        nb_run_ref.fetch_add(1, Ordering::AcqRel);
                        log::info!("Processing {}", query.get_id());
                        match search.search(query, database) {
                            Ok(hits) => JobOutcome::Hits(hits),
                            Err(e) => {
                                log::error!("search failed for query {} : {}", query.get_id(), e);
                                abort_ref.store(true, Ordering::Release);
                                JobOutcome::Failed(e)
                            }
                        }
                    };
                    // receiver lives until after the scope
                    let _ = sender.send(JobMsg{rank, outcome});
                });
            }
        }); // end of pool scope
        drop(sender);
        //
        let mut outcomes : Vec<Option<JobOutcome>> = (0..queries.len()).map(|_| None).collect();
        for msg in receiver.iter() {
            outcomes[msg.rank] = Some(msg.outcome);
        }
        //
        let cpu_time = cpu_start.elapsed().as_secs();
        let elapsed_t = start_t.elapsed().map(|d| d.as_secs_f32()).unwrap_or(0.);
        log::info!("search jobs done, nb run : {}, elapsed time(s) {:.3}, process cpu time(s) {}", self.get_nb_run(), elapsed_t, cpu_time);
        //
        outcomes.into_iter().enumerate().map(|(rank, o)| {
            o.ok_or_else(|| ClusterError::SearchToolFailure{query : queries[rank].get_id().to_string(), reason : "job did not report".to_string()})
        }).collect()
    } // end of run_all


    /// the decision point of the run : any failed job fails the whole run.
    /// Returns hit lists indexed by query rank.
    pub fn reconcile(outcomes : Vec<JobOutcome>, queries : &[SeqRecord]) -> Result<Vec<Vec<String>>, ClusterError> {
        if outcomes.len() != queries.len() {
            log::error!("got {} outcomes for {} queries", outcomes.len(), queries.len());
            return Err(ClusterError::MalformedInputError(format!("{} job outcomes for {} queries", outcomes.len(), queries.len())));
        }
        let mut hits = Vec::<Vec<String>>::with_capacity(outcomes.len());
        let mut nb_cancelled = 0;
        let mut first_failure : Option<ClusterError> = None;
        for outcome in outcomes {
            match outcome {
                JobOutcome::Hits(h) => hits.push(h),
                JobOutcome::Cancelled => nb_cancelled += 1,
                JobOutcome::Failed(e) => {
                    if first_failure.is_none() {
                        first_failure = Some(e);
                    }
                }
            }
        }
        if let Some(e) = first_failure {
            log::error!("aborting run, {} jobs cancelled", nb_cancelled);
            return Err(e);
        }
        if nb_cancelled > 0 {
            return Err(ClusterError::SearchToolFailure{query : String::from("*"), reason : format!("{} jobs cancelled", nb_cancelled)});
        }
        Ok(hits)
    } // end of reconcile


    /// run_all then reconcile
    pub fn run<S>(&self, search : &S, queries : &[SeqRecord], database : &Path) -> Result<Vec<Vec<String>>, ClusterError>
            where S : SimilaritySearch + ?Sized {
        let outcomes = self.run_all(search, queries, database)?;
        JobScheduler::reconcile(outcomes, queries)
    }

} // end of impl JobScheduler



#[cfg(test)]
mod tests {

use super::*;

use std::time::Duration;

use crate::seqstore::SeqSource;

fn log_init_test() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// returns its own id as hit, sleeps longer for first queries so completion order is reversed,
// records the max number of simultaneous searches
struct SlowSearch {
    running : AtomicUsize,
    max_running : AtomicUsize,
    nb_queries : usize,
    fail_on : Option<String>,
    fail_all : bool,
}

impl SlowSearch {
    fn new(nb_queries : usize, fail_on : Option<&str>) -> Self {
        SlowSearch{running : AtomicUsize::new(0), max_running : AtomicUsize::new(0), nb_queries, fail_on : fail_on.map(|s| s.to_string()), fail_all : false}
    }

    fn failing(nb_queries : usize) -> Self {
        SlowSearch{fail_all : true, ..SlowSearch::new(nb_queries, None)}
    }
}

impl SimilaritySearch for SlowSearch {
    fn search(&self, query : &SeqRecord, _database : &Path) -> Result<Vec<String>, ClusterError> {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(now, Ordering::SeqCst);
        let rank : usize = query.get_id()[1..].parse().unwrap();
        std::thread::sleep(Duration::from_millis(2 * (self.nb_queries - rank) as u64));
        self.running.fetch_sub(1, Ordering::SeqCst);
        if self.fail_all || self.fail_on.as_deref() == Some(query.get_id()) {
            return Err(ClusterError::SearchToolFailure{query : query.get_id().to_string(), reason : "exit status: 1".to_string()});
        }
        Ok(vec![query.get_id().to_string()])
    }
}

fn make_queries(n : usize) -> Vec<SeqRecord> {
    (0..n).map(|i| SeqRecord::new(&format!("q{}", i), b"MKVL", SeqSource::Query)).collect()
}


#[test]
fn test_every_query_once_bounded() {
    log_init_test();
    let queries = make_queries(24);
    let search = SlowSearch::new(queries.len(), None);
    let scheduler = JobScheduler::new(3).unwrap();
    let hits = scheduler.run(&search, &queries, Path::new("db.fasta")).unwrap();
    assert_eq!(hits.len(), queries.len());
    for (rank, h) in hits.iter().enumerate() {
        assert_eq!(h, &vec![format!("q{}", rank)]);
    }
    assert_eq!(scheduler.get_nb_run(), queries.len());
    let max_running = search.max_running.load(Ordering::SeqCst);
    log::debug!("max running : {}", max_running);
    assert!(max_running <= 3 && max_running >= 1);
} // end of test_every_query_once_bounded


#[test]
fn test_single_worker() {
    log_init_test();
    let queries = make_queries(5);
    let search = SlowSearch::new(queries.len(), None);
    let scheduler = JobScheduler::new(1).unwrap();
    let hits = scheduler.run(&search, &queries, Path::new("db.fasta")).unwrap();
    assert_eq!(hits.len(), 5);
    assert_eq!(search.max_running.load(Ordering::SeqCst), 1);
}


#[test]
fn test_failure_is_fatal() {
    log_init_test();
    let queries = make_queries(12);
    let search = SlowSearch::new(queries.len(), Some("q4"));
    let scheduler = JobScheduler::new(2).unwrap();
    let outcomes = scheduler.run_all(&search, &queries, Path::new("db.fasta")).unwrap();
    // exactly one outcome by query
    assert_eq!(outcomes.len(), queries.len());
    assert!(matches!(outcomes[4], JobOutcome::Failed(_)));
    let err = JobScheduler::reconcile(outcomes, &queries).unwrap_err();
    match err {
        ClusterError::SearchToolFailure{query, ..} => assert_eq!(query, "q4"),
        _ => panic!("unexpected error {:?}", err),
    }
} // end of test_failure_is_fatal


#[test]
fn test_jobs_after_failure_cancelled() {
    log_init_test();
    let queries = make_queries(6);
    // every search fails : with one worker, the first job run fails and all later ones see the abort flag
    let search = SlowSearch::failing(queries.len());
    let scheduler = JobScheduler::new(1).unwrap();
    let outcomes = scheduler.run_all(&search, &queries, Path::new("db.fasta")).unwrap();
    assert_eq!(outcomes.len(), queries.len());
    assert_eq!(scheduler.get_nb_run(), 1);
    let nb_failed = outcomes.iter().filter(|o| matches!(o, JobOutcome::Failed(_))).count();
    let nb_cancelled = outcomes.iter().filter(|o| matches!(o, JobOutcome::Cancelled)).count();
    assert_eq!(nb_failed, 1);
    assert_eq!(nb_cancelled, queries.len() - 1);
    assert!(matches!(JobScheduler::reconcile(outcomes, &queries), Err(ClusterError::SearchToolFailure{..})));
} // end of test_jobs_after_failure_cancelled


#[test]
fn test_reconcile_cancelled_only() {
    log_init_test();
    let queries = make_queries(2);
    let outcomes = vec![JobOutcome::Hits(vec!["q0".to_string()]), JobOutcome::Cancelled];
    match JobScheduler::reconcile(outcomes, &queries) {
        Err(ClusterError::SearchToolFailure{query, reason}) => {
            assert_eq!(query, "*");
            assert!(reason.contains("1 jobs cancelled"));
        }
        other => panic!("expected search failure, got {:?}", other),
    }
}


#[test]
fn test_reconcile_mismatch() {
    let queries = make_queries(3);
    let outcomes = vec![JobOutcome::Hits(vec![]), JobOutcome::Hits(vec![])];
    assert!(matches!(JobScheduler::reconcile(outcomes, &queries), Err(ClusterError::MalformedInputError(_))));
}


#[test]
fn test_no_worker() {
    assert!(matches!(JobScheduler::new(0), Err(ClusterError::MalformedInputError(_))));
}

} // end of mod tests
