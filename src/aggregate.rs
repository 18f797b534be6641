//! Hit aggregation : resolves raw hit identifiers of each query into sequence records.
//!
//! An identifier is looked for in the database first, then in the queries.
//! An identifier found in neither is an integrity error, the run must stop.

use fxhash::FxHashSet;

use crate::errors::ClusterError;
use crate::seqstore::{SeqRecord, SeqStore};


/// set of hit identifiers of one query
pub type HitSet = FxHashSet<String>;


/// Resolved hits of each query, indexed by query rank.
/// Records of one query are deduplicated and kept in order of first appearance in search output.
pub struct ResolvedHits<'a> {
    queries : &'a SeqStore,
    hits : Vec<Vec<&'a SeqRecord>>,
    /// number of distinct raw hit sets, before clustering
    nb_distinct_hit_sets : usize,
}


impl <'a> ResolvedHits<'a> {

    pub fn get_nb_queries(&self) -> usize {
        self.hits.len()
    }

    /// query record of rank
    pub fn get_query(&self, rank : usize) -> &'a SeqRecord {
        &self.queries.records()[rank]
    }

    /// hit records of query of rank
    pub fn get_hits(&self, rank : usize) -> &[&'a SeqRecord] {
        &self.hits[rank]
    }

    /// Number of distinct hit identifier sets over all queries.
    /// Diagnostic only, clustering does not use it.
    pub fn get_nb_distinct_hit_sets(&self) -> usize {
        self.nb_distinct_hit_sets
    }

    /// the hit sets with records stripped, indexed by query rank
    pub fn hit_sets(&self) -> Vec<HitSet> {
        self.hits.iter().map(|h| h.iter().map(|r| r.get_id().to_string()).collect()).collect()
    }

} // end of impl ResolvedHits



/// resolves hits against the database and query collections
pub struct HitAggregator<'a> {
    corpus : &'a SeqStore,
    queries : &'a SeqStore,
}


impl <'a> HitAggregator<'a> {

    pub fn new(corpus : &'a SeqStore, queries : &'a SeqStore) -> Self {
        HitAggregator{corpus, queries}
    }

    fn lookup(&self, id : &str) -> Option<&'a SeqRecord> {
        self.corpus.get(id).or_else(|| self.queries.get(id))
    }


    /// raw_hits is indexed by query rank in the query store
    pub fn resolve(&self, raw_hits : &[Vec<String>]) -> Result<ResolvedHits<'a>, ClusterError> {
        if raw_hits.len() != self.queries.len() {
            log::error!("got {} hit lists for {} queries", raw_hits.len(), self.queries.len());
            return Err(ClusterError::MalformedInputError(format!("{} hit lists for {} queries", raw_hits.len(), self.queries.len())));
        }
        //
        let mut distinct = FxHashSet::<Vec<&str>>::default();
        // each query without hit is a singleton cluster, so each empty set is counted on its own
        let mut nb_empty = 0;
        let mut hits = Vec::<Vec<&'a SeqRecord>>::with_capacity(raw_hits.len());
        for (rank, raw) in raw_hits.iter().enumerate() {
            let query_id = self.queries.records()[rank].get_id();
            let mut seen = FxHashSet::<&str>::default();
            let mut records = Vec::<&'a SeqRecord>::with_capacity(raw.len());
            for hit in raw {
                if !seen.insert(hit.as_str()) {
                    continue;
                }
                let record = self.lookup(hit).ok_or_else(|| {
                    log::error!("query {} : hit {} not found", query_id, hit);
                    ClusterError::IntegrityError{query : query_id.to_string(), hit : hit.clone()}
                })?;
                records.push(record);
            }
            if seen.is_empty() {
                nb_empty += 1;
            }
            else {
                let mut key : Vec<&str> = seen.into_iter().collect();
                key.sort_unstable();
                distinct.insert(key);
            }
            log::debug!("query {} resolved {} distinct hits", query_id, records.len());
            hits.push(records);
        }
        let nb_distinct_hit_sets = distinct.len() + nb_empty;
        log::info!("nb distinct hit sets : {} ({} empty)", nb_distinct_hit_sets, nb_empty);
        //
        Ok(ResolvedHits{queries : self.queries, hits, nb_distinct_hit_sets})
    } // end of resolve

} // end of impl HitAggregator



#[cfg(test)]
mod tests {

use super::*;

use crate::seqstore::SeqSource;

fn log_init_test() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn stores() -> (SeqStore, SeqStore) {
    let corpus = SeqStore::from_records(vec![
        SeqRecord::new("h1", b"MKA", SeqSource::Corpus),
        SeqRecord::new("h2", b"MKB", SeqSource::Corpus),
        SeqRecord::new("q1", b"CORPUSVERSION", SeqSource::Corpus),
    ], SeqSource::Corpus).unwrap();
    let queries = SeqStore::from_records(vec![
        SeqRecord::new("q1", b"MQ1", SeqSource::Query),
        SeqRecord::new("q2", b"MQ2", SeqSource::Query),
        SeqRecord::new("q3", b"MQ3", SeqSource::Query),
    ], SeqSource::Query).unwrap();
    (corpus, queries)
}

#[test]
fn test_resolve() {
    log_init_test();
    let (corpus, queries) = stores();
    let aggregator = HitAggregator::new(&corpus, &queries);
    let raw = vec![
        vec!["q1".to_string(), "h2".to_string(), "h1".to_string(), "h2".to_string()],
        vec!["h1".to_string(), "h2".to_string(), "q2".to_string(), "q1".to_string()],
        vec![],
    ];
    let resolved = aggregator.resolve(&raw).unwrap();
    assert_eq!(resolved.get_nb_queries(), 3);
    let ids : Vec<&str> = resolved.get_hits(0).iter().map(|r| r.get_id()).collect();
    assert_eq!(ids, vec!["q1", "h2", "h1"]);
    // database record is preferred
    assert_eq!(resolved.get_hits(0)[0].get_source(), SeqSource::Corpus);
    // q2 found in queries
    assert_eq!(resolved.get_hits(1)[2].get_source(), SeqSource::Query);
    assert!(resolved.get_hits(2).is_empty());
    // {q1,h1,h2}, {q1,q2,h1,h2} and the empty set
    assert_eq!(resolved.get_nb_distinct_hit_sets(), 3);
    let sets = resolved.hit_sets();
    assert_eq!(sets[0].len(), 3);
    assert!(sets[2].is_empty());
} // end of test_resolve


#[test]
fn test_identical_sets_counted_once() {
    log_init_test();
    let (corpus, queries) = stores();
    let aggregator = HitAggregator::new(&corpus, &queries);
    let raw = vec![
        vec!["h1".to_string(), "h2".to_string()],
        vec!["h2".to_string(), "h1".to_string(), "h1".to_string()],
        vec!["h1".to_string()],
    ];
    let resolved = aggregator.resolve(&raw).unwrap();
    assert_eq!(resolved.get_nb_distinct_hit_sets(), 2);
}


#[test]
fn test_empty_sets_counted_apart() {
    log_init_test();
    let (corpus, queries) = stores();
    let aggregator = HitAggregator::new(&corpus, &queries);
    // q2 and q3 are singleton clusters, they must not fold into one hit set
    let raw = vec![vec!["h1".to_string()], vec![], vec![]];
    let resolved = aggregator.resolve(&raw).unwrap();
    assert_eq!(resolved.get_nb_distinct_hit_sets(), 3);
}


#[test]
fn test_hit_lists_mismatch() {
    log_init_test();
    let (corpus, queries) = stores();
    let aggregator = HitAggregator::new(&corpus, &queries);
    let raw = vec![vec!["h1".to_string()], vec![]];
    assert!(matches!(aggregator.resolve(&raw), Err(ClusterError::MalformedInputError(_))));
}


#[test]
fn test_unknown_hit() {
    log_init_test();
    let (corpus, queries) = stores();
    let aggregator = HitAggregator::new(&corpus, &queries);
    let raw = vec![vec!["h1".to_string()], vec!["h9".to_string()], vec![]];
    match aggregator.resolve(&raw) {
        Err(ClusterError::IntegrityError{query, hit}) => {
            assert_eq!(query, "q2");
            assert_eq!(hit, "h9");
        }
        _ => panic!("expected integrity error"),
    }
} // end of test_unknown_hit

} // end of mod tests
