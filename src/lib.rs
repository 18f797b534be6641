//! Groups query protein sequences from the hits psiblast finds for each of them
//! in a database augmented with the queries.
//!
//! Two queries are in the same group if their hit sets intersect, directly or
//! through a chain of queries. Each group gives a fasta file with all hits of its queries.
//!
//! - [seqstore] : fasta loading and dumping
//! - [search] : the external search tool and database indexing
//! - [scheduler] : one search job by query on a bounded thread pool
//! - [aggregate] : resolution of hit identifiers into sequences
//! - [unionfind] : grouping of queries
//! - [assemble] : group files
//! - [pipeline] : the whole run

pub mod errors;
pub mod utils;
pub mod seqstore;
pub mod search;
pub mod scheduler;
pub mod aggregate;
pub mod unionfind;
pub mod assemble;
pub mod pipeline;

pub use errors::ClusterError;
