//! Output assembly : one fasta file by group of queries.
//!
//! A group file holds the union of hits of the group members, each hit identifier once
//! (first occurrence wins, members visited by increasing rank).
//! Groups are named group1, group2 ... in the order of the partition.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use fxhash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::aggregate::ResolvedHits;
use crate::errors::ClusterError;
use crate::unionfind::Partition;


/// name of the json summary of groups
pub const GROUPS_SUMMARY : &str = "groups.json";


/// summary of one group file
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub name : String,
    pub queries : Vec<String>,
    pub nb_hits : usize,
}


/// run level diagnostics and what was written
#[derive(Clone, Debug)]
pub struct ClusterReport {
    /// distinct raw hit sets before clustering
    pub nb_distinct_hit_sets : usize,
    /// groups after union find
    pub nb_groups : usize,
    pub files : Vec<PathBuf>,
    pub groups : Vec<GroupSummary>,
}


impl ClusterReport {
    /// dumps the 2 counters
    pub fn write_diagnostics(&self, out : &mut dyn Write) -> std::io::Result<()> {
        writeln!(out, "Number of unique groups based on initial BLAST hits: {}", self.nb_distinct_hit_sets)?;
        writeln!(out, "Number of groups after applying Union-Find: {}", self.nb_groups)?;
        out.flush()
    }
} // end of impl ClusterReport



pub struct OutputAssembler {
    group_dir : PathBuf,
}


impl OutputAssembler {

    /// creates group_dir if needed
    pub fn new(group_dir : &Path) -> Result<Self, ClusterError> {
        std::fs::create_dir_all(group_dir)?;
        Ok(OutputAssembler{group_dir : group_dir.to_path_buf()})
    }

    pub fn get_group_dir(&self) -> &Path {
        &self.group_dir
    }


    /// writes one file by group, then the json summary
    pub fn write(&self, resolved : &ResolvedHits, partition : &Partition) -> Result<ClusterReport, ClusterError> {
        let mut files = Vec::<PathBuf>::with_capacity(partition.get_nb_groups());
        let mut groups = Vec::<GroupSummary>::with_capacity(partition.get_nb_groups());
        //
        for (num, members) in partition.groups().iter().enumerate() {
            let name = format!("group{}", num + 1);
            let path = self.group_dir.join(format!("{}.fasta", name));
            let mut out = BufWriter::new(File::create(&path)?);
            let mut written = FxHashSet::<&str>::default();
            for &rank in members {
                for record in resolved.get_hits(rank) {
                    if written.insert(record.get_id()) {
                        record.write_fasta(&mut out)?;
                    }
                }
            }
            out.flush()?;
            log::debug!("{} : {} queries, {} hits", name, members.len(), written.len());
            let queries = members.iter().map(|&rank| resolved.get_query(rank).get_id().to_string()).collect();
            groups.push(GroupSummary{name, queries, nb_hits : written.len()});
            files.push(path);
        }
        //
        let summary_path = self.group_dir.join(GROUPS_SUMMARY);
        let mut writer = BufWriter::new(File::create(&summary_path)?);
        serde_json::to_writer_pretty(&mut writer, &groups).map_err(std::io::Error::from)?;
        writer.flush()?;
        log::info!("dumped {} group files in {:?}", files.len(), self.group_dir);
        //
        Ok(ClusterReport{nb_distinct_hit_sets : resolved.get_nb_distinct_hit_sets(), nb_groups : partition.get_nb_groups(), files, groups})
    } // end of write

} // end of impl OutputAssembler



// end of mod tests
