//! Sequence store : loads a fasta collection, gives access to records by identifier
//! and writes records back in fasta format.
//!
//! A record identifier is the first whitespace delimited token of the fasta header,
//! the rest of the header is dropped.

use std::io::{Read, Write};
use std::path::Path;

use fxhash::FxHashMap;
use needletail::errors::{ParseError, ParseErrorKind};
use needletail::parser::FastxReader;

use crate::errors::ClusterError;


/// where a record was loaded from
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SeqSource {
    /// reference database searched against
    Corpus,
    /// sequences to cluster
    Query,
}


/// A named sequence. Immutable once loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeqRecord {
    id : String,
    seq : Vec<u8>,
    source : SeqSource,
}

impl SeqRecord {
    pub fn new(id : &str, seq : &[u8], source : SeqSource) -> Self {
        SeqRecord{id : id.to_string(), seq : seq.to_vec(), source}
    }

    pub fn get_id(&self) -> &str {
        &self.id
    }

    pub fn get_seq(&self) -> &[u8] {
        &self.seq
    }

    pub fn get_source(&self) -> SeqSource {
        self.source
    }

    /// dumps record as a 2 lines fasta entry : >id then residues on one line
    pub fn write_fasta<W : Write>(&self, out : &mut W) -> std::io::Result<()> {
        out.write_all(b">")?;
        out.write_all(self.id.as_bytes())?;
        out.write_all(b"\n")?;
        out.write_all(&self.seq)?;
        out.write_all(b"\n")
    } // end of write_fasta
} // end of impl SeqRecord


//============================================================================


/// records of one fasta collection, kept in file order, with an index on identifiers
pub struct SeqStore {
    source : SeqSource,
    records : Vec<SeqRecord>,
    index : FxHashMap<String, usize>,
}


impl SeqStore {

    fn empty(source : SeqSource) -> Self {
        SeqStore{source, records : Vec::new(), index : FxHashMap::default()}
    }

    /// parses a fasta (or fastq, possibly compressed) file
    pub fn from_path(path : &Path, source : SeqSource) -> Result<Self, ClusterError> {
        log::debug!("SeqStore loading file {:?}", path);
        let name = path.display().to_string();
        match needletail::parse_fastx_file(path) {
            Ok(reader) => SeqStore::from_fastx(reader, source, &name),
            Err(e) => SeqStore::empty_or_error(e, source, &name),
        }
    } // end of from_path


    /// parses a fasta collection from a byte stream
    pub fn from_reader<R : Read + Send + 'static>(reader : R, source : SeqSource) -> Result<Self, ClusterError> {
        match needletail::parse_fastx_reader(reader) {
            Ok(reader) => SeqStore::from_fastx(reader, source, "<stream>"),
            Err(e) => SeqStore::empty_or_error(e, source, "<stream>"),
        }
    } // end of from_reader


    // needletail refuses empty input at opening, we accept it as an empty collection.
    fn empty_or_error(e : ParseError, source : SeqSource, name : &str) -> Result<Self, ClusterError> {
        if matches!(e.kind, ParseErrorKind::EmptyFile) {
            log::warn!("empty sequence collection : {}", name);
            return Ok(SeqStore::empty(source));
        }
        if matches!(e.kind, ParseErrorKind::Io) {
            return Err(ClusterError::Io(std::io::Error::new(std::io::ErrorKind::Other, format!("{} : {}", name, e))));
        }
        Err(ClusterError::MalformedInputError(format!("{} : {}", name, e)))
    }


    fn from_fastx(mut reader : Box<dyn FastxReader>, source : SeqSource, name : &str) -> Result<Self, ClusterError> {
        let mut store = SeqStore::empty(source);
        while let Some(record) = reader.next() {
            let seqrec = record.map_err(|e| ClusterError::MalformedInputError(format!("{} : {}", name, e)))?;
            let header = String::from_utf8_lossy(seqrec.id());
            let id = header.split_whitespace().next().unwrap_or("");
            if id.is_empty() {
                return Err(ClusterError::MalformedInputError(format!("{} : record {} has an empty identifier", name, store.records.len() + 1)));
            }
            let seq = seqrec.seq();
            store.push(SeqRecord::new(id, &seq, source), name)?;
        }
        log::info!("loaded {} sequences from {}", store.len(), name);
        Ok(store)
    } // end of from_fastx


    fn push(&mut self, record : SeqRecord, name : &str) -> Result<(), ClusterError> {
        if self.index.contains_key(record.get_id()) {
            return Err(ClusterError::MalformedInputError(format!("{} : duplicated identifier {}", name, record.get_id())));
        }
        self.index.insert(record.get_id().to_string(), self.records.len());
        self.records.push(record);
        Ok(())
    }


    /// builds a store from already decoded records
    pub fn from_records(records : Vec<SeqRecord>, source : SeqSource) -> Result<Self, ClusterError> {
        let mut store = SeqStore::empty(source);
        for record in records {
            store.push(record, "<records>")?;
        }
        Ok(store)
    }

    pub fn get_source(&self) -> SeqSource {
        self.source
    }

    pub fn get(&self, id : &str) -> Option<&SeqRecord> {
        self.index.get(id).map(|&rank| &self.records[rank])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// records in file order
    pub fn records(&self) -> &[SeqRecord] {
        &self.records
    }

} // end of impl SeqStore



//=========================================================================

// end of mod tests
