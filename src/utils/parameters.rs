//! structures related to processing parameters


use std::fs::OpenOptions;
use std::path::Path;
use std::io::{BufReader, BufWriter};

use serde::{Deserialize, Serialize};

use crate::errors::ClusterError;


/// default number of searches running simultaneously
pub const DEFAULT_NB_WORKERS : usize = 4;

/// name of parameters dump in output directory
pub const PARAMETERS_DUMP : &str = "parameters.json";


/// parameters passed unmodified to the search tool.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    /// e-value threshold for a hit to be reported
    evalue : f64,
    /// e-value threshold for inclusion in the profile at each iteration
    inclusion_ethresh : f64,
    /// number of search iterations
    nb_iterations : usize,
} // end of struct SearchParams


impl Default for SearchParams {
    fn default() -> Self {
        SearchParams{evalue : 1.0e-3, inclusion_ethresh : 1.0e-3, nb_iterations : 3}
    }
} // end of default for SearchParams


impl SearchParams {
    pub fn new(evalue : f64, inclusion_ethresh : f64, nb_iterations : usize) -> Self {
        SearchParams{evalue, inclusion_ethresh, nb_iterations}
    }

    pub fn get_evalue(&self) -> f64 {
        self.evalue
    }

    pub fn get_inclusion_ethresh(&self) -> f64 {
        self.inclusion_ethresh
    }

    pub fn get_nb_iterations(&self) -> usize {
        self.nb_iterations
    }

    /// thresholds must be finite and strictly positive, at least one iteration
    pub fn validate(&self) -> Result<(), ClusterError> {
        if !(self.evalue.is_finite() && self.evalue > 0.) {
            return Err(ClusterError::MalformedInputError(format!("evalue must be positive, got {}", self.evalue)));
        }
        if !(self.inclusion_ethresh.is_finite() && self.inclusion_ethresh > 0.) {
            return Err(ClusterError::MalformedInputError(format!("inclusion threshold must be positive, got {}", self.inclusion_ethresh)));
        }
        if self.nb_iterations == 0 {
            return Err(ClusterError::MalformedInputError("number of iterations must be at least 1".to_string()));
        }
        Ok(())
    } // end of validate
}  // end of impl block SearchParams


//=========================================================================================

/// Gathers parameters of a clustering run.
/// Dumped in output directory to keep track of how group files were obtained.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClusterParams {
    /// number of search jobs running simultaneously
    nb_workers : usize,
    /// search tool parameters
    search : SearchParams,
    /// do we keep raw search output of each query
    keep_search_output : bool,
}  // end of ClusterParams


impl Default for ClusterParams {
    fn default() -> Self {
        ClusterParams{nb_workers : DEFAULT_NB_WORKERS, search : SearchParams::default(), keep_search_output : false}
    }
}


impl ClusterParams {

    pub fn new(nb_workers : usize, search : SearchParams, keep_search_output : bool) -> Self {
        ClusterParams{nb_workers, search, keep_search_output}
    }

    pub fn get_nb_workers(&self) -> usize {
        self.nb_workers
    }

    pub fn get_search_params(&self) -> &SearchParams {
        &self.search
    }

    pub fn keep_search_output(&self) -> bool {
        self.keep_search_output
    }

    /// checks parameters before any work begins
    pub fn validate(&self) -> Result<(), ClusterError> {
        if self.nb_workers == 0 {
            return Err(ClusterError::MalformedInputError("number of workers must be at least 1".to_string()));
        }
        let nb_cpus = num_cpus::get();
        if self.nb_workers > nb_cpus {
            log::warn!("asked for {} workers, only {} cpus available", self.nb_workers, nb_cpus);
        }
        self.search.validate()
    } // end of validate


    pub fn dump_json(&self, dirpath : &Path) -> Result<(), ClusterError> {
        //
        let filepath = dirpath.join(PARAMETERS_DUMP);
        //
        log::info!("dumping ClusterParams in json file : {:?}", filepath);
        //
        let file = OpenOptions::new().write(true).create(true).truncate(true).open(&filepath).map_err(|e| {
            log::error!("ClusterParams dump : dump could not open file {:?}", filepath.as_os_str());
            e
        })?;
        //
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &self).map_err(std::io::Error::from)?;
        //
        Ok(())
    } // end of dump_json


    /// reload from a json dump.
    pub fn reload_json(dirpath : &Path) -> Result<Self, ClusterError> {
        log::info!("in reload_json");
        //
        let filepath = dirpath.join(PARAMETERS_DUMP);
        let file = OpenOptions::new().read(true).open(&filepath).map_err(|e| {
            log::error!("ClusterParams reload_json : reload could not open file {:?}", filepath.as_os_str());
            e
        })?;
        //
        let reader = BufReader::new(file);
        let params : Self = serde_json::from_reader(reader)
                .map_err(|e| ClusterError::MalformedInputError(format!("cannot decode {:?} : {}", filepath, e)))?;
        //
        log::info!("ClusterParams reload, nb workers : {}", params.nb_workers);
        //
        Ok(params)
    } // end of reload_json

} // end of impl ClusterParams


//=====================================================================================


#[cfg(test)]
mod tests {

use super::*;

fn log_init_test() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_default_is_valid() {
    log_init_test();
    let params = ClusterParams::default();
    assert_eq!(params.get_nb_workers(), DEFAULT_NB_WORKERS);
    assert_eq!(params.get_search_params().get_nb_iterations(), 3);
    assert!(params.validate().is_ok());
}


#[test]
fn test_reject_bad_values() {
    log_init_test();
    let bad_workers = ClusterParams::new(0, SearchParams::default(), false);
    assert!(matches!(bad_workers.validate(), Err(ClusterError::MalformedInputError(_))));
    //
    for search in [SearchParams::new(0., 1e-3, 3), SearchParams::new(1e-3, -1., 3),
                   SearchParams::new(f64::NAN, 1e-3, 3), SearchParams::new(1e-3, 1e-3, 0)] {
        let params = ClusterParams::new(2, search, false);
        assert!(matches!(params.validate(), Err(ClusterError::MalformedInputError(_))));
    }
} // end of test_reject_bad_values


#[test]
fn test_dump_reload() {
    log_init_test();
    let dir = tempfile::tempdir().unwrap();
    let params = ClusterParams::new(7, SearchParams::new(1e-5, 2e-3, 5), true);
    params.dump_json(dir.path()).unwrap();
    let reloaded = ClusterParams::reload_json(dir.path()).unwrap();
    assert_eq!(params, reloaded);
    //
    let empty = tempfile::tempdir().unwrap();
    assert!(ClusterParams::reload_json(empty.path()).is_err());
} // end of test_dump_reload

} // end of mod tests
