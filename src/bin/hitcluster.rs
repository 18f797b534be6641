// HITCLUSTER v0.1.0
// Licensed under the MIT license (http://opensource.org/licenses/MIT).
// This file may not be copied, modified, or distributed except according to those terms.


//! hitcluster --fasta [-f] queries.fasta --database [-d] db.fasta [--outdir [-o] dir] [--threads [-t] n]
//!
//! --fasta : fasta file of query protein sequences to group. Mandatory.
//!
//! --database : fasta file of the reference database. Queries are appended to it before indexing
//!     so that queries can hit each other. Mandatory.
//!
//! --outdir : output directory, default to current directory. Group files are dumped in outdir/group_files.
//!
//! --threads : number of psiblast runs in parallel (default 4).
//!
//! --evalue , --inclusion, --iterations : psiblast -evalue , -inclusion_ethresh and -num_iterations.
//!     Defaults are 1e-3, 1e-3 and 3.
//!
//! --keep-blast : keep raw psiblast output of each query in outdir/blast_out_files
//!
//! --psiblast , --makeblastdb : path to the blast+ programs if not in PATH.
//!
//! The program exits with a non zero code as soon as database indexing or any psiblast run fails.

use clap::{Arg, ArgAction, Command};

use std::path::PathBuf;

// for logging (debug mostly, switched at compile time in cargo.toml)
use env_logger::Builder;

use hitcluster::pipeline::{run_clustering, ClusterInputs};
use hitcluster::search::{MakeBlastDb, PsiBlast};
use hitcluster::utils::*;


// install a logger facility
pub fn init_log() -> u64 {
    Builder::from_default_env().init();
    println!("\n ************** initializing logger *****************\n");
    1
}


fn main() -> Result<(), anyhow::Error> {
    let _ = init_log();
    let start_t = chrono::Local::now();
    log::info!("\n hitcluster begins at time:{:#?} \n ", start_t);
    //
    let matches = Command::new("hitcluster")
        .arg_required_else_help(true)
        .version("0.1.0")
        .about("Groups query sequences sharing psiblast hits, dumps one fasta file by group")
        .arg(
            Arg::new("fasta")
                .short('f')
                .long("fasta")
                .value_name("FILE")
                .help("Input fasta file of queries")
                .required(true)
                .value_parser(clap::value_parser!(String)),
        )
        .arg(
            Arg::new("database")
                .short('d')
                .long("database")
                .value_name("FILE")
                .help("Database in fasta format")
                .required(true)
                .value_parser(clap::value_parser!(String)),
        )
        .arg(
            Arg::new("outdir")
                .short('o')
                .long("outdir")
                .value_name("DIR")
                .help("Output directory for blast and group files")
                .default_value(".")
                .value_parser(clap::value_parser!(String)),
        )
        .arg(
            Arg::new("threads")
                .short('t')
                .long("threads")
                .help("Number of psiblast runs in parallel")
                .default_value("4")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("evalue")
                .long("evalue")
                .help("psiblast evalue threshold")
                .default_value("1e-3")
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(
            Arg::new("inclusion")
                .long("inclusion")
                .help("psiblast evalue inclusion threshold at each iteration")
                .default_value("1e-3")
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(
            Arg::new("iterations")
                .long("iterations")
                .help("psiblast number of iterations")
                .default_value("3")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("keep_blast")
                .long("keep-blast")
                .help("keep raw psiblast output of each query")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("psiblast")
                .long("psiblast")
                .help("psiblast program")
                .default_value("psiblast")
                .value_parser(clap::value_parser!(String)),
        )
        .arg(
            Arg::new("makeblastdb")
                .long("makeblastdb")
                .help("makeblastdb program")
                .default_value("makeblastdb")
                .value_parser(clap::value_parser!(String)),
        )
        .get_matches();
    //
    // arguments with a default value or required are always present
    let get_string = |name : &str| matches.get_one::<String>(name).cloned().unwrap_or_default();
    let inputs = ClusterInputs {
        query_path : PathBuf::from(get_string("fasta")),
        database_path : PathBuf::from(get_string("database")),
        outdir : PathBuf::from(get_string("outdir")),
    };
    let nb_workers = matches.get_one::<usize>("threads").copied().unwrap_or(DEFAULT_NB_WORKERS);
    let default_search = SearchParams::default();
    let search_params = SearchParams::new(
        matches.get_one::<f64>("evalue").copied().unwrap_or(default_search.get_evalue()),
        matches.get_one::<f64>("inclusion").copied().unwrap_or(default_search.get_inclusion_ethresh()),
        matches.get_one::<usize>("iterations").copied().unwrap_or(default_search.get_nb_iterations()),
    );
    let params = ClusterParams::new(nb_workers, search_params, matches.get_flag("keep_blast"));
    log::info!("queries : {:?}, database : {:?}, outdir : {:?}", inputs.query_path, inputs.database_path, inputs.outdir);
    log::info!("parameters : {:?}", params);
    //
    let psiblast_path = PathBuf::from(get_string("psiblast"));
    let index_builder = MakeBlastDb::new(&PathBuf::from(get_string("makeblastdb")), "prot");
    let make_search = |layout : &hitcluster::pipeline::RunLayout| {
        let psiblast = PsiBlast::new(&psiblast_path, *params.get_search_params(), &layout.work_dir);
        match &layout.search_output_dir {
            Some(dir) => psiblast.keep_output_in(dir),
            None => psiblast,
        }
    };
    //
    let mut stdout = std::io::stdout();
    let report = run_clustering(&params, &inputs, &index_builder, make_search, &mut stdout)?;
    log::info!("dumped {} group files", report.files.len());
    //
    let end_t = chrono::Local::now();
    log::info!("\n hitcluster ends at time:{:#?} \n ", end_t);
    Ok(())
} // end of main
