//! `leafproof` command line tool.
//!
//! Builds a tree from a JSON file of records and prints its root, a proof
//! for one record, the tree document or a drawing of the tree. `verify`
//! checks a proof against a previously dumped document.

use std::{path::PathBuf, process::ExitCode};

use clap::{Args, Parser, Subcommand};
use leafproof::{
    Keccak256, StandardMerkleTree, TreeOptions,
    abi::{encode_bytes32_array, parse_types},
    bytes::{hash_from_hex, to_hex},
};
use log::{debug, error};

use crate::error::CliError;

mod error;
mod values;

const LOG_TARGET: &str = "leafproof::cli";

#[derive(Parser)]
#[command(name = "leafproof")]
#[command(author, version, about = "Merkle roots and inclusion proofs over typed records")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct TreeArgs {
    /// JSON file holding an array of records, one array of fields each
    #[arg(short, long)]
    values: PathBuf,

    /// Comma-separated field types of every record
    #[arg(short, long, value_delimiter = ',', default_value = "uint256,uint256")]
    encoding: Vec<String>,

    /// Column holding decimal amounts to convert to 18-decimal base units
    #[arg(short, long)]
    units: Option<usize>,

    /// Keep leaves in file order instead of sorting them by hash
    #[arg(long, default_value_t = false)]
    no_sort: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Print the root hash
    Root(TreeArgs),
    /// Print the proof for one record as abi-encoded bytes32[]
    Proof {
        #[command(flatten)]
        tree: TreeArgs,
        /// Record fields, in base units
        #[arg(required = true, allow_hyphen_values = true)]
        fields: Vec<String>,
    },
    /// Print the tree document as JSON
    Dump(TreeArgs),
    /// Print an indented drawing of the tree
    Render(TreeArgs),
    /// Check a proof for one record against a dumped tree document
    Verify {
        /// Tree document written by `dump`
        #[arg(short, long)]
        document: PathBuf,
        /// Comma-separated proof hashes
        #[arg(short, long, value_delimiter = ',')]
        proof: Vec<String>,
        /// Record fields
        #[arg(required = true, allow_hyphen_values = true)]
        fields: Vec<String>,
    },
}

fn build_tree(args: &TreeArgs) -> Result<StandardMerkleTree<Keccak256>, CliError> {
    let encoding = parse_types(&args.encoding)?;
    let text = values::read_file(&args.values)?;
    let records = values::parse_rows(&text, &encoding, args.units)?;
    debug!(
        target: LOG_TARGET,
        "read {} records from {}",
        records.len(),
        args.values.display()
    );
    let options = TreeOptions {
        sort_leaves: !args.no_sort,
    };
    Ok(StandardMerkleTree::of_with_options(records, &encoding, options)?)
}

fn run(command: Command) -> Result<String, CliError> {
    match command {
        Command::Root(args) => Ok(build_tree(&args)?.root()),
        Command::Proof { tree, fields } => {
            let tree = build_tree(&tree)?;
            let value = values::parse_fields(tree.leaf_encoding(), &fields)?;
            let proof = tree
                .get_proof(&value)?
                .iter()
                .map(|hash| hash_from_hex(hash))
                .collect::<leafproof::Result<Vec<_>>>()?;
            Ok(to_hex(&encode_bytes32_array(&proof)))
        }
        Command::Dump(args) => Ok(build_tree(&args)?.to_json()?),
        Command::Render(args) => Ok(build_tree(&args)?.render()?),
        Command::Verify {
            document,
            proof,
            fields,
        } => {
            let tree = StandardMerkleTree::<Keccak256>::from_json(&values::read_file(&document)?)?;
            let value = values::parse_fields(tree.leaf_encoding(), &fields)?;
            Ok(tree.verify(&value, &proof)?.to_string())
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli.command) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(target: LOG_TARGET, "{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
