//! A simple CLI tool for auditing election dumps.
//! This uses the server's own dump format and audit implementation, and is by
//! definition compatible with the output of our API endpoints.

use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::BufReader;

use clap::{Arg, ArgAction, ArgMatches, Command};
use rocket::serde::json::serde_json;

use election_manager::model::{
    api::election::{AuditError, ElectionDump},
    common::election::{CandidateId, VoteCount},
};

const PROGRAM_NAME: &str = "audit-cli";

const ABOUT_TEXT: &str = "Check that an election's tallies add up.

EXIT CODES:
     0: Audit succeeded.
   255: Ran successfully, but the tallies do not add up.
 Other: Error.";

const DUMP_PATH: &str = "DUMP_PATH";

const DUMP_PATH_HELP: &str = "The path to a JSON dump of a specific election,\n\
as returned by `GET /elections/<election_id>/dump`";

/// Construct the CLI configuration.
fn cli() -> Command {
    // Make the build dirty when the toml changes.
    include_str!("../Cargo.toml");

    clap::command!(PROGRAM_NAME).about(ABOUT_TEXT).arg(
        Arg::new(DUMP_PATH)
            .help(DUMP_PATH_HELP)
            .action(ArgAction::Set)
            .required(true),
    )
}

/// Errors that this program may produce.
#[derive(Debug, Eq, PartialEq)]
enum Error {
    /// IO error described by the inner message.
    IO(String),
    /// Failed to decode the JSON dump.
    Format(String),
    /// The audit failed due to the contained reason.
    Audit(AuditError),
}

/// One candidate's audited tally.
#[derive(Debug, Eq, PartialEq)]
struct FriendlyResults {
    pub candidate_id: CandidateId,
    pub candidate_name: String,
    pub tally: VoteCount,
}

impl Display for FriendlyResults {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}. {}: {} vote{}",
            self.candidate_id,
            self.candidate_name,
            self.tally,
            if self.tally != 1 { "s" } else { "" }
        )
    }
}

fn audit(path: &str) -> Result<Vec<FriendlyResults>, Error> {
    // Load the file.
    let file = BufReader::new(File::open(path).map_err(|e| Error::IO(e.to_string()))?);
    let dump: ElectionDump =
        serde_json::from_reader(file).map_err(|e| Error::Format(e.to_string()))?;

    // Run the audit.
    dump.audit().map_err(Error::Audit)?;

    // Order by tally, then ID.
    let mut results: Vec<_> = dump
        .candidates
        .into_iter()
        .map(|c| FriendlyResults {
            candidate_id: c.id,
            candidate_name: c.name,
            tally: c.vote_count,
        })
        .collect();
    results.sort_by(|a, b| {
        b.tally
            .cmp(&a.tally)
            .then(a.candidate_id.cmp(&b.candidate_id))
    });
    Ok(results)
}

/// Run the audit, report the result, and return the exit code.
fn run(args: &ArgMatches) -> u8 {
    let path: &String = args.get_one(DUMP_PATH).unwrap(); // Required argument is guaranteed to be present.
    match audit(path) {
        Ok(results) => {
            println!("Audit succeeded.");
            for result in results {
                println!("{}", result);
            }
            0
        }
        Err(Error::IO(msg)) => {
            println!("IO error: {}", msg);
            1
        }
        Err(Error::Format(msg)) => {
            println!("Invalid JSON: {}", msg);
            1
        }
        Err(Error::Audit(err)) => {
            println!("Audit failed: {}.", err);
            255
        }
    }
}

fn main() {
    let args = cli().get_matches();
    let exit_code = run(&args);
    std::process::exit(exit_code.into())
}
