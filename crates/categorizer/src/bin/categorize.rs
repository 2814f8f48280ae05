//! Standalone classifier: reads alternating NUL-terminated `path`, `size`
//! fields from stdin and prints the category token for the whole list.
//!
//! Usage: `categorize <pattern-file>`
//!
//! Malformed records are reported on stderr and dropped; an empty surviving
//! list, or a missing/empty pattern file, is a setup error (exit code 1).

use std::io::Read;
use std::process::ExitCode;

use categorizer::{Categorizer, Record};

fn main() -> ExitCode {
    let Some(pattern_file) = std::env::args_os().nth(1) else {
        eprintln!("usage: categorize <pattern-file>");
        return ExitCode::FAILURE;
    };

    let categorizer = match Categorizer::from_pattern_file(pattern_file.as_ref()) {
        Ok(categorizer) => categorizer,
        Err(err) => {
            eprintln!("categorize: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut input = Vec::new();
    if let Err(err) = std::io::stdin().read_to_end(&mut input) {
        eprintln!("categorize: failed to read stdin: {err}");
        return ExitCode::FAILURE;
    }

    match categorizer.classify(&parse_records(&input)) {
        Ok(category) => {
            println!("{category}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("categorize: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Decode `path\0size\0` pairs, dropping malformed records with a stderr
/// diagnostic.
fn parse_records(input: &[u8]) -> Vec<Record> {
    let mut fields = input.split(|&b| b == 0);
    let mut records = Vec::new();
    while let Some(path) = fields.next() {
        // A trailing terminator leaves one empty field behind.
        if path.is_empty() && fields.clone().next().is_none() {
            break;
        }
        let Some(size) = fields.next() else {
            eprintln!("categorize: dropping record without a size field");
            break;
        };
        let Ok(path) = std::str::from_utf8(path) else {
            eprintln!("categorize: dropping record with non-UTF-8 path");
            continue;
        };
        match std::str::from_utf8(size).ok().and_then(|s| s.trim().parse::<u64>().ok()) {
            Some(size) => records.push(Record::new(path, size)),
            None => eprintln!(
                "categorize: dropping record {path:?}: invalid size {:?}",
                String::from_utf8_lossy(size)
            ),
        }
    }
    records
}
