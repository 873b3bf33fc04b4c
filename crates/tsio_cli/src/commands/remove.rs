//! Remove command implementation.

use super::open_engine;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tsio_core::{EntityCollection, Expansion};
use tsio_sync_engine::{ReadOptions, RemoveOutcome};

/// Runs the remove command.
///
/// When components are followed, the stored component references are read
/// first so that the removal sees the whole graph.
pub fn run(
    dir: &Path,
    collection: &str,
    names: &[String],
    expansion: Expansion,
    yes: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine(dir, collection)?;
    let entities: EntityCollection = names.iter().collect();

    if !expansion.components.is_none() {
        engine.read_attributes(&entities, &ReadOptions::new(expansion.clone()))?;
    }

    let outcome = engine.remove_with(&entities, &expansion, |targets| {
        if yes {
            return true;
        }
        let stdin = io::stdin();
        confirm(targets, &mut stdin.lock(), &mut io::stdout()).unwrap_or(false)
    })?;

    match outcome {
        RemoveOutcome::Deleted { names, deleted } => {
            println!("Removed {deleted} of {} entities", names.len());
        }
        RemoveOutcome::Aborted { .. } => println!("Aborted"),
        RemoveOutcome::Nothing => println!("Nothing to remove"),
    }
    Ok(())
}

/// Asks whether to delete `names` until the answer is yes or no.
///
/// `l` lists the names. End of input counts as no.
pub fn confirm<R: BufRead, W: Write>(names: &[String], input: &mut R, output: &mut W) -> io::Result<bool> {
    loop {
        write!(output, "Delete {} entities? [y/n/l] ", names.len())?;
        output.flush()?;

        let mut answer = String::new();
        if input.read_line(&mut answer)? == 0 {
            writeln!(output)?;
            return Ok(false);
        }

        match answer.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            "l" | "list" => {
                for name in names {
                    writeln!(output, "  {name}")?;
                }
            }
            _ => writeln!(output, "Please answer y, n or l")?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ask(answers: &str) -> (bool, String) {
        let names = vec!["BOND".to_string(), "BOND(QUOTE)".to_string()];
        let mut output = Vec::new();
        let confirmed = confirm(&names, &mut answers.as_bytes(), &mut output).unwrap();
        (confirmed, String::from_utf8(output).unwrap())
    }

    #[test]
    fn list_then_confirm() {
        let (confirmed, output) = ask("l\ny\n");
        assert!(confirmed);
        assert!(output.contains("  BOND(QUOTE)\n"));
        assert_eq!(output.matches("[y/n/l]").count(), 2);
    }

    #[test]
    fn unknown_answers_ask_again() {
        let (confirmed, output) = ask("maybe\nN\n");
        assert!(!confirmed);
        assert!(output.contains("Please answer"));
    }

    #[test]
    fn end_of_input_is_no() {
        assert!(!ask("").0);
    }
}
