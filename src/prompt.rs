//! Numbered selection prompt for interactive runs.

use std::{
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};

/// Prints `choices` as a numbered list and reads a 1-based selection.
///
/// Invalid input re-prompts; end of input is an error.
pub fn choose<R, W>(
    title: &str,
    choices: &[PathBuf],
    input: &mut R,
    output: &mut W,
) -> Result<PathBuf>
where
    R: BufRead,
    W: Write,
{
    if choices.is_empty() {
        bail!("No candidate files to choose from");
    }
    writeln!(output, "{title}")?;
    for (idx, choice) in choices.iter().enumerate() {
        writeln!(output, "{}. {}", idx + 1, display_name(choice))?;
    }
    loop {
        write!(output, "\nEnter the number of the file to use (1-{}): ", choices.len())?;
        output.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line).context("Reading selection")? == 0 {
            bail!("No selection made");
        }
        match line.trim().parse::<usize>() {
            Ok(n) if (1..=choices.len()).contains(&n) => {
                let selected = choices[n - 1].clone();
                writeln!(output, "Selected: {}", display_name(&selected))?;
                return Ok(selected);
            }
            Ok(_) => writeln!(output, "Invalid choice. Please enter a valid number.")?,
            Err(_) => writeln!(output, "Please enter a valid number.")?,
        }
    }
}

/// Asks a yes/no question; anything but `y`/`yes` means no.
pub fn confirm<R, W>(question: &str, input: &mut R, output: &mut W) -> Result<bool>
where
    R: BufRead,
    W: Write,
{
    write!(output, "{question} [y/N]: ")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line).context("Reading answer")?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// [`choose`] over the process's stdin and stdout.
pub fn choose_interactively(title: &str, choices: &[PathBuf]) -> Result<PathBuf> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    choose(title, choices, &mut stdin.lock(), &mut stdout.lock())
}

pub fn confirm_interactively(question: &str) -> Result<bool> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    confirm(question, &mut stdin.lock(), &mut stdout.lock())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn choices() -> Vec<PathBuf> {
        vec![PathBuf::from("a_wells.csv"), PathBuf::from("b_wells.csv")]
    }

    #[test]
    fn reprompts_until_valid_choice() {
        let mut input = Cursor::new("x\n7\n2\n");
        let mut output = Vec::new();
        let selected = choose("Found:", &choices(), &mut input, &mut output).unwrap();
        assert_eq!(selected, PathBuf::from("b_wells.csv"));
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("1. a_wells.csv"));
        assert!(text.contains("Please enter a valid number."));
        assert!(text.contains("Invalid choice."));
        assert!(text.contains("Selected: b_wells.csv"));
    }

    #[test]
    fn end_of_input_is_an_error() {
        let mut input = Cursor::new("");
        let mut output = Vec::new();
        assert!(choose("Found:", &choices(), &mut input, &mut output).is_err());
    }

    #[test]
    fn confirm_defaults_to_no() {
        let mut output = Vec::new();
        assert!(confirm("Proceed?", &mut Cursor::new("YES\n"), &mut output).unwrap());
        assert!(!confirm("Proceed?", &mut Cursor::new("\n"), &mut output).unwrap());
    }
}
