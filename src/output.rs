use std::io::{self, Write};

use serde::Serialize;

use crate::app::{ListResult, ToggleResult};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_list(result: &ListResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_toggle(result: &ToggleResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

pub struct TextOutput;

impl TextOutput {
    pub fn print_list(result: &ListResult) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(
            stdout,
            "{} ({}/{} found)",
            result.catalog, result.found, result.total
        )?;
        let width = result
            .items
            .iter()
            .map(|item| item.name.chars().count())
            .max()
            .unwrap_or(0);
        for item in &result.items {
            let mark = if item.found { "[x]" } else { "[ ]" };
            writeln!(
                stdout,
                "{mark} {:<width$}  {:>6} Bells  {}  {}",
                item.name,
                item.price,
                item.availability(),
                item.location
            )?;
        }
        Ok(())
    }

    pub fn print_toggle(result: &ToggleResult) -> io::Result<()> {
        let state = if result.item.found {
            "found"
        } else {
            "not found"
        };
        println!("{}: {} marked {state}", result.catalog, result.item.name);
        Ok(())
    }
}
