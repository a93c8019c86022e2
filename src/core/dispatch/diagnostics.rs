//! Line-atomic console diagnostics shared by all workers.

use console::Term;
use std::sync::{Mutex, PoisonError};

/// Serializes diagnostic blocks onto stderr
#[derive(Debug)]
pub struct Diagnostics {
    verbose: bool,
    console: Mutex<Term>,
}

impl Diagnostics {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            console: Mutex::new(Term::stderr()),
        }
    }

    /// Write a verbose block; `lines` is only evaluated in verbose mode
    pub fn block<F>(&self, lines: F)
    where
        F: FnOnce() -> Vec<String>,
    {
        if self.verbose {
            self.write(&lines());
        }
    }

    fn write(&self, lines: &[String]) {
        let console = self.console.lock().unwrap_or_else(PoisonError::into_inner);
        for line in lines {
            console.write_line(line).ok();
        }
    }
}
