//! Shell configuration
//!
//! Configuration is read from an i3/sway-style line file. Every key has a
//! default, so an empty file (or no file at all) yields a working shell.

use crate::error::{TetherError, TetherResult};
use crate::shell::role::DEFAULT_MAX_PARENT_DEPTH;
use smithay::utils::{Logical, Size};
use std::collections::HashMap;
use std::path::Path;

pub mod parser;
#[cfg(test)]
mod tests;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Variables defined with 'set'
    pub variables: HashMap<String, String>,
    /// Lower bound for interactive resizes
    pub min_size: Size<i32, Logical>,
    /// Longest allowed parent chain
    pub max_parent_depth: usize,
    /// Whether a press that dismisses popups also reaches normal routing
    pub popup_dismiss_passthrough: bool,
    /// Activate a toplevel on the default seat when it first maps
    pub activate_on_map: bool,
    /// Seat names, the first one is the default seat
    pub seats: Vec<String>,
    /// Outputs created at startup
    pub outputs: Vec<OutputConfig>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    pub name: String,
    pub resolution: (i32, i32),
    pub position: (i32, i32),
    pub scale: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            variables: HashMap::new(),
            min_size: Size::from((1, 1)),
            max_parent_depth: DEFAULT_MAX_PARENT_DEPTH,
            popup_dismiss_passthrough: true,
            activate_on_map: true,
            seats: Vec::new(),
            outputs: Vec::new(),
        }
    }
}

impl Config {
    /// Load config from file
    pub fn load_from_file(path: &Path) -> TetherResult<Self> {
        let content = std::fs::read_to_string(path)?;
        parser::parse_config(&content)
    }

    /// Names of the seats to create, `seat0` when none are configured
    pub fn seat_names(&self) -> Vec<String> {
        if self.seats.is_empty() {
            vec!["seat0".to_string()]
        } else {
            self.seats.clone()
        }
    }

    /// Get a variable value
    pub fn get_variable(&self, name: &str) -> Option<String> {
        self.variables.get(name).cloned()
    }

    /// Expand variables in a string
    pub fn expand_variables(&self, text: &str) -> String {
        // longest names first so $gap does not clobber $gaps
        let mut names: Vec<&String> = self.variables.keys().collect();
        names.sort_by_key(|name| std::cmp::Reverse(name.len()));
        let mut result = text.to_string();
        for name in names {
            result = result.replace(&format!("${name}"), &self.variables[name]);
        }
        result
    }

    pub fn validate(&self) -> TetherResult<()> {
        if self.min_size.w < 1 || self.min_size.h < 1 {
            return Err(TetherError::Config(format!(
                "min_size must be at least 1x1, got {}x{}",
                self.min_size.w, self.min_size.h
            )));
        }
        if self.max_parent_depth == 0 {
            return Err(TetherError::Config("max_parent_depth must be positive".into()));
        }
        Ok(())
    }
}
