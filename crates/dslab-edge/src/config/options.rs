//! Config utils.

use std::collections::HashMap;
use std::str::FromStr;

use crate::error::ConfigError;

/// Parses config value string, which consists of two parts - name and options.
/// Example: AntColony[ants=20,iterations=100] parts are name AntColony and options string "ants=20,iterations=100".
pub fn parse_config_value(config_str: &str) -> (String, Option<String>) {
    match config_str.trim().split_once('[') {
        Some((l, r)) => (l.trim().to_string(), Some(r.replace(']', ""))),
        None => (config_str.trim().to_string(), None),
    }
}

/// Parses options string from config value, returns map with option names and values.
pub fn parse_options(options_str: &str) -> HashMap<String, String> {
    let mut options = HashMap::new();
    for option_str in options_str.split(',') {
        if let Some((name, value)) = option_str.split_once('=') {
            options.insert(name.trim().to_string(), value.trim().to_string());
        }
    }
    options
}

/// Returns parsed value of the option or `None` if the option is absent.
pub fn parse_option<T: FromStr>(options: &HashMap<String, String>, name: &str) -> Result<Option<T>, ConfigError> {
    match options.get(name) {
        Some(value) => value.parse::<T>().map(Some).map_err(|_| ConfigError::InvalidOption {
            name: name.to_string(),
            value: value.clone(),
        }),
        None => Ok(None),
    }
}

/// Lowercases the name and drops separators, so that `FIRST_FIT`, `first-fit` and `FirstFit` are the same.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}
