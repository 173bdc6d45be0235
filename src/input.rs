//! URL list reading and filtering.
//!
//! The URL list comes from a file or standard input, one URL per line.
//! Blank lines and `#` comments are dropped; an optional regex filter
//! (with inversion) and a shuffle are applied before the batch runs.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use rand::seq::SliceRandom;
use regex::Regex;
use tracing::info;

/// Reads the URL list from `source`, or standard input when `None`.
///
/// # Errors
///
/// Returns an IO error when the file or stdin cannot be read.
pub fn read_urls(source: Option<&Path>) -> io::Result<Vec<String>> {
    let text = match source {
        Some(path) => {
            info!(path = %path.display(), "reading URLs from file");
            fs::read_to_string(path)?
        }
        None => {
            info!("reading URLs from standard input");
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    Ok(parse_url_list(&text))
}

/// Splits raw text into URLs: one per line, trimmed, dropping blank lines
/// and lines starting with `#`.
#[must_use]
pub fn parse_url_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Optional regex filtering and shuffling of the URL list.
#[derive(Debug, Default)]
pub struct InputFilter {
    pattern: Option<Regex>,
    invert: bool,
    randomize: bool,
}

impl InputFilter {
    /// Creates a filter. `pattern` keeps matching URLs; `invert` keeps the
    /// non-matching ones instead; `randomize` shuffles the survivors.
    ///
    /// # Errors
    ///
    /// Returns the regex compile error for an invalid pattern.
    pub fn new(
        pattern: Option<&str>,
        invert: bool,
        randomize: bool,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: pattern.map(Regex::new).transpose()?,
            invert,
            randomize,
        })
    }

    /// Applies the filter and shuffle.
    #[must_use]
    pub fn apply(&self, urls: Vec<String>) -> Vec<String> {
        let mut urls = match &self.pattern {
            Some(regex) => {
                let before = urls.len();
                let kept: Vec<String> = urls
                    .into_iter()
                    .filter(|url| regex.is_match(url) != self.invert)
                    .collect();
                info!(
                    before,
                    after = kept.len(),
                    pattern = %regex,
                    invert = self.invert,
                    "filtered URL list"
                );
                kept
            }
            None => urls,
        };

        if self.randomize {
            urls.shuffle(&mut rand::thread_rng());
        }
        urls
    }
}
