//! Command line splitting.
//!
//! There's no grammar here: stages are split on `|`, the last one may end in
//! `> target`, and each stage is split on whitespace.

use regex::Regex;

/// Pattern for a trailing redirect on the last stage.
pub const REDIRECT_PATTERN: &str = r"^(.*)>\s*(\S+)$";

/// A command line split into stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub stages: Vec<String>,
    /// Unresolved redirect target.
    pub redirect: Option<String>,
}

impl Pipeline {
    pub fn parse(line: &str, redirect: &Regex) -> Self {
        let mut stages: Vec<String> = line.split('|').map(|s| s.trim().to_string()).collect();
        let mut target = None;
        if let Some(last) = stages.last_mut() {
            if let Some(caps) = redirect.captures(last) {
                let (head, to) = (caps[1].trim().to_string(), caps[2].to_string());
                *last = head;
                target = Some(to);
            }
        }
        Self {
            stages,
            redirect: target,
        }
    }
}

/// One tokenized stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    /// The stage started with the elevate keyword.
    pub elevated: bool,
    pub name: String,
    pub args: Vec<String>,
}

impl Stage {
    pub fn tokenize(stage: &str, elevate_keyword: &str) -> Self {
        let mut tokens = stage.split_whitespace().map(str::to_string);
        let mut name = tokens.next().unwrap_or_default();
        let elevated = name == elevate_keyword;
        if elevated {
            name = tokens.next().unwrap_or_default();
        }
        Self {
            elevated,
            name,
            args: tokens.collect(),
        }
    }
}
