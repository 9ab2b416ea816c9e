//! Scripted key presses for headless runs: `KeyT@1.5,Equal@3`.

use std::str::FromStr;

/// Malformed `KEY@SECONDS` entry.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScriptError {
    #[error("expected KEY@SECONDS, got {0:?}")]
    MissingTime(String),

    #[error("empty key name in {0:?}")]
    EmptyKey(String),

    #[error("invalid time in {0:?}")]
    InvalidTime(String),
}

/// A key pressed once the clock reaches `at` seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedKey {
    pub key: String,
    pub at: f64,
}

impl FromStr for ScriptedKey {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let entry = s.trim();
        let (key, at) = entry
            .rsplit_once('@')
            .ok_or_else(|| ScriptError::MissingTime(entry.to_string()))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(ScriptError::EmptyKey(entry.to_string()));
        }
        let at: f64 = at
            .trim()
            .parse()
            .map_err(|_| ScriptError::InvalidTime(entry.to_string()))?;
        if !at.is_finite() || at < 0.0 {
            return Err(ScriptError::InvalidTime(entry.to_string()));
        }
        Ok(Self {
            key: key.to_string(),
            at,
        })
    }
}

/// Pending scripted presses in time order.
#[derive(Debug, Clone, Default)]
pub struct KeyScript {
    pending: Vec<ScriptedKey>,
    next: usize,
}

impl KeyScript {
    pub fn new(mut keys: Vec<ScriptedKey>) -> Self {
        keys.sort_by(|a, b| a.at.total_cmp(&b.at));
        Self {
            pending: keys,
            next: 0,
        }
    }

    /// Keys due at or before `elapsed`, each returned once.
    pub fn due(&mut self, elapsed: f64) -> &[ScriptedKey] {
        let start = self.next;
        while self
            .pending
            .get(self.next)
            .is_some_and(|key| key.at <= elapsed)
        {
            self.next += 1;
        }
        &self.pending[start..self.next]
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.pending.len()
    }
}
