// 👋 Welcome gate
//
// The viewer's name lives in a Session value owned by whichever shell is
// running (TUI app state, one HTTP request). Nothing is process-global.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    name: String,
}

/// Shown when the welcome form is submitted without a name
pub const EMPTY_NAME_WARNING: &str = "Please enter your name before continuing.";

impl Session {
    /// Start a session from raw input. Blank names are rejected.
    pub fn start(input: &str) -> Option<Self> {
        let name = input.trim();
        if name.is_empty() {
            None
        } else {
            Some(Self { name: name.to_string() })
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn greeting(&self) -> String {
        format!("Welcome, {}", self.name)
    }
}
