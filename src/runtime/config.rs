/// Evaluator behavior switches
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvaluatorConfig {
    /// Record every assignment as `(name, value)` for later inspection
    pub trace: bool,
    /// Print each top-level expression statement's value to stdout
    pub echo: bool,
}

impl EvaluatorConfig {
    /// Reads `AUDIOSCRIPT_TRACE` and `AUDIOSCRIPT_ECHO`; unset means off
    pub fn from_env() -> Self {
        EvaluatorConfig {
            trace: flag(std::env::var("AUDIOSCRIPT_TRACE").ok().as_deref()),
            echo: flag(std::env::var("AUDIOSCRIPT_ECHO").ok().as_deref()),
        }
    }
}

fn flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}
