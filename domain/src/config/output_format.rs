//! Output format value object

use serde::{Deserialize, Serialize};

/// How a consultation result is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Opinions, conference and plan
    Full,
    /// Only the synthesized plan (default)
    #[default]
    Plan,
    /// JSON output
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(OutputFormat::Full),
            "plan" | "synthesis" => Ok(OutputFormat::Plan),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_plan() {
        assert_eq!(OutputFormat::default(), OutputFormat::Plan);
    }

    #[test]
    fn test_serialize_lowercase() {
        let json = serde_json::to_string(&OutputFormat::Full).unwrap();
        assert_eq!(json, "\"full\"");
    }

    #[test]
    fn test_deserialize_lowercase() {
        let format: OutputFormat = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(format, OutputFormat::Json);
    }

    #[test]
    fn test_from_str_accepts_synthesis_alias() {
        assert_eq!("synthesis".parse::<OutputFormat>(), Ok(OutputFormat::Plan));
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
