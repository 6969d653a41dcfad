// Appeal message template matching
//
// A template is a list of lines like "Steam ID:". A message matches when each
// of its first N lines starts with the label (text before the first colon) of
// the template line at the same position. Anything past the last template
// line belongs to that line's section and is not inspected.

use crate::utils::config::STEAM_ID_LABEL;

/// One line of a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateLine {
    /// Text before the first colon (the whole line if there is none)
    pub label: String,
}

impl TemplateLine {
    fn new(pattern: &str) -> Self {
        let label = pattern.split(':').next().unwrap_or_default();
        Self {
            label: label.to_string(),
        }
    }

    /// Whether this line's value is the Steam ID
    pub fn is_identifier(&self) -> bool {
        self.label.contains(STEAM_ID_LABEL)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageTemplate {
    pub lines: Vec<TemplateLine>,
}

/// Outcome of matching a message against a template
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationResult {
    pub ok: bool,
    pub extracted_identifier: Option<String>,
}

impl ValidationResult {
    fn rejected() -> Self {
        Self::default()
    }
}

impl MessageTemplate {
    pub fn parse(raw: &str) -> Self {
        Self {
            lines: raw.lines().map(TemplateLine::new).collect(),
        }
    }

    /// Whether any line of this template carries a Steam ID
    pub fn has_identifier_line(&self) -> bool {
        self.lines.iter().any(TemplateLine::is_identifier)
    }

    /// Match a raw message body against this template.
    ///
    /// First mismatch wins; there is no attempt to realign lines.
    pub fn validate(&self, raw_message: &str) -> ValidationResult {
        let lines: Vec<&str> = raw_message.trim().lines().collect();
        if lines.len() < self.lines.len() {
            return ValidationResult::rejected();
        }

        let mut extracted_identifier = None;

        for (section, line) in self.lines.iter().zip(&lines) {
            if !line.starts_with(section.label.as_str()) {
                return ValidationResult::rejected();
            }

            if section.is_identifier() {
                match line.split_once(':') {
                    Some((_, value)) => extracted_identifier = Some(value.trim().to_string()),
                    None => return ValidationResult::rejected(),
                }
            }
        }

        ValidationResult {
            ok: true,
            extracted_identifier,
        }
    }
}
