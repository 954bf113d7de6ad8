//! Profile composer — turns entered stats into a message for the coach.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const PREAMBLE: &str = "My current stats are:";

/// Profile fields as typed by the user. Values are carried as opaque text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDraft {
    /// Body weight in kilograms.
    pub weight: Option<String>,
    /// Functional threshold power in watts.
    pub ftp: Option<String>,
}

impl ProfileDraft {
    /// Compose the coach message for this draft.
    pub fn compose(&self) -> Result<String, ValidationError> {
        compose(self.weight.as_deref(), self.ftp.as_deref())
    }

    /// Whether at least one field holds a value.
    pub fn has_any(&self) -> bool {
        present(self.weight.as_deref()).is_some() || present(self.ftp.as_deref()).is_some()
    }
}

/// Build `"My current stats are: weight {w}kg FTP {f}W"`, omitting clauses
/// whose field is unset or empty.
pub fn compose(weight: Option<&str>, ftp: Option<&str>) -> Result<String, ValidationError> {
    let weight = present(weight);
    let ftp = present(ftp);
    if weight.is_none() && ftp.is_none() {
        return Err(ValidationError::EmptyProfile);
    }

    let mut text = PREAMBLE.to_string();
    if let Some(weight) = weight {
        text.push_str(&format!(" weight {weight}kg"));
    }
    if let Some(ftp) = ftp {
        text.push_str(&format!(" FTP {ftp}W"));
    }
    Ok(text)
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_fields() {
        assert_eq!(
            compose(Some("70"), Some("250")).unwrap(),
            "My current stats are: weight 70kg FTP 250W"
        );
    }

    #[test]
    fn weight_only() {
        assert_eq!(
            compose(Some("70"), None).unwrap(),
            "My current stats are: weight 70kg"
        );
        assert_eq!(
            compose(Some("70"), Some("")).unwrap(),
            "My current stats are: weight 70kg"
        );
    }

    #[test]
    fn ftp_only() {
        assert_eq!(
            compose(None, Some("250")).unwrap(),
            "My current stats are: FTP 250W"
        );
    }

    #[test]
    fn nothing_set_is_rejected() {
        assert_eq!(compose(None, None), Err(ValidationError::EmptyProfile));
        assert_eq!(compose(Some(""), Some("")), Err(ValidationError::EmptyProfile));
    }

    #[test]
    fn values_are_not_parsed() {
        assert_eq!(
            compose(Some("seventy"), Some("2.5e2")).unwrap(),
            "My current stats are: weight seventykg FTP 2.5e2W"
        );
    }

    #[test]
    fn draft_delegates() {
        let draft = ProfileDraft {
            weight: None,
            ftp: Some("310".to_string()),
        };
        assert!(draft.has_any());
        assert_eq!(draft.compose().unwrap(), "My current stats are: FTP 310W");
        assert!(!ProfileDraft::default().has_any());
    }
}
