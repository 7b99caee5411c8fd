use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::util;

const MAX_TEXT_LEN: usize = 100;
const MAX_GOAL_LEN: usize = 200;
const MAX_GOALS: usize = 10;
const MAX_HEAR_ABOUT_LEN: usize = 200;
const MAX_PHONE_LEN: usize = 30;
const MIN_PHONE_DIGITS: usize = 7;

/// Raw form body as submitted by the website. Every field is optional so
/// that missing values surface as field errors instead of a serde error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialSignupForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub selected_class: Option<String>,
    pub experience: Option<String>,
    pub goals: Option<Vec<String>>,
    pub hear_about: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl SignupUser {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialRequest {
    pub selected_class: String,
    pub experience: String,
    pub goals: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hear_about: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupMetadata {
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}

impl SignupMetadata {
    pub fn new(user_agent: Option<String>, ip_address: Option<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            user_agent,
            ip_address,
        }
    }
}

/// One accepted signup. Immutable once constructed, never persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialSignupData {
    pub user: SignupUser,
    pub trial: TrialRequest,
    pub metadata: SignupMetadata,
}

impl TrialSignupForm {
    /// Checks and normalizes the form. All failures are collected into
    /// field errors; this never panics.
    pub fn validate(self) -> Result<(SignupUser, TrialRequest), Vec<FieldError>> {
        let mut errors = Vec::new();

        let first_name = required_text("firstName", self.first_name, &mut errors);
        let last_name = required_text("lastName", self.last_name, &mut errors);
        let selected_class = required_text("selectedClass", self.selected_class, &mut errors);
        let experience = required_text("experience", self.experience, &mut errors);

        let email = match self.email.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            Some(raw) => match util::validate_email(raw) {
                Ok(email) => Some(email),
                Err(message) => {
                    errors.push(FieldError::new("email", message));
                    None
                }
            },
            None => {
                errors.push(FieldError::new("email", "is required"));
                None
            }
        };

        let phone = match self.phone.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            Some(raw) => match validate_phone(raw) {
                Ok(phone) => Some(phone),
                Err(message) => {
                    errors.push(FieldError::new("phone", message));
                    None
                }
            },
            None => None,
        };

        let goals = validate_goals(self.goals, &mut errors);

        let hear_about = self
            .hear_about
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        if let Some(value) = &hear_about {
            if value.chars().count() > MAX_HEAR_ABOUT_LEN {
                errors.push(FieldError::new(
                    "hearAbout",
                    format!("must be at most {} characters", MAX_HEAR_ABOUT_LEN),
                ));
            }
        }

        let (
            Some(first_name),
            Some(last_name),
            Some(email),
            Some(selected_class),
            Some(experience),
            Some(goals),
        ) = (first_name, last_name, email, selected_class, experience, goals)
        else {
            return Err(errors);
        };
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok((
            SignupUser {
                first_name,
                last_name,
                email,
                phone,
            },
            TrialRequest {
                selected_class,
                experience,
                goals,
                hear_about,
            },
        ))
    }
}

fn required_text(
    field: &'static str,
    value: Option<String>,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        Some(trimmed) if trimmed.chars().count() > MAX_TEXT_LEN => {
            errors.push(FieldError::new(
                field,
                format!("must be at most {} characters", MAX_TEXT_LEN),
            ));
            None
        }
        Some(trimmed) => Some(trimmed.to_string()),
        None => {
            errors.push(FieldError::new(field, "is required"));
            None
        }
    }
}

fn validate_goals(
    goals: Option<Vec<String>>,
    errors: &mut Vec<FieldError>,
) -> Option<Vec<String>> {
    let goals: Vec<String> = goals
        .unwrap_or_default()
        .into_iter()
        .map(|goal| goal.trim().to_string())
        .filter(|goal| !goal.is_empty())
        .collect();
    if goals.is_empty() {
        errors.push(FieldError::new("goals", "is required"));
        return None;
    }
    if goals.len() > MAX_GOALS {
        errors.push(FieldError::new(
            "goals",
            format!("must list at most {} goals", MAX_GOALS),
        ));
        return None;
    }
    if goals.iter().any(|goal| goal.chars().count() > MAX_GOAL_LEN) {
        errors.push(FieldError::new(
            "goals",
            format!("each goal must be at most {} characters", MAX_GOAL_LEN),
        ));
        return None;
    }
    Some(goals)
}

fn validate_phone(raw: &str) -> Result<String, String> {
    let digits = raw.chars().filter(char::is_ascii_digit).count();
    let allowed = raw
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '(' | ')' | '-' | '.'));
    if !allowed || digits < MIN_PHONE_DIGITS || raw.chars().count() > MAX_PHONE_LEN {
        return Err("must be a valid phone number".to_string());
    }
    Ok(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_form() -> TrialSignupForm {
        TrialSignupForm {
            first_name: Some("Sofia".to_string()),
            last_name: Some("Martinez".to_string()),
            email: Some("sofia@test.com".to_string()),
            phone: None,
            selected_class: Some("Salsa".to_string()),
            experience: Some("beginner".to_string()),
            goals: Some(vec!["fun".to_string()]),
            hear_about: None,
        }
    }

    #[test]
    fn accepts_complete_form() {
        let (user, trial) = complete_form().validate().unwrap();
        assert_eq!(user.full_name(), "Sofia Martinez");
        assert_eq!(user.email, "sofia@test.com");
        assert_eq!(trial.selected_class, "Salsa");
        assert_eq!(trial.experience, "beginner");
        assert_eq!(trial.goals, vec!["fun".to_string()]);
    }

    #[test]
    fn missing_field_is_named_in_error() {
        let form = TrialSignupForm {
            email: None,
            ..complete_form()
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.field == "email"));
    }

    #[test]
    fn every_required_field_is_reported() {
        let errors = TrialSignupForm::default().validate().unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
        for field in [
            "firstName",
            "lastName",
            "email",
            "selectedClass",
            "experience",
            "goals",
        ] {
            assert!(fields.contains(&field), "missing error for {}", field);
        }
    }

    #[test]
    fn whitespace_only_counts_as_missing() {
        let form = TrialSignupForm {
            first_name: Some("   ".to_string()),
            ..complete_form()
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.field == "firstName"));
    }

    #[test]
    fn fields_are_trimmed() {
        let form = TrialSignupForm {
            first_name: Some("  Sofia ".to_string()),
            email: Some(" sofia@test.com ".to_string()),
            ..complete_form()
        };
        let (user, _) = form.validate().unwrap();
        assert_eq!(user.first_name, "Sofia");
        assert_eq!(user.email, "sofia@test.com");
    }

    #[test]
    fn rejects_malformed_email() {
        let form = TrialSignupForm {
            email: Some("not-an-email".to_string()),
            ..complete_form()
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.field == "email"));
    }

    #[test]
    fn empty_goal_entries_are_dropped() {
        let form = TrialSignupForm {
            goals: Some(vec!["  ".to_string(), "technique".to_string()]),
            ..complete_form()
        };
        let (_, trial) = form.validate().unwrap();
        assert_eq!(trial.goals, vec!["technique".to_string()]);
    }

    #[test]
    fn goals_of_only_blanks_count_as_missing() {
        let form = TrialSignupForm {
            goals: Some(vec!["  ".to_string()]),
            ..complete_form()
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.field == "goals"));
    }

    #[test]
    fn optional_phone_is_shape_checked() {
        let form = TrialSignupForm {
            phone: Some("+1 (555) 123-4567".to_string()),
            ..complete_form()
        };
        let (user, _) = form.validate().unwrap();
        assert_eq!(user.phone, Some("+1 (555) 123-4567".to_string()));

        let form = TrialSignupForm {
            phone: Some("call me maybe".to_string()),
            ..complete_form()
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.field == "phone"));
    }

    #[test]
    fn oversized_name_is_rejected() {
        let form = TrialSignupForm {
            first_name: Some("x".repeat(MAX_TEXT_LEN + 1)),
            ..complete_form()
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.field == "firstName"));
    }
}
