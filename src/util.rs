use validator::Validate;

const MAX_USER_AGENT_LEN: usize = 256;

#[derive(Validate)]
struct EmailValidator {
    #[validate(email)]
    email: String,
}

pub fn validate_email(email: &str) -> Result<String, String> {
    let validator = EmailValidator {
        email: email.trim().to_string(),
    };
    if validator.validate().is_err() {
        return Err(format!("'{}' is not a valid email address", validator.email));
    }
    Ok(validator.email)
}

/// Strips control characters and caps the length. `None` when nothing
/// usable remains.
pub fn sanitize_user_agent(raw: &str) -> Option<String> {
    let cleaned: String = raw.chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    if cleaned.chars().count() > MAX_USER_AGENT_LEN {
        return Some(cleaned.chars().take(MAX_USER_AGENT_LEN).collect());
    }
    Some(cleaned.to_string())
}

/// Picks the client address out of the proxy headers: first hop of
/// `x-forwarded-for`, else `x-real-ip`. Anything that does not parse as
/// an IP address is discarded.
pub fn client_ip(forwarded_for: Option<&str>, real_ip: Option<&str>) -> Option<String> {
    let candidate = forwarded_for
        .and_then(|value| value.split(',').next())
        .or(real_ip)?
        .trim();
    candidate
        .parse::<std::net::IpAddr>()
        .ok()
        .map(|ip| ip.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_email() {
        assert_eq!(
            validate_email(" sofia@test.com "),
            Ok("sofia@test.com".to_string())
        );
    }

    #[test]
    fn rejects_invalid_email() {
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn strips_control_characters_from_user_agent() {
        assert_eq!(
            sanitize_user_agent("Mozilla/5.0\r\nX-Injected: 1"),
            Some("Mozilla/5.0X-Injected: 1".to_string())
        );
    }

    #[test]
    fn truncates_oversized_user_agent() {
        let raw = "a".repeat(1000);
        let sanitized = sanitize_user_agent(&raw).unwrap();
        assert_eq!(sanitized.len(), MAX_USER_AGENT_LEN);
    }

    #[test]
    fn empty_user_agent_is_none() {
        assert_eq!(sanitize_user_agent("  \t "), None);
    }

    #[test]
    fn takes_first_forwarded_hop() {
        assert_eq!(
            client_ip(Some("203.0.113.7, 10.0.0.1"), None),
            Some("203.0.113.7".to_string())
        );
    }

    #[test]
    fn falls_back_to_real_ip_header() {
        assert_eq!(
            client_ip(None, Some("2001:db8::1")),
            Some("2001:db8::1".to_string())
        );
    }

    #[test]
    fn discards_non_ip_values() {
        assert_eq!(client_ip(Some("evil-header\r\n"), None), None);
        assert_eq!(client_ip(None, Some("localhost")), None);
    }
}
