use crate::signup::TrialSignupData;

use super::{EmailMessage, SenderIdentity};

pub fn user_confirmation(sender: &SenderIdentity, data: &TrialSignupData) -> EmailMessage {
    let subject = format!("Your trial class at {}", sender.studio_name);
    let text = format!(
        "Hi {},\n\n\
         Thanks for signing up for a trial {} class at {}! \
         We have your spot reserved and one of our instructors will reach \
         out shortly to confirm the date and time.\n\n\
         What to bring: comfortable clothes, a water bottle, and your \
         dancing shoes if you have them.\n\n\
         See you on the dance floor,\n\
         The {} team",
        data.user.first_name, data.trial.selected_class, sender.studio_name, sender.studio_name,
    );
    let html = format!(
        "<p>Hi {},</p>\
         <p>Thanks for signing up for a trial <strong>{}</strong> class at {}! \
         We have your spot reserved and one of our instructors will reach \
         out shortly to confirm the date and time.</p>\
         <p>What to bring: comfortable clothes, a water bottle, and your \
         dancing shoes if you have them.</p>\
         <p>See you on the dance floor,<br>The {} team</p>",
        escape_html(&data.user.first_name),
        escape_html(&data.trial.selected_class),
        escape_html(&sender.studio_name),
        escape_html(&sender.studio_name),
    );
    EmailMessage {
        to: data.user.email.clone(),
        subject,
        text,
        html: Some(html),
    }
}

pub fn admin_notification(sender: &SenderIdentity, data: &TrialSignupData) -> EmailMessage {
    let mut text = format!(
        "New trial signup\n\n\
         Name: {}\n\
         Email: {}\n",
        data.user.full_name(),
        data.user.email,
    );
    if let Some(phone) = &data.user.phone {
        text.push_str(&format!("Phone: {}\n", phone));
    }
    text.push_str(&format!(
        "Class: {}\n\
         Experience: {}\n\
         Goals: {}\n",
        data.trial.selected_class,
        data.trial.experience,
        data.trial.goals.join(", "),
    ));
    if let Some(hear_about) = &data.trial.hear_about {
        text.push_str(&format!("Heard about us via: {}\n", hear_about));
    }
    text.push_str(&format!(
        "\nSubmitted: {}\n",
        data.metadata.timestamp.to_rfc3339()
    ));
    if let Some(ip) = &data.metadata.ip_address {
        text.push_str(&format!("IP: {}\n", ip));
    }
    if let Some(user_agent) = &data.metadata.user_agent {
        text.push_str(&format!("User agent: {}\n", user_agent));
    }
    EmailMessage {
        to: sender.admin_recipient.clone(),
        subject: format!("New trial signup: {}", data.user.full_name()),
        text,
        html: None,
    }
}

// Form fields end up inside the HTML body, so angle brackets and quotes
// must not survive as markup.
fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use crate::signup::{SignupMetadata, SignupUser, TrialRequest};

    use super::*;

    fn sender() -> SenderIdentity {
        SenderIdentity {
            studio_name: "Studio Motion".to_string(),
            from: "noreply@studiomotion.test".to_string(),
            admin_recipient: "frontdesk@studiomotion.test".to_string(),
        }
    }

    fn signup() -> TrialSignupData {
        TrialSignupData {
            user: SignupUser {
                first_name: "Sofia".to_string(),
                last_name: "Martinez".to_string(),
                email: "sofia@test.com".to_string(),
                phone: Some("+1 555 123 4567".to_string()),
            },
            trial: TrialRequest {
                selected_class: "Salsa".to_string(),
                experience: "beginner".to_string(),
                goals: vec!["fun".to_string(), "fitness".to_string()],
                hear_about: Some("Instagram".to_string()),
            },
            metadata: SignupMetadata::new(None, None),
        }
    }

    #[test]
    fn confirmation_goes_to_the_user() {
        let message = user_confirmation(&sender(), &signup());
        assert_eq!(message.to, "sofia@test.com");
        assert!(message.subject.contains("Studio Motion"));
        assert!(message.text.contains("Salsa"));
        assert!(message.html.is_some());
    }

    #[test]
    fn admin_alert_lists_the_request() {
        let message = admin_notification(&sender(), &signup());
        assert_eq!(message.to, "frontdesk@studiomotion.test");
        assert!(message.subject.contains("Sofia Martinez"));
        assert!(message.text.contains("Salsa"));
        assert!(message.text.contains("fun, fitness"));
        assert!(message.text.contains("Instagram"));
    }

    #[test]
    fn html_body_escapes_form_input() {
        let mut data = signup();
        data.user.first_name = "<script>".to_string();
        let message = user_confirmation(&sender(), &data);
        let html = message.html.unwrap();
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }
}
