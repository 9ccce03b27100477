// ABOUTME: Message builders for reminder and report notifications
// ABOUTME: Renders subject, plain, and HTML bodies for each dispatch kind

use super::OutboundMessage;
use chrono::NaiveTime;

/// Metrics carried into the weekly report message
#[derive(Debug, Clone, Copy)]
pub struct WeeklyReportStats {
    pub average_hours: f64,
    pub sessions_count: i64,
    pub average_quality: f64,
    pub goal_achievement: f64,
}

const FOOTER: &str = "This is an automated message from your sleep tracker.";

fn html_shell(body: &str) -> String {
    format!(
        "<html><body style=\"font-family: Arial, sans-serif; padding: 20px;\">{body}\
         <p style=\"margin-top: 30px; font-size: 12px; color: #718096;\">{FOOTER}</p>\
         </body></html>"
    )
}

fn custom_note(message: Option<&str>) -> String {
    message
        .filter(|m| !m.is_empty())
        .map(|m| format!("\n{m}"))
        .unwrap_or_default()
}

/// Wind-down nudge sent at the configured bedtime
#[must_use]
pub fn bedtime_reminder(
    recipient: &str,
    salutation: &str,
    bedtime: NaiveTime,
    custom: Option<&str>,
) -> OutboundMessage {
    let time = bedtime.format("%I:%M %p");
    let note = custom_note(custom);

    let plain = format!(
        "Hi {salutation}!\n\
         It's {time} - your target bedtime is approaching.\n\
         Getting good sleep is important for your health and well-being. \
         Consider winding down and preparing for bed soon.{note}\n\n{FOOTER}"
    );

    let html = html_shell(&format!(
        "<h2 style=\"color: #4A5568;\">Hi {salutation}!</h2>\
         <p style=\"font-size: 16px; color: #2D3748;\">It's {time} - your target bedtime is approaching.</p>\
         <p style=\"font-size: 14px; color: #4A5568;\">Getting good sleep is important for your health \
         and well-being. Consider winding down and preparing for bed soon.{note}</p>\
         <div style=\"margin-top: 30px; padding: 15px; background-color: #EDF2F7; border-radius: 5px;\">\
         <h3 style=\"color: #2D3748;\">Sleep Tips:</h3>\
         <ul style=\"color: #4A5568;\">\
         <li>Put away electronic devices</li>\
         <li>Dim the lights</li>\
         <li>Practice relaxation techniques</li>\
         <li>Keep your bedroom cool and comfortable</li>\
         </ul></div>"
    ));

    OutboundMessage {
        subject: "Time for Bed!".into(),
        plain_body: plain,
        html_body: html,
        recipient: recipient.into(),
    }
}

/// Morning nudge sent at the configured wake time
#[must_use]
pub fn wake_reminder(
    recipient: &str,
    salutation: &str,
    wake_time: NaiveTime,
    custom: Option<&str>,
) -> OutboundMessage {
    let time = wake_time.format("%I:%M %p");
    let note = custom_note(custom);

    let plain = format!(
        "Good morning, {salutation}!\n\
         It's {time} - time to wake up and start your day!\n\
         Don't forget to log your sleep session in the app.{note}\n\n{FOOTER}"
    );

    let html = html_shell(&format!(
        "<h2 style=\"color: #4A5568;\">Good morning, {salutation}!</h2>\
         <p style=\"font-size: 16px; color: #2D3748;\">It's {time} - time to wake up and start your day!</p>\
         <p style=\"font-size: 14px; color: #4A5568;\">Don't forget to log your sleep session in the app.{note}</p>\
         <div style=\"margin-top: 30px; padding: 15px; background-color: #EDF2F7; border-radius: 5px;\">\
         <h3 style=\"color: #2D3748;\">Morning Tips:</h3>\
         <ul style=\"color: #4A5568;\">\
         <li>Expose yourself to natural light</li>\
         <li>Hydrate with a glass of water</li>\
         <li>Do some light stretching</li>\
         <li>Eat a healthy breakfast</li>\
         </ul></div>"
    ));

    OutboundMessage {
        subject: "Good Morning!".into(),
        plain_body: plain,
        html_body: html,
        recipient: recipient.into(),
    }
}

/// Prompt to log yesterday's session
#[must_use]
pub fn log_reminder(recipient: &str, salutation: &str, custom: Option<&str>) -> OutboundMessage {
    let note = custom_note(custom);

    let plain = format!(
        "Hi {salutation}!\n\
         Have you logged your sleep from last night yet?\n\
         Tracking your sleep regularly helps you understand your sleep patterns \
         and make improvements to your sleep quality.{note}\n\n{FOOTER}"
    );

    let html = html_shell(&format!(
        "<h2 style=\"color: #4A5568;\">Hi {salutation}!</h2>\
         <p style=\"font-size: 16px; color: #2D3748;\">Have you logged your sleep from last night yet?</p>\
         <p style=\"font-size: 14px; color: #4A5568;\">Tracking your sleep regularly helps you understand \
         your sleep patterns and make improvements to your sleep quality.{note}</p>\
         <div style=\"margin-top: 30px; padding: 15px; background-color: #EDF2F7; border-radius: 5px;\">\
         <p style=\"color: #2D3748; margin: 0;\"><strong>Quick reminder:</strong> \
         Log your bedtime, wake time, and how you felt!</p></div>"
    ));

    OutboundMessage {
        subject: "Don't Forget to Log Your Sleep!".into(),
        plain_body: plain,
        html_body: html,
        recipient: recipient.into(),
    }
}

/// Weekly statistics report
#[must_use]
pub fn weekly_report(
    recipient: &str,
    salutation: &str,
    stats: &WeeklyReportStats,
) -> OutboundMessage {
    let plain = format!(
        "Weekly Sleep Report for {salutation}\n\n\
         Average sleep: {:.1}h\n\
         Sleep sessions: {}\n\
         Average quality: {:.1}/5\n\
         Goal achievement: {:.0}%\n\n\
         Consistency is key to better sleep. Keep tracking your sleep patterns \
         to identify what works best for you.\n\n{FOOTER}",
        stats.average_hours, stats.sessions_count, stats.average_quality, stats.goal_achievement
    );

    let html = html_shell(&format!(
        "<h2 style=\"color: #4A5568;\">Weekly Sleep Report for {salutation}</h2>\
         <div style=\"margin-top: 30px;\">\
         <h3 style=\"color: #2D3748;\">Your Sleep Stats This Week:</h3>\
         <div style=\"display: flex; flex-wrap: wrap; gap: 15px; margin-top: 20px;\">\
         <div style=\"background-color: #EBF8FF; padding: 20px; border-radius: 8px; flex: 1; min-width: 200px;\">\
         <h4 style=\"margin: 0; color: #2C5282;\">Average Sleep</h4>\
         <p style=\"font-size: 32px; font-weight: bold; margin: 10px 0; color: #2B6CB0;\">{:.1}h</p></div>\
         <div style=\"background-color: #F0FFF4; padding: 20px; border-radius: 8px; flex: 1; min-width: 200px;\">\
         <h4 style=\"margin: 0; color: #276749;\">Sleep Sessions</h4>\
         <p style=\"font-size: 32px; font-weight: bold; margin: 10px 0; color: #2F855A;\">{}</p></div>\
         <div style=\"background-color: #FFFAF0; padding: 20px; border-radius: 8px; flex: 1; min-width: 200px;\">\
         <h4 style=\"margin: 0; color: #744210;\">Average Quality</h4>\
         <p style=\"font-size: 32px; font-weight: bold; margin: 10px 0; color: #C05621;\">{:.1}/5</p></div>\
         <div style=\"background-color: #FAF5FF; padding: 20px; border-radius: 8px; flex: 1; min-width: 200px;\">\
         <h4 style=\"margin: 0; color: #553C9A;\">Goal Achievement</h4>\
         <p style=\"font-size: 32px; font-weight: bold; margin: 10px 0; color: #6B46C1;\">{:.0}%</p></div>\
         </div></div>\
         <div style=\"margin-top: 30px; padding: 15px; background-color: #EDF2F7; border-radius: 5px;\">\
         <h3 style=\"color: #2D3748;\">Keep It Up!</h3>\
         <p style=\"color: #4A5568;\">Consistency is key to better sleep. Keep tracking your sleep \
         patterns to identify what works best for you.</p></div>",
        stats.average_hours, stats.sessions_count, stats.average_quality, stats.goal_achievement
    ));

    OutboundMessage {
        subject: "Your Weekly Sleep Report".into(),
        plain_body: plain,
        html_body: html,
        recipient: recipient.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bedtime_message_carries_time_and_recipient() {
        let message = bedtime_reminder(
            "lea@example.com",
            "Lea",
            NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            None,
        );
        assert_eq!(message.subject, "Time for Bed!");
        assert_eq!(message.recipient, "lea@example.com");
        assert!(message.plain_body.contains("10:00 PM"));
        assert!(message.html_body.contains("10:00 PM"));
    }

    #[test]
    fn custom_message_is_woven_in_when_present() {
        let message = log_reminder("a@b.c", "A", Some("Streak: 12 days"));
        assert!(message.plain_body.contains("Streak: 12 days"));
        assert!(message.html_body.contains("Streak: 12 days"));

        let without = log_reminder("a@b.c", "A", Some(""));
        assert!(!without.plain_body.contains("Streak"));
    }

    #[test]
    fn weekly_report_formats_metrics() {
        let message = weekly_report(
            "a@b.c",
            "A",
            &WeeklyReportStats {
                average_hours: 7.33,
                sessions_count: 6,
                average_quality: 4.0,
                goal_achievement: 85.7,
            },
        );
        assert!(message.plain_body.contains("7.3h"));
        assert!(message.plain_body.contains("4.0/5"));
        assert!(message.plain_body.contains("86%"));
        assert!(message.html_body.contains("Weekly Sleep Report for A"));
    }
}
