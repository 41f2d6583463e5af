//! Builtin templates — the last fallback when neither a user-specific nor a
//! global template exists for a stage.

use leadflow_core::settings::{StageTiming, TimingUnit};
use leadflow_core::stage::Stage;

use crate::template::EmailTemplate;

/// The builtin template for a stage. Always active; timing mirrors the
/// stage's builtin delay.
pub fn builtin(stage: Stage) -> EmailTemplate {
    let (subject, html, text, timing) = copy_for(stage);
    let mut template = EmailTemplate::new(None, stage, subject, html, text, timing);
    // Stable id so repeated resolutions compare equal in logs
    template.id = format!("builtin-{}", stage.key());
    template
}

fn copy_for(stage: Stage) -> (&'static str, &'static str, &'static str, StageTiming) {
    match stage {
        Stage::CalledOnce => (
            "Great connecting with you, {{LEAD_NAME}}",
            "<p>Hi {{LEAD_NAME}},</p>\
             <p>Thanks for taking my call earlier. As promised, here is a little more \
             about how {{COMPANY_NAME}} helps businesses in {{TARGET_INDUSTRY}} with \
             {{COMPANY_SERVICE}}.</p>\
             <p>You can see examples of our work at {{WEBSITE_URL}}.</p>\
             <p>Best,<br>{{SENDER_NAME}}</p>",
            "Hi {{LEAD_NAME}},\n\nThanks for taking my call earlier. As promised, here is \
             a little more about how {{COMPANY_NAME}} helps businesses in \
             {{TARGET_INDUSTRY}} with {{COMPANY_SERVICE}}.\n\nYou can see examples of our \
             work at {{WEBSITE_URL}}.\n\nBest,\n{{SENDER_NAME}}",
            StageTiming::new(0, TimingUnit::Days, "Sent immediately after the first call"),
        ),
        Stage::CalledTwice => (
            "Following up on my last note",
            "<p>Hi {{LEAD_NAME}},</p>\
             <p>Just circling back in case my last email got buried. I'd love to hear \
             whether {{COMPANY_SERVICE}} is something {{OWNER_NAME}} would find useful \
             right now.</p>\
             <p>Happy to answer any questions.</p>\
             <p>Best,<br>{{SENDER_NAME}}</p>",
            "Hi {{LEAD_NAME}},\n\nJust circling back in case my last email got buried. \
             I'd love to hear whether {{COMPANY_SERVICE}} is something {{OWNER_NAME}} \
             would find useful right now.\n\nHappy to answer any questions.\n\nBest,\n\
             {{SENDER_NAME}}",
            StageTiming::new(7, TimingUnit::Days, "One week after the first email"),
        ),
        Stage::CalledThreeTimes => (
            "A quick idea for your business",
            "<p>Hi {{LEAD_NAME}},</p>\
             <p>I was reading your reviews — \"{{COMPANY_REVIEW}}\" stood out. Businesses \
             with that kind of reputation usually get the most out of \
             {{COMPANY_SERVICE}}.</p>\
             <p>Worth a quick chat?</p>\
             <p>Best,<br>{{SENDER_NAME}}</p>",
            "Hi {{LEAD_NAME}},\n\nI was reading your reviews — \"{{COMPANY_REVIEW}}\" \
             stood out. Businesses with that kind of reputation usually get the most out \
             of {{COMPANY_SERVICE}}.\n\nWorth a quick chat?\n\nBest,\n{{SENDER_NAME}}",
            StageTiming::new(7, TimingUnit::Days, "One week after the previous email"),
        ),
        Stage::CalledFourTimes => (
            "Still on your radar?",
            "<p>Hi {{LEAD_NAME}},</p>\
             <p>I know things get busy. If improving {{COMPANY_SERVICE}} is still on your \
             list this quarter, I can put together a short plan tailored to \
             {{TARGET_INDUSTRY}}.</p>\
             <p>Best,<br>{{SENDER_NAME}}</p>",
            "Hi {{LEAD_NAME}},\n\nI know things get busy. If improving \
             {{COMPANY_SERVICE}} is still on your list this quarter, I can put together a \
             short plan tailored to {{TARGET_INDUSTRY}}.\n\nBest,\n{{SENDER_NAME}}",
            StageTiming::new(7, TimingUnit::Days, "One week after the previous email"),
        ),
        Stage::CalledFiveTimes => (
            "Case study you might like",
            "<p>Hi {{LEAD_NAME}},</p>\
             <p>We recently helped a company a lot like yours — same industry, similar \
             size. The before/after numbers are on {{WEBSITE_URL}}.</p>\
             <p>If the timing is better now, I'm around this week.</p>\
             <p>Best,<br>{{SENDER_NAME}}</p>",
            "Hi {{LEAD_NAME}},\n\nWe recently helped a company a lot like yours — same \
             industry, similar size. The before/after numbers are on {{WEBSITE_URL}}.\n\n\
             If the timing is better now, I'm around this week.\n\nBest,\n{{SENDER_NAME}}",
            StageTiming::new(7, TimingUnit::Days, "One week after the previous email"),
        ),
        Stage::CalledSixTimes => (
            "One last thought, {{LEAD_NAME}}",
            "<p>Hi {{LEAD_NAME}},</p>\
             <p>I don't want to clutter your inbox, so this is my second-to-last note. If \
             there's a better person at your company to talk to about \
             {{COMPANY_SERVICE}}, just point me their way.</p>\
             <p>Best,<br>{{SENDER_NAME}}</p>",
            "Hi {{LEAD_NAME}},\n\nI don't want to clutter your inbox, so this is my \
             second-to-last note. If there's a better person at your company to talk to \
             about {{COMPANY_SERVICE}}, just point me their way.\n\nBest,\n{{SENDER_NAME}}",
            StageTiming::new(7, TimingUnit::Days, "One week after the previous email"),
        ),
        Stage::CalledSevenTimes => (
            "Closing the loop",
            "<p>Hi {{LEAD_NAME}},</p>\
             <p>This is my last scheduled note. If priorities change and \
             {{COMPANY_SERVICE}} becomes relevant, you can always reach me at \
             {{SENDER_EMAIL}}.</p>\
             <p>Wishing you and the team all the best.</p>\
             <p>{{SENDER_NAME}}</p>",
            "Hi {{LEAD_NAME}},\n\nThis is my last scheduled note. If priorities change \
             and {{COMPANY_SERVICE}} becomes relevant, you can always reach me at \
             {{SENDER_EMAIL}}.\n\nWishing you and the team all the best.\n\n\
             {{SENDER_NAME}}",
            StageTiming::new(7, TimingUnit::Days, "Final email, one week later"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_exists_for_every_stage() {
        for stage in Stage::ALL {
            let template = builtin(stage);
            assert_eq!(template.stage, stage);
            assert!(template.is_active);
            assert!(template.is_global());
            assert!(!template.subject.is_empty());
            assert!(!template.html_content.is_empty());
            assert!(!template.text_content.is_empty());
        }
    }

    #[test]
    fn test_builtin_timings_match_stage_defaults() {
        for stage in Stage::ALL {
            assert_eq!(builtin(stage).timing.to_duration(), stage.default_delay());
        }
    }

    #[test]
    fn test_builtin_variables_extracted() {
        let template = builtin(Stage::CalledOnce);
        assert!(template.variables.contains(&"LEAD_NAME".to_string()));
        assert!(template.variables.contains(&"SENDER_NAME".to_string()));
    }
}
