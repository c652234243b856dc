//! Fixed analysis returned in demo mode.
//!
//! Independent of the submitted notes so a walkthrough always shows the same
//! scorecard.

use std::collections::BTreeMap;

use scorecard_shared::{
    ComponentId, ComponentScore, EnrichmentTag, FollowUpQuestion, QualificationAnalysis, TagType,
};

/// (component, score, summary, confidence, citation)
const DEMO_COMPONENTS: [(ComponentId, u8, &str, f64, &str); 8] = [
    (
        ComponentId::Metrics,
        3,
        "Customer wants to cut month-end close from 10 days to 4 and reduce manual reconciliation by 60%.",
        0.92,
        "we need to get close down to four days by Q3",
    ),
    (
        ComponentId::EconomicBuyer,
        1,
        "CFO Dana Whitfield signs off on finance tooling but has not joined a call yet.",
        0.61,
        "Dana will have the final say on anything over 100k",
    ),
    (
        ComponentId::DecisionCriteria,
        2,
        "ERP integration, SOC 2 Type II and total cost over three years are the stated criteria.",
        0.78,
        "it has to plug into NetSuite without custom work",
    ),
    (
        ComponentId::DecisionProcess,
        2,
        "Controller runs the evaluation, shortlists two vendors, then presents to the CFO.",
        0.70,
        "I'll shortlist two and take them to Dana",
    ),
    (
        ComponentId::PaperProcess,
        0,
        "No information yet on procurement, legal review or security questionnaire steps.",
        0.35,
        "",
    ),
    (
        ComponentId::IdentifyPain,
        3,
        "Audit findings last year traced to spreadsheet reconciliation errors.",
        0.88,
        "the auditors flagged three material errors from the spreadsheets",
    ),
    (
        ComponentId::Champion,
        2,
        "Controller Marcus Lee is engaged and has pushed internally for automation.",
        0.74,
        "I've been asking for this for two years",
    ),
    (
        ComponentId::Competition,
        1,
        "An incumbent BI vendor was mentioned; unclear whether they are bidding.",
        0.50,
        "our BI vendor says they can do some of this",
    ),
];

const DEMO_CLOUD_PROVIDER: &str = "AWS";

const DEMO_TAGS: [(TagType, &str); 4] = [
    (TagType::Tech, "NetSuite"),
    (TagType::Tech, "Snowflake"),
    (TagType::Compliance, "SOC 2 Type II"),
    (TagType::Integration, "Salesforce"),
];

const DEMO_QUESTIONS: [(ComponentId, &str); 4] = [
    (
        ComponentId::EconomicBuyer,
        "Can we get 30 minutes with Dana before the shortlist is final?",
    ),
    (
        ComponentId::PaperProcess,
        "Who owns procurement and legal review, and how long does it usually take?",
    ),
    (
        ComponentId::Competition,
        "Is the BI vendor formally part of this evaluation?",
    ),
    (
        ComponentId::PaperProcess,
        "Will security need a questionnaire or a pen-test report?",
    ),
];

const DEMO_EMAIL: &str = "Hi Marcus,\n\n\
Thanks for walking us through the month-end close today. Cutting the close \
from ten days to four and removing the spreadsheet reconciliation behind last \
year's audit findings is exactly where we help.\n\n\
As next steps, could we set up a short session with Dana to confirm budget \
and timing, and get an introduction to whoever runs procurement and security \
review?\n\n\
Best regards";

/// The demo scorecard.
pub fn demo_analysis() -> QualificationAnalysis {
    let components = DEMO_COMPONENTS
        .iter()
        .map(|&(id, score, text, confidence, citation)| {
            (id, ComponentScore::new(id, score, text, confidence, citation))
        })
        .collect::<BTreeMap<_, _>>();

    let tags = DEMO_TAGS
        .iter()
        .enumerate()
        .map(|(i, &(tag_type, value))| EnrichmentTag {
            id: (i + 1).to_string(),
            tag_type,
            value: value.into(),
        })
        .collect();

    let follow_up_questions = DEMO_QUESTIONS
        .iter()
        .enumerate()
        .map(|(i, &(component, question))| FollowUpQuestion {
            id: (i + 1).to_string(),
            component,
            question: question.into(),
        })
        .collect();

    QualificationAnalysis {
        components,
        cloud_provider: Some(DEMO_CLOUD_PROVIDER.into()),
        tags,
        follow_up_questions,
        email_draft: DEMO_EMAIL.into(),
    }
}
