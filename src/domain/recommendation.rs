//! Fixed care-plan templates keyed by risk category.

use super::risk::RiskCategory;

/// One action item in a care plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Action {
    pub title: &'static str,
    pub detail: &'static str,
}

/// Headline, six actions and a three-step timeline for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarePlan {
    pub headline: &'static str,
    pub actions_heading: &'static str,
    pub actions: [Action; 6],
    pub timeline_heading: &'static str,
    pub timeline: [&'static str; 3],
}

const fn action(title: &'static str, detail: &'static str) -> Action {
    Action { title, detail }
}

const HIGH: CarePlan = CarePlan {
    headline: "IMMEDIATE ACTION REQUIRED",
    actions_heading: "Critical Interventions",
    actions: [
        action(
            "Schedule urgent evaluation",
            "with geriatrician within 48 hours",
        ),
        action(
            "Immediate home safety assessment",
            "Remove all tripping hazards",
        ),
        action(
            "Physical therapy referral",
            "Balance and strength training program",
        ),
        action(
            "Medication review",
            "Especially sedatives and blood pressure meds",
        ),
        action(
            "Emergency response system",
            "Consider personal alert device",
        ),
        action("Caregiver support", "Daily check-ins recommended"),
    ],
    timeline_heading: "Estimated Timeline",
    timeline: [
        "Emergency modifications: 24-48 hours",
        "Medical evaluation: Within 1 week",
        "Therapy program: Start within 2 weeks",
    ],
};

const MEDIUM: CarePlan = CarePlan {
    headline: "PREVENTIVE MEASURES RECOMMENDED",
    actions_heading: "Recommended Actions",
    actions: [
        action(
            "Exercise program",
            "Balance and strength training 3x/week",
        ),
        action("Home safety", "Install grab bars, improve lighting"),
        action("Vision check", "Schedule eye exam within 1 month"),
        action("Medication review", "Discuss with pharmacist"),
        action(
            "Mobility aids",
            "Consider walking aid if balance score < 5",
        ),
        action("Follow-up", "Re-assess in 3 months"),
    ],
    timeline_heading: "Prevention Timeline",
    timeline: [
        "Start exercise program: Within 1 week",
        "Home modifications: Within 2 weeks",
        "Medical reviews: Within 1 month",
    ],
};

const LOW: CarePlan = CarePlan {
    headline: "MAINTAIN CURRENT PREVENTION",
    actions_heading: "Maintenance Recommendations",
    actions: [
        action("Continue current routine", "Keep up the good work"),
        action("Stay active", "Maintain regular exercise"),
        action("Home safety", "Keep environment clutter-free"),
        action("Annual review", "Re-assess in 12 months"),
        action(
            "Proper footwear",
            "Non-slip shoes indoors and outdoors",
        ),
        action("Social engagement", "Stay connected with community"),
    ],
    timeline_heading: "Monitoring Schedule",
    timeline: [
        "Next assessment: 12 months",
        "Annual health check-ups",
        "Report any changes immediately",
    ],
};

/// Care plan for a risk category.
#[must_use]
pub fn care_plan(category: RiskCategory) -> &'static CarePlan {
    match category {
        RiskCategory::Low => &LOW,
        RiskCategory::Medium => &MEDIUM,
        RiskCategory::High => &HIGH,
    }
}
