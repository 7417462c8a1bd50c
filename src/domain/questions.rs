//! Static questionnaires for each staff role.
//!
//! Question ids double as the keys of the stored `responses` map, so the
//! suggestion rules and the CSV flattening both depend on them staying stable.
use crate::domain::models::Role;
use chrono::NaiveTime;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "type", content = "options", rename_all = "snake_case")]
pub enum AnswerKind {
    YesNo,
    FreeText,
    ShortText,
    Time,
    Choice(&'static [&'static str]),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InvalidAnswer {
    #[error("expected \"yes\" or \"no\"")]
    NotYesNo,
    #[error("expected a time of day as HH:MM")]
    NotTime,
    #[error("expected one of: {0}")]
    NotAnOption(String),
}

impl AnswerKind {
    /// Checks a raw answer and returns the canonical stored form.
    pub fn canonicalize(&self, raw: &str) -> Result<String, InvalidAnswer> {
        let trimmed = raw.trim();
        match self {
            AnswerKind::YesNo => match trimmed.to_lowercase().as_str() {
                "yes" => Ok("yes".to_string()),
                "no" => Ok("no".to_string()),
                _ => Err(InvalidAnswer::NotYesNo),
            },
            AnswerKind::Time => NaiveTime::parse_from_str(trimmed, "%H:%M")
                .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
                .map(|t| t.format("%H:%M").to_string())
                .map_err(|_| InvalidAnswer::NotTime),
            AnswerKind::Choice(options) => options
                .iter()
                .find(|option| **option == trimmed)
                .map(|option| option.to_string())
                .ok_or_else(|| InvalidAnswer::NotAnOption(options.join(", "))),
            AnswerKind::FreeText | AnswerKind::ShortText => Ok(raw.to_string()),
        }
    }
}

/// Show the question only when another answer equals `equals`.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Condition {
    pub question_id: &'static str,
    pub equals: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Question {
    pub id: &'static str,
    pub text: &'static str,
    pub kind: AnswerKind,
    pub optional: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Section {
    pub title: &'static str,
    pub questions: &'static [Question],
}

const fn yes_no(id: &'static str, text: &'static str) -> Question {
    Question {
        id,
        text,
        kind: AnswerKind::YesNo,
        optional: false,
        condition: None,
    }
}

const fn details(id: &'static str, text: &'static str) -> Question {
    Question {
        id,
        text,
        kind: AnswerKind::FreeText,
        optional: false,
        condition: None,
    }
}

const fn optional_details(id: &'static str, text: &'static str) -> Question {
    Question {
        optional: true,
        ..details(id, text)
    }
}

const fn short_text(id: &'static str, text: &'static str) -> Question {
    Question {
        id,
        text,
        kind: AnswerKind::ShortText,
        optional: false,
        condition: None,
    }
}

const fn time(id: &'static str, text: &'static str) -> Question {
    Question {
        id,
        text,
        kind: AnswerKind::Time,
        optional: false,
        condition: None,
    }
}

const fn choice(id: &'static str, text: &'static str, options: &'static [&'static str]) -> Question {
    Question {
        id,
        text,
        kind: AnswerKind::Choice(options),
        optional: false,
        condition: None,
    }
}

const fn follow_up(
    id: &'static str,
    text: &'static str,
    question_id: &'static str,
    equals: &'static str,
) -> Question {
    Question {
        condition: Some(Condition { question_id, equals }),
        ..details(id, text)
    }
}

const RATIO_STATUS: &[&str] = &["Correct Ratio", "Incorrect Ratio"];

static MANAGER: &[Section] = &[
    Section {
        title: "Compliance & Operations",
        questions: &[
            yes_no("statutory_requirements", "Have all statutory requirements been met this week?"),
            yes_no("incidents_complaints", "Were there any incidents, complaints, or concerns raised?"),
            yes_no("safeguarding_policies", "Are all safeguarding policies being followed?"),
            yes_no("checks_logged", "Have all checks (first aid, fire drills, maintenance) been logged?"),
        ],
    },
    Section {
        title: "Health & Safety",
        questions: &[
            yes_no("health_safety_issues", "Were there any health & safety issues this week?"),
            yes_no("hygiene_measures", "Were hygiene and infection control measures followed?"),
            details("environmental_hazards", "Any environmental hazards or repairs needed?"),
        ],
    },
    Section {
        title: "Safeguarding",
        questions: &[
            yes_no("safeguarding_concerns", "Were there any safeguarding concerns raised?"),
            yes_no("concerns_reported", "Have all concerns been reported properly?"),
            yes_no("staff_confidence", "Do staff feel confident in safeguarding procedures?"),
        ],
    },
    Section {
        title: "Staff Updates",
        questions: &[
            details("staff_issues", "Any staff absences, lateness, or performance issues?"),
            details("staffing_changes", "Any staffing changes?"),
            details("training_needs", "Any training or support needs identified?"),
        ],
    },
    Section {
        title: "Children's Development",
        questions: &[
            yes_no("development_plans", "Are learning and development plans progressing?"),
            details("development_concerns", "Any concerns about individual children's development?"),
            yes_no("parent_communications", "Are parent communications up to date?"),
        ],
    },
];

static DEPUTY_MANAGER: &[Section] = &[
    Section {
        title: "Daily Running",
        questions: &[
            yes_no("routines_smooth", "Did routines (meals, transitions, outdoor play) run smoothly?"),
            details("staffing_challenges", "Any staffing or rota challenges?"),
            yes_no("parent_interactions", "Were parent drop-offs/pick-ups handled well?"),
        ],
    },
    Section {
        title: "Health & Safety",
        questions: &[
            yes_no("room_checks", "Were room checks, temp checks, and cleaning records completed?"),
            yes_no("accident_forms", "Were accident forms filled and shared?"),
        ],
    },
    Section {
        title: "Safeguarding",
        questions: &[
            yes_no("safeguarding_concerns", "Any safeguarding concerns this week?"),
            details("practices_attention", "Any practices needing attention?"),
        ],
    },
    Section {
        title: "Staff Updates",
        questions: &[
            details("staff_support", "Any staff needing extra support?"),
            details("staff_contributions", "Any notable staff contributions?"),
            yes_no("staff_clarity", "Are staff clear on responsibilities?"),
        ],
    },
    Section {
        title: "Children's Experiences",
        questions: &[
            yes_no("activities_appropriate", "Were activities inclusive and age-appropriate?"),
            details("children_support", "Did any children need extra support or show progress?"),
        ],
    },
];

static ROOM_LEADER: &[Section] = &[Section {
    title: "Daily Checklist",
    questions: &[
        yes_no("ratios_maintained", "Were ratios maintained?"),
        yes_no("risk_fridge_checks", "Were risk and fridge checks done?"),
        yes_no("resources_clean", "Were resources clean and safe?"),
        yes_no("observations_assessments", "Were observations or assessments done?"),
        yes_no("activities_meet_needs", "Did activities meet child needs?"),
        details("concerns_raised", "Were any concerns raised?"),
        yes_no("safeguarding_concerns", "Any safeguarding concerns observed?"),
        yes_no("staff_awareness", "Are all staff aware of safeguarding duties?"),
        details("team_issues", "Any team issues or achievements?"),
        details("support_needed", "Any support needed?"),
    ],
}];

static AREA_MANAGER: &[Section] = &[
    Section {
        title: "Morning Report",
        questions: &[
            choice(
                "location_attended",
                "Name of Location Attended",
                &["Curlew", "GGS", "Marylebone", "Paddington", "Head Office"],
            ),
            time("arrival_time", "Time of Arrival at Location"),
            yes_no("morning_reports_checked", "Have all nurseries' morning reports been checked?"),
            yes_no("locations_contacted", "Have you contacted each location to check if support is needed?"),
            yes_no("asana_set", "Is your Asana set for the day?"),
            short_text("curlew_baby_ratio", "Curlew - Baby Room Staff-to-Child Ratio"),
            short_text("curlew_toddler_ratio", "Curlew - Toddler Room Staff-to-Child Ratio"),
            short_text("curlew_preschool_ratio", "Curlew - Preschool Room Staff-to-Child Ratio"),
            short_text("ggs_baby_ratio", "GGS - Baby Room Staff-to-Child Ratio"),
            short_text("ggs_pretoddler_ratio", "GGS - Pre-Toddler Room Staff-to-Child Ratio"),
            short_text("ggs_toddler_ratio", "GGS - Toddler Room Staff-to-Child Ratio"),
            short_text("ggs_preschool_ratio", "GGS - Preschool Room Staff-to-Child Ratio"),
            short_text("marylebone_explorer_ratio", "Marylebone - Explorer Room Staff-to-Child Ratio"),
            short_text("marylebone_montessori_ratio", "Marylebone - Montessori Room Staff-to-Child Ratio"),
            short_text("paddington_explorer_ratio", "Paddington - Explorer Room Staff-to-Child Ratio"),
            short_text("paddington_montessori_ratio", "Paddington - Montessori Room Staff-to-Child Ratio"),
            optional_details("curlew_absences", "Any staff absences at Curlew today? (Name & reason)"),
            optional_details("ggs_absences", "Any staff absences at GGS today? (Name & reason)"),
            optional_details("marylebone_absences", "Any staff absences at Marylebone today? (Name & reason)"),
            optional_details("paddington_absences", "Any staff absences at Paddington today? (Name & reason)"),
            optional_details("general_absences", "Any staff absences at the site in general today? (Name & reason)"),
            choice("arrival_status", "Arrival Status", &["On Time", "Late", "Not Arrived"]),
            choice("curlew_baby_ratio_status", "Curlew Baby Room Ratio Status", RATIO_STATUS),
            choice("curlew_toddler_ratio_status", "Curlew Toddler Room Ratio Status", RATIO_STATUS),
            choice("curlew_preschool_ratio_status", "Curlew Preschool Room Ratio Status", RATIO_STATUS),
            optional_details("overall_ratio_notes", "Overall Ratio Notes"),
        ],
    },
    Section {
        title: "End of Day Report",
        questions: &[
            yes_no("end_reports_reviewed", "Have end-of-day reports been reviewed?"),
            details("issues_to_report", "Any issues to report?"),
            yes_no("children_outside", "Are children taken outside daily?"),
            follow_up("outside_reason", "Reason if No", "children_outside", "no"),
            yes_no("asana_completed", "Completed all Asana tasks?"),
            follow_up("asana_reason", "Reason if No", "asana_completed", "no"),
            yes_no("summary_emailed", "Emailed daily summary to Azi?"),
            yes_no("accidents_incidents", "Any accidents/incidents?"),
            follow_up("accident_description", "Description", "accidents_incidents", "yes"),
            time("departure_time", "Time left location"),
        ],
    },
];

pub fn questionnaire(role: Role) -> &'static [Section] {
    match role {
        Role::Manager => MANAGER,
        Role::DeputyManager => DEPUTY_MANAGER,
        Role::RoomLeader => ROOM_LEADER,
        Role::AreaManager => AREA_MANAGER,
    }
}

pub fn questions(role: Role) -> impl Iterator<Item = &'static Question> {
    questionnaire(role)
        .iter()
        .flat_map(|section| section.questions.iter())
}

pub fn find_question(role: Role, id: &str) -> Option<&'static Question> {
    questions(role).find(|question| question.id == id)
}

pub fn is_visible(question: &Question, answers: &BTreeMap<String, String>) -> bool {
    match question.condition {
        None => true,
        Some(condition) => answers
            .get(condition.question_id)
            .is_some_and(|value| value == condition.equals),
    }
}

pub fn visible_questions(
    role: Role,
    answers: &BTreeMap<String, String>,
) -> impl Iterator<Item = &'static Question> + '_ {
    questions(role).filter(move |question| is_visible(question, answers))
}
