//! CSV downloads for submissions and the record tables.
use crate::domain::records::{Enrollment, RoomPlan, StaffRatio};
use crate::pipeline::compliance::submission_rate;
use crate::pipeline::formatting::flatten_payload;
use crate::pipeline::normalize::NormalizedSubmission;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    FormSubmissions,
    StaffChildRatios,
    EnrollmentAttendance,
    RoomPlanner,
}

impl Dataset {
    pub const ALL: [Dataset; 4] = [
        Dataset::FormSubmissions,
        Dataset::StaffChildRatios,
        Dataset::EnrollmentAttendance,
        Dataset::RoomPlanner,
    ];

    /// URL segment and filename prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            Dataset::FormSubmissions => "form-submissions",
            Dataset::StaffChildRatios => "staff-child-ratios",
            Dataset::EnrollmentAttendance => "enrollment-attendance",
            Dataset::RoomPlanner => "room-planner",
        }
    }
}

impl TryFrom<&str> for Dataset {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Dataset::ALL
            .into_iter()
            .find(|dataset| dataset.as_str() == value)
            .ok_or(())
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.headers.len());
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_csv(&self) -> String {
        std::iter::once(&self.headers)
            .chain(self.rows.iter())
            .map(|row| {
                row.iter()
                    .map(|field| escape_field(field))
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Quotes a field only when it holds a comma, quote, CR or LF.
pub fn escape_field(field: &str) -> String {
    if field.contains(&[',', '"', '\r', '\n'][..]) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub filename: String,
    pub content: String,
}

pub fn export_filename(dataset: Dataset, date: NaiveDate) -> String {
    format!("{}-{}.csv", dataset.as_str(), date.format("%Y-%m-%d"))
}

/// `None` when the table has no rows; there is nothing to download.
pub fn build_export(dataset: Dataset, table: &CsvTable, date: NaiveDate) -> Option<CsvExport> {
    if table.is_empty() {
        return None;
    }
    Some(CsvExport {
        filename: export_filename(dataset, date),
        content: table.to_csv(),
    })
}

fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn submissions_table(records: &[NormalizedSubmission]) -> CsvTable {
    let mut table = CsvTable::new(&[
        "ID",
        "Timestamp",
        "Full Name",
        "Email",
        "Role",
        "Nursery",
        "Total Questions",
        "Answered Questions",
        "Compliance Rate",
        "Complete Form Data",
    ]);
    for (index, record) in records.iter().enumerate() {
        table.push(vec![
            (index + 1).to_string(),
            timestamp(record.submitted_at),
            record.full_name.clone(),
            record.email.clone(),
            record.role.clone(),
            record.nursery_or("").to_string(),
            record.data.total_questions.to_string(),
            record.data.answered_questions.to_string(),
            format!("{}%", submission_rate(&record.data)),
            flatten_payload(&record.payload),
        ]);
    }
    table
}

pub fn ratios_table(ratios: &[StaffRatio]) -> CsvTable {
    let mut table = CsvTable::new(&[
        "ID",
        "Branch",
        "Room",
        "Age Group",
        "Staff Count",
        "Children Count",
        "Required Ratio",
        "Actual Ratio",
        "Status",
        "Created At",
        "Updated At",
    ]);
    for (index, ratio) in ratios.iter().enumerate() {
        table.push(vec![
            (index + 1).to_string(),
            ratio.branch.clone(),
            ratio.room.clone(),
            ratio.age_group.clone(),
            ratio.staff_count.to_string(),
            ratio.children_count.to_string(),
            ratio.required_ratio.clone(),
            ratio.actual_ratio.clone(),
            ratio.status.clone(),
            timestamp(ratio.created_at),
            timestamp(ratio.updated_at),
        ]);
    }
    table
}

pub fn enrollment_table(entries: &[Enrollment]) -> CsvTable {
    let mut table = CsvTable::new(&[
        "ID",
        "Site",
        "Date",
        "Staff Count",
        "Children Enrolled",
        "Children Present",
        "Planned Capacity",
        "Occupancy Rate",
        "Staff Attendance Rate",
        "Created At",
        "Updated At",
    ]);
    for (index, entry) in entries.iter().enumerate() {
        table.push(vec![
            (index + 1).to_string(),
            entry.site.clone(),
            entry.date.to_string(),
            entry.staff_count.to_string(),
            entry.children_enrolled.to_string(),
            entry.children_present.to_string(),
            entry.planned_capacity.unwrap_or(0).to_string(),
            format!("{}%", entry.occupancy_rate),
            format!("{}%", entry.staff_attendance_rate),
            timestamp(entry.created_at),
            timestamp(entry.updated_at),
        ]);
    }
    table
}

pub fn room_planner_table(plans: &[RoomPlan]) -> CsvTable {
    let mut table = CsvTable::new(&[
        "ID",
        "Site",
        "Room Name",
        "Age Group",
        "Ratio",
        "Mon Children",
        "Tue Children",
        "Wed Children",
        "Thu Children",
        "Fri Children",
        "Mon Staff",
        "Tue Staff",
        "Wed Staff",
        "Thu Staff",
        "Fri Staff",
        "Created At",
        "Updated At",
    ]);
    for (index, plan) in plans.iter().enumerate() {
        let mut row = vec![
            (index + 1).to_string(),
            plan.site.clone(),
            plan.room_name.clone(),
            plan.age_group.clone(),
            plan.ratio.clone(),
        ];
        row.extend(plan.children_by_day().iter().map(i32::to_string));
        row.extend(plan.staff_by_day().iter().map(i32::to_string));
        row.push(timestamp(plan.created_at));
        row.push(timestamp(plan.updated_at));
        table.push(row);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Submission;
    use crate::pipeline::normalize::normalize;
    use chrono::TimeZone;
    use serde_json::json;
    use uuid::Uuid;

    /// Minimal RFC 4180 reader, enough to check what `to_csv` writes.
    fn parse_csv(text: &str) -> Vec<Vec<String>> {
        let mut rows = Vec::new();
        let mut row = Vec::new();
        let mut field = String::new();
        let mut quoted = false;
        let mut chars = text.chars().peekable();

        while let Some(ch) = chars.next() {
            if quoted {
                match ch {
                    '"' if chars.peek() == Some(&'"') => {
                        chars.next();
                        field.push('"');
                    }
                    '"' => quoted = false,
                    other => field.push(other),
                }
            } else {
                match ch {
                    '"' => quoted = true,
                    ',' => row.push(std::mem::take(&mut field)),
                    '\n' => {
                        row.push(std::mem::take(&mut field));
                        rows.push(std::mem::take(&mut row));
                    }
                    other => field.push(other),
                }
            }
        }
        row.push(field);
        rows.push(row);
        rows
    }

    fn submission(name: &str, data: serde_json::Value) -> NormalizedSubmission {
        normalize(&Submission {
            id: Uuid::new_v4(),
            full_name: name.to_string(),
            email: "staff@example.org".to_string(),
            role: "Room Leader".to_string(),
            submitted_at: Utc.with_ymd_and_hms(2024, 5, 2, 7, 45, 0).unwrap(),
            submission_data: data,
        })
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("two\nlines"), "\"two\nlines\"");
        assert_eq!(escape_field(""), "");
    }

    #[test]
    fn test_filename() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        assert_eq!(
            export_filename(Dataset::FormSubmissions, date),
            "form-submissions-2024-05-02.csv"
        );
        assert_eq!(Dataset::try_from("room-planner"), Ok(Dataset::RoomPlanner));
        assert!(Dataset::try_from("users").is_err());
    }

    #[test]
    fn test_empty_table_has_no_export() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        assert_eq!(build_export(Dataset::FormSubmissions, &submissions_table(&[]), date), None);
    }

    #[test]
    fn test_submissions_csv_round_trip() {
        let records = vec![
            submission(
                "O'Neil, Sam",
                json!({
                    "nursery_name": "Oak \"Main\" House",
                    "total_questions": 10,
                    "answered_questions": 5,
                    "responses": {"staff_absences": "Jo, Kim", "fire_safety_check": "yes"}
                }),
            ),
            submission("Ana", json!("not json")),
        ];
        let table = submissions_table(&records);
        let parsed = parse_csv(&table.to_csv());

        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0], table.headers);
        assert_eq!(parsed[1], table.rows[0]);
        assert_eq!(parsed[2], table.rows[1]);

        assert_eq!(parsed[1][0], "1");
        assert_eq!(parsed[1][1], "2024-05-02T07:45:00.000Z");
        assert_eq!(parsed[1][2], "O'Neil, Sam");
        assert_eq!(parsed[1][5], "Oak \"Main\" House");
        assert_eq!(parsed[1][8], "50%");
        assert!(parsed[1][9].contains("Staff Absences: Jo, Kim"));
        assert!(parsed[1][9].contains("Fire Safety Check: Yes"));

        assert_eq!(parsed[2][5], "");
        assert_eq!(parsed[2][8], "0%");
        assert_eq!(parsed[2][9], "No data available");
    }

    #[test]
    fn test_room_planner_columns() {
        let now = Utc.with_ymd_and_hms(2024, 7, 29, 8, 0, 0).unwrap();
        let plan = RoomPlan {
            id: Uuid::new_v4(),
            site: "Perkins".to_string(),
            room_name: "Baby Room".to_string(),
            age_group: "0-2".to_string(),
            ratio: "1:3".to_string(),
            monday_children: 11,
            tuesday_children: 9,
            wednesday_children: 11,
            thursday_children: 11,
            friday_children: 9,
            monday_staff: 4,
            tuesday_staff: 3,
            wednesday_staff: 4,
            thursday_staff: 4,
            friday_staff: 3,
            created_at: now,
            updated_at: now,
        };
        let table = room_planner_table(&[plan]);
        assert_eq!(table.headers.len(), 17);
        assert_eq!(
            table.to_csv().lines().nth(1),
            Some("1,Perkins,Baby Room,0-2,1:3,11,9,11,11,9,4,3,4,4,3,2024-07-29T08:00:00.000Z,2024-07-29T08:00:00.000Z")
        );
    }
}
