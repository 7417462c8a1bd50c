//! Operational record tables kept alongside the questionnaires: staff-child
//! ratios, enrollment/attendance and the weekly room plan.
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const WEEKDAYS: [&str; 5] = ["Mon", "Tue", "Wed", "Thu", "Fri"];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("`{0}` must not be blank")]
    Blank(&'static str),
    #[error("`{0}` must not be negative")]
    Negative(&'static str),
    #[error("ratio `{0}` is not in the form 1:N")]
    InvalidRatio(String),
    #[error("staff count must be at least 1")]
    NoStaff,
    #[error("children enrolled must be at least 1")]
    NoneEnrolled,
}

/// Parses a `1:N` ratio and returns `N`.
pub fn parse_ratio(raw: &str) -> Result<u32, RecordError> {
    let invalid = || RecordError::InvalidRatio(raw.to_string());
    let (staff, children) = raw.trim().split_once(':').ok_or_else(invalid)?;
    if staff.trim() != "1" {
        return Err(invalid());
    }
    match children.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(invalid()),
    }
}

fn require_text(value: &str, field: &'static str) -> Result<(), RecordError> {
    if value.trim().is_empty() {
        Err(RecordError::Blank(field))
    } else {
        Ok(())
    }
}

fn require_count(value: i32, field: &'static str) -> Result<(), RecordError> {
    if value < 0 {
        Err(RecordError::Negative(field))
    } else {
        Ok(())
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RatioStatus {
    Compliant,
    NonCompliant,
}

impl RatioStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RatioStatus::Compliant => "compliant",
            RatioStatus::NonCompliant => "non-compliant",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StaffRatio {
    pub id: Uuid,
    pub branch: String,
    pub room: String,
    pub age_group: String,
    pub staff_count: i32,
    pub children_count: i32,
    pub required_ratio: String,
    pub actual_ratio: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewStaffRatio {
    pub branch: String,
    pub room: String,
    pub age_group: String,
    pub staff_count: i32,
    pub children_count: i32,
    pub required_ratio: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatioAssessment {
    pub actual_ratio: String,
    pub status: RatioStatus,
}

impl NewStaffRatio {
    /// Actual ratio is `1:ceil(children / staff)`; the room is compliant when
    /// `children <= staff * N` for a required ratio of `1:N`.
    pub fn assess(&self) -> Result<RatioAssessment, RecordError> {
        require_text(&self.branch, "branch")?;
        require_text(&self.room, "room")?;
        require_text(&self.age_group, "age_group")?;
        require_count(self.children_count, "children_count")?;
        if self.staff_count < 1 {
            return Err(RecordError::NoStaff);
        }
        let per_staff = parse_ratio(&self.required_ratio)?;

        let staff = i64::from(self.staff_count);
        let children = i64::from(self.children_count);
        let actual = (children + staff - 1) / staff;
        let status = if children <= staff * i64::from(per_staff) {
            RatioStatus::Compliant
        } else {
            RatioStatus::NonCompliant
        };

        Ok(RatioAssessment {
            actual_ratio: format!("1:{actual}"),
            status,
        })
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Enrollment {
    pub id: Uuid,
    pub site: String,
    pub date: NaiveDate,
    pub staff_count: i32,
    pub children_enrolled: i32,
    pub children_present: i32,
    pub planned_capacity: Option<i32>,
    pub occupancy_rate: f64,
    pub staff_attendance_rate: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEnrollment {
    pub site: String,
    pub date: NaiveDate,
    pub staff_count: i32,
    pub children_enrolled: i32,
    pub children_present: i32,
    pub planned_capacity: Option<i32>,
    pub staff_attendance_rate: Option<f64>,
}

impl NewEnrollment {
    pub fn validate(&self) -> Result<(), RecordError> {
        require_text(&self.site, "site")?;
        require_count(self.staff_count, "staff_count")?;
        require_count(self.children_present, "children_present")?;
        if let Some(capacity) = self.planned_capacity {
            require_count(capacity, "planned_capacity")?;
        }
        if self.children_enrolled < 1 {
            return Err(RecordError::NoneEnrolled);
        }
        Ok(())
    }

    /// Present over enrolled as a percentage, one decimal place.
    pub fn occupancy_rate(&self) -> Result<f64, RecordError> {
        self.validate()?;
        Ok(round1(
            f64::from(self.children_present) / f64::from(self.children_enrolled) * 100.0,
        ))
    }

    pub fn staff_attendance_rate(&self) -> f64 {
        self.staff_attendance_rate
            .map(|rate| round1(rate.clamp(0.0, 100.0)))
            .unwrap_or(100.0)
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RoomPlan {
    pub id: Uuid,
    pub site: String,
    pub room_name: String,
    pub age_group: String,
    pub ratio: String,
    pub monday_children: i32,
    pub tuesday_children: i32,
    pub wednesday_children: i32,
    pub thursday_children: i32,
    pub friday_children: i32,
    pub monday_staff: i32,
    pub tuesday_staff: i32,
    pub wednesday_staff: i32,
    pub thursday_staff: i32,
    pub friday_staff: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RoomPlan {
    pub fn children_by_day(&self) -> [i32; 5] {
        [
            self.monday_children,
            self.tuesday_children,
            self.wednesday_children,
            self.thursday_children,
            self.friday_children,
        ]
    }

    pub fn staff_by_day(&self) -> [i32; 5] {
        [
            self.monday_staff,
            self.tuesday_staff,
            self.wednesday_staff,
            self.thursday_staff,
            self.friday_staff,
        ]
    }

    /// Staff needed per weekday, `children / N` to one decimal.
    pub fn staff_required(&self) -> Result<[f64; 5], RecordError> {
        let per_staff = f64::from(parse_ratio(&self.ratio)?);
        Ok(self
            .children_by_day()
            .map(|children| round1(f64::from(children.max(0)) / per_staff)))
    }

    /// Whole staff members needed per weekday.
    pub fn staff_headcount(&self) -> Result<[i64; 5], RecordError> {
        let per_staff = i64::from(parse_ratio(&self.ratio)?);
        Ok(self
            .children_by_day()
            .map(|children| (i64::from(children.max(0)) + per_staff - 1) / per_staff))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRoomPlan {
    pub site: String,
    pub room_name: String,
    pub age_group: String,
    pub ratio: String,
    pub children: [i32; 5],
    pub staff: [i32; 5],
}

impl NewRoomPlan {
    pub fn validate(&self) -> Result<(), RecordError> {
        require_text(&self.site, "site")?;
        require_text(&self.room_name, "room_name")?;
        require_text(&self.age_group, "age_group")?;
        parse_ratio(&self.ratio)?;
        for count in self.children {
            require_count(count, "children")?;
        }
        for count in self.staff {
            require_count(count, "staff")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomPlanView {
    #[serde(flatten)]
    pub plan: RoomPlan,
    pub staff_required: Option<[f64; 5]>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WeeklyTotals {
    pub total_children: [i64; 5],
    pub staff_required: [i64; 5],
}

/// Site-wide daily totals. Plans with an unreadable ratio count toward
/// children but not staff.
pub fn weekly_totals(plans: &[RoomPlan]) -> WeeklyTotals {
    let mut totals = WeeklyTotals::default();
    for plan in plans {
        for (total, children) in totals.total_children.iter_mut().zip(plan.children_by_day()) {
            *total += i64::from(children.max(0));
        }
        match plan.staff_headcount() {
            Ok(headcount) => {
                for (total, needed) in totals.staff_required.iter_mut().zip(headcount) {
                    *total += needed;
                }
            }
            Err(e) => tracing::warn!("Room plan {} skipped in staff totals: {}", plan.id, e),
        }
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratio(staff: i32, children: i32, required: &str) -> NewStaffRatio {
        NewStaffRatio {
            branch: "Perkins".to_string(),
            room: "Baby Room".to_string(),
            age_group: "0-2".to_string(),
            staff_count: staff,
            children_count: children,
            required_ratio: required.to_string(),
        }
    }

    fn plan(name: &str, ratio: &str, children: [i32; 5]) -> RoomPlan {
        RoomPlan {
            id: Uuid::new_v4(),
            site: "Perkins".to_string(),
            room_name: name.to_string(),
            age_group: "mixed".to_string(),
            ratio: ratio.to_string(),
            monday_children: children[0],
            tuesday_children: children[1],
            wednesday_children: children[2],
            thursday_children: children[3],
            friday_children: children[4],
            monday_staff: 0,
            tuesday_staff: 0,
            wednesday_staff: 0,
            thursday_staff: 0,
            friday_staff: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_parse_ratio() {
        assert_eq!(parse_ratio("1:3"), Ok(3));
        assert_eq!(parse_ratio(" 1 : 13 "), Ok(13));
        assert!(parse_ratio("2:3").is_err());
        assert!(parse_ratio("1:0").is_err());
        assert!(parse_ratio("three").is_err());
    }

    #[test]
    fn test_ratio_assessment() {
        let ok = ratio(3, 9, "1:3").assess().unwrap();
        assert_eq!(ok.actual_ratio, "1:3");
        assert_eq!(ok.status, RatioStatus::Compliant);

        let over = ratio(3, 10, "1:3").assess().unwrap();
        assert_eq!(over.actual_ratio, "1:4");
        assert_eq!(over.status, RatioStatus::NonCompliant);

        assert_eq!(ratio(0, 4, "1:3").assess(), Err(RecordError::NoStaff));
        assert_eq!(ratio(2, -1, "1:3").assess(), Err(RecordError::Negative("children_count")));
    }

    #[test]
    fn test_occupancy_rate() {
        let entry = NewEnrollment {
            site: "Elm".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            staff_count: 6,
            children_enrolled: 45,
            children_present: 43,
            planned_capacity: Some(50),
            staff_attendance_rate: None,
        };
        assert_eq!(entry.occupancy_rate(), Ok(95.6));
        assert_eq!(entry.staff_attendance_rate(), 100.0);

        let empty = NewEnrollment {
            children_enrolled: 0,
            ..entry
        };
        assert_eq!(empty.occupancy_rate(), Err(RecordError::NoneEnrolled));
    }

    #[test]
    fn test_room_plan_staff_required() {
        let baby = plan("Baby Room", "1:3", [11, 9, 11, 11, 9]);
        assert_eq!(baby.staff_required().unwrap(), [3.7, 3.0, 3.7, 3.7, 3.0]);
        assert_eq!(baby.staff_headcount().unwrap(), [4, 3, 4, 4, 3]);
    }

    #[test]
    fn test_weekly_totals() {
        let plans = vec![
            plan("Baby Room", "1:3", [11, 9, 11, 11, 9]),
            plan("Pre-School Room", "1:8", [8, 9, 10, 7, 6]),
            plan("Toddler Room", "1:4", [7, 8, 6, 7, 6]),
        ];
        let totals = weekly_totals(&plans);
        assert_eq!(totals.total_children, [26, 26, 27, 25, 21]);
        assert_eq!(totals.staff_required, [7, 7, 8, 7, 6]);
    }

    #[test]
    fn test_bad_plan_ratio_skipped_for_staff() {
        let totals = weekly_totals(&[plan("Odd", "one to three", [3, 3, 3, 3, 3])]);
        assert_eq!(totals.total_children, [3; 5]);
        assert_eq!(totals.staff_required, [0; 5]);
    }
}
