pub mod seed;
pub mod store;

use crate::domain::models::{NewSubmission, Submission};
use crate::domain::records::{
    Enrollment, NewEnrollment, NewRoomPlan, NewStaffRatio, RatioAssessment, RoomPlan, StaffRatio,
};
use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn fetch_submissions(pool: &PgPool) -> Result<Vec<Submission>> {
    let rows = sqlx::query_as::<_, Submission>(
        r#"
        SELECT id, full_name, email, role, submitted_at, submission_data
        FROM form_submissions
        ORDER BY submitted_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn insert_submission(pool: &PgPool, submission: &NewSubmission) -> Result<Uuid> {
    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO form_submissions (full_name, email, role, submission_data)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(&submission.full_name)
    .bind(&submission.email)
    .bind(submission.role.as_str())
    .bind(&submission.submission_data)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

pub async fn fetch_staff_ratios(pool: &PgPool) -> Result<Vec<StaffRatio>> {
    let rows = sqlx::query_as::<_, StaffRatio>(
        r#"
        SELECT id, branch, room, age_group, staff_count, children_count,
               required_ratio, actual_ratio, status, created_at, updated_at
        FROM staff_child_ratios
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn insert_staff_ratio(
    pool: &PgPool,
    ratio: &NewStaffRatio,
    assessment: &RatioAssessment,
) -> Result<StaffRatio> {
    let row = sqlx::query_as::<_, StaffRatio>(
        r#"
        INSERT INTO staff_child_ratios
            (branch, room, age_group, staff_count, children_count, required_ratio, actual_ratio, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, branch, room, age_group, staff_count, children_count,
                  required_ratio, actual_ratio, status, created_at, updated_at
        "#,
    )
    .bind(ratio.branch.trim())
    .bind(ratio.room.trim())
    .bind(ratio.age_group.trim())
    .bind(ratio.staff_count)
    .bind(ratio.children_count)
    .bind(ratio.required_ratio.trim())
    .bind(&assessment.actual_ratio)
    .bind(assessment.status.as_str())
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn fetch_enrollment(pool: &PgPool) -> Result<Vec<Enrollment>> {
    let rows = sqlx::query_as::<_, Enrollment>(
        r#"
        SELECT id, site, date, staff_count, children_enrolled, children_present,
               planned_capacity, occupancy_rate, staff_attendance_rate, created_at, updated_at
        FROM enrollment_attendance
        ORDER BY date DESC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn insert_enrollment(
    pool: &PgPool,
    entry: &NewEnrollment,
    occupancy_rate: f64,
) -> Result<Enrollment> {
    let row = sqlx::query_as::<_, Enrollment>(
        r#"
        INSERT INTO enrollment_attendance
            (site, date, staff_count, children_enrolled, children_present,
             planned_capacity, occupancy_rate, staff_attendance_rate)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, site, date, staff_count, children_enrolled, children_present,
                  planned_capacity, occupancy_rate, staff_attendance_rate, created_at, updated_at
        "#,
    )
    .bind(entry.site.trim())
    .bind(entry.date)
    .bind(entry.staff_count)
    .bind(entry.children_enrolled)
    .bind(entry.children_present)
    .bind(entry.planned_capacity)
    .bind(occupancy_rate)
    .bind(entry.staff_attendance_rate())
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn fetch_room_plans(pool: &PgPool) -> Result<Vec<RoomPlan>> {
    let rows = sqlx::query_as::<_, RoomPlan>(
        r#"
        SELECT id, site, room_name, age_group, ratio,
               monday_children, tuesday_children, wednesday_children, thursday_children, friday_children,
               monday_staff, tuesday_staff, wednesday_staff, thursday_staff, friday_staff,
               created_at, updated_at
        FROM room_planner
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn insert_room_plan(pool: &PgPool, plan: &NewRoomPlan) -> Result<()> {
    let [mon_c, tue_c, wed_c, thu_c, fri_c] = plan.children;
    let [mon_s, tue_s, wed_s, thu_s, fri_s] = plan.staff;
    sqlx::query(
        r#"
        INSERT INTO room_planner
            (site, room_name, age_group, ratio,
             monday_children, tuesday_children, wednesday_children, thursday_children, friday_children,
             monday_staff, tuesday_staff, wednesday_staff, thursday_staff, friday_staff)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#,
    )
    .bind(&plan.site)
    .bind(&plan.room_name)
    .bind(&plan.age_group)
    .bind(&plan.ratio)
    .bind(mon_c)
    .bind(tue_c)
    .bind(wed_c)
    .bind(thu_c)
    .bind(fri_c)
    .bind(mon_s)
    .bind(tue_s)
    .bind(wed_s)
    .bind(thu_s)
    .bind(fri_s)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn count_rows(pool: &PgPool, table: RecordTable) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table.as_str()))
        .fetch_one(pool)
        .await?;
    Ok(count)
}

#[derive(Debug, Clone, Copy)]
pub enum RecordTable {
    StaffChildRatios,
    EnrollmentAttendance,
    RoomPlanner,
}

impl RecordTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordTable::StaffChildRatios => "staff_child_ratios",
            RecordTable::EnrollmentAttendance => "enrollment_attendance",
            RecordTable::RoomPlanner => "room_planner",
        }
    }
}
