use crate::db::{self, RecordTable};
use crate::domain::records::{NewEnrollment, NewRoomPlan, NewStaffRatio};
use anyhow::Result;
use chrono::NaiveDate;
use sqlx::PgPool;

/// Fills the record tables with a small demo data set. Each table is only
/// seeded while it is empty, so restarts never duplicate rows.
pub async fn seed_demo_records(pool: &PgPool) -> Result<()> {
    seed_staff_ratios(pool).await?;
    seed_enrollment(pool).await?;
    seed_room_plans(pool).await?;
    Ok(())
}

async fn is_empty(pool: &PgPool, table: RecordTable) -> Result<bool> {
    let existing = db::count_rows(pool, table).await?;
    if existing > 0 {
        tracing::debug!("{} already has {} row(s), skipping seed", table.as_str(), existing);
    }
    Ok(existing == 0)
}

fn demo_ratios() -> Vec<NewStaffRatio> {
    let ratio = |room: &str, age_group: &str, staff, children, required: &str| NewStaffRatio {
        branch: "Site A".to_string(),
        room: room.to_string(),
        age_group: age_group.to_string(),
        staff_count: staff,
        children_count: children,
        required_ratio: required.to_string(),
    };
    vec![
        ratio("101", "1-2 yrs", 2, 6, "1:3"),
        ratio("102", "3-4 yrs", 1, 12, "1:6"),
    ]
}

fn demo_enrollment() -> Vec<NewEnrollment> {
    let date = NaiveDate::from_ymd_opt(2024, 1, 15);
    let entry = |site: &str, staff, enrolled, present| {
        date.map(|date| NewEnrollment {
            site: site.to_string(),
            date,
            staff_count: staff,
            children_enrolled: enrolled,
            children_present: present,
            planned_capacity: None,
            staff_attendance_rate: None,
        })
    };
    [entry("Site A", 12, 68, 65), entry("Site B", 8, 45, 42)]
        .into_iter()
        .flatten()
        .collect()
}

fn demo_room_plans() -> Vec<NewRoomPlan> {
    let plan = |room: &str, age_group: &str, ratio: &str, children: [i32; 5], staff: [i32; 5]| {
        NewRoomPlan {
            site: "Perkins".to_string(),
            room_name: room.to_string(),
            age_group: age_group.to_string(),
            ratio: ratio.to_string(),
            children,
            staff,
        }
    };
    vec![
        plan("Perkins Baby Room", "0-2 yrs", "1:3", [11, 9, 11, 11, 9], [4, 3, 4, 4, 3]),
        plan("Perkins Pre-School Room", "3-5 yrs", "1:8", [8, 9, 10, 7, 6], [1, 2, 2, 1, 1]),
        plan("Perkins Toddler Room", "2-3 yrs", "1:4", [7, 8, 6, 7, 6], [2, 2, 2, 2, 2]),
    ]
}

async fn seed_staff_ratios(pool: &PgPool) -> Result<()> {
    if !is_empty(pool, RecordTable::StaffChildRatios).await? {
        return Ok(());
    }
    let ratios = demo_ratios();
    for ratio in &ratios {
        let assessment = ratio.assess()?;
        db::insert_staff_ratio(pool, ratio, &assessment).await?;
    }
    tracing::info!("Seeded {} staff-child ratio rows", ratios.len());
    Ok(())
}

async fn seed_enrollment(pool: &PgPool) -> Result<()> {
    if !is_empty(pool, RecordTable::EnrollmentAttendance).await? {
        return Ok(());
    }
    let entries = demo_enrollment();
    for entry in &entries {
        let occupancy = entry.occupancy_rate()?;
        db::insert_enrollment(pool, entry, occupancy).await?;
    }
    tracing::info!("Seeded {} enrollment rows", entries.len());
    Ok(())
}

async fn seed_room_plans(pool: &PgPool) -> Result<()> {
    if !is_empty(pool, RecordTable::RoomPlanner).await? {
        return Ok(());
    }
    let plans = demo_room_plans();
    for plan in &plans {
        plan.validate()?;
        db::insert_room_plan(pool, plan).await?;
    }
    tracing::info!("Seeded {} room planner rows", plans.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::records::RatioStatus;

    #[test]
    fn test_demo_records_are_valid() {
        let statuses: Vec<_> = demo_ratios()
            .iter()
            .map(|r| r.assess().unwrap().status)
            .collect();
        assert_eq!(statuses, vec![RatioStatus::Compliant, RatioStatus::NonCompliant]);

        let occupancy: Vec<_> = demo_enrollment()
            .iter()
            .map(|e| e.occupancy_rate().unwrap())
            .collect();
        assert_eq!(occupancy, vec![95.6, 93.3]);

        for plan in demo_room_plans() {
            plan.validate().unwrap();
        }
    }
}
