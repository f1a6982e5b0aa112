//! Derived figures computed from cached query data.
//!
//! Everything here is a pure function over already-fetched collections,
//! so the dashboard and detail views never issue requests of their own.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};

use crate::models::{
    AttendanceRecord, AttendanceStatus, Child, ChildStatus, Message, Milestone, Observation,
    ObservationCategory,
};

/// Whole years of age on `today`, using the mean year length so leap
/// years do not shift a birthday by a day.
pub fn age_in_years(date_of_birth: NaiveDate, today: NaiveDate) -> u32 {
    let days = (today - date_of_birth).num_days();
    if days <= 0 {
        return 0;
    }
    (days as f64 / 365.25).floor() as u32
}

/// Present days as a rounded percentage of scheduled days. Not-scheduled
/// records are excluded from the denominator; with no scheduled days the
/// figure is 0.
pub fn attendance_percentage(records: &[AttendanceRecord]) -> u32 {
    let present = records
        .iter()
        .filter(|r| r.status == AttendanceStatus::Present)
        .count();
    let absent = records
        .iter()
        .filter(|r| r.status == AttendanceStatus::Absent)
        .count();
    let scheduled = present + absent;
    if scheduled == 0 {
        return 0;
    }
    (present as f64 / scheduled as f64 * 100.0).round() as u32
}

/// Achieved milestones in a category as `(achieved, total)`
pub fn category_completion(
    milestones: &[Milestone],
    category: ObservationCategory,
) -> (usize, usize) {
    let in_category: Vec<_> = milestones.iter().filter(|m| m.category == category).collect();
    let achieved = in_category.iter().filter(|m| m.achieved).count();
    (achieved, in_category.len())
}

/// Category completion as a rounded percentage, 0 for an empty category
pub fn completion_percentage(
    milestones: &[Milestone],
    category: ObservationCategory,
) -> u32 {
    let (achieved, total) = category_completion(milestones, category);
    if total == 0 {
        return 0;
    }
    (achieved as f64 / total as f64 * 100.0).round() as u32
}

pub fn active_children(children: &[Child]) -> usize {
    children
        .iter()
        .filter(|c| c.status == ChildStatus::Active)
        .count()
}

/// Today's attendance figure for the dashboard, from the day's records
pub fn present_today(records: &[AttendanceRecord]) -> usize {
    records
        .iter()
        .filter(|r| r.status == AttendanceStatus::Present)
        .count()
}

pub fn unread_count(messages: &[Message]) -> usize {
    messages.iter().filter(|m| !m.read).count()
}

/// Distinct senders across unread messages
pub fn unread_senders(messages: &[Message]) -> usize {
    messages
        .iter()
        .filter(|m| !m.read)
        .map(|m| m.sender.id.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// Observations recorded during the ISO week containing `today`
pub fn observations_this_week(observations: &[Observation], today: NaiveDate) -> usize {
    let week = today.iso_week();
    observations
        .iter()
        .filter(|o| {
            let w = o.date.iso_week();
            w.year() == week.year() && w.week() == week.week()
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::UserRef;
    use chrono::Utc;

    fn record(status: AttendanceStatus) -> AttendanceRecord {
        AttendanceRecord {
            id: "a1".into(),
            child_id: "c1".into(),
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            status,
            arrival_time: None,
            pickup_time: None,
            notes: None,
        }
    }

    #[test]
    fn test_age_floors_partial_years() {
        let dob = NaiveDate::from_ymd_opt(2022, 6, 15).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 6, 14).unwrap();
        assert_eq!(age_in_years(dob, today), 3);
        let today = NaiveDate::from_ymd_opt(2026, 6, 16).unwrap();
        assert_eq!(age_in_years(dob, today), 4);
    }

    #[test]
    fn test_age_never_negative() {
        let dob = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        assert_eq!(age_in_years(dob, today), 0);
    }

    #[test]
    fn test_attendance_percentage_rounds() {
        let mut records: Vec<_> = (0..19).map(|_| record(AttendanceStatus::Present)).collect();
        records.extend((0..5).map(|_| record(AttendanceStatus::Absent)));
        // Not-scheduled days stay out of the denominator
        records.push(record(AttendanceStatus::NotScheduled));
        assert_eq!(attendance_percentage(&records), 79);
    }

    #[test]
    fn test_attendance_percentage_no_scheduled_days() {
        assert_eq!(attendance_percentage(&[]), 0);
        let records = vec![record(AttendanceStatus::NotScheduled)];
        assert_eq!(attendance_percentage(&records), 0);
    }

    #[test]
    fn test_category_completion() {
        let milestone = |category, achieved| Milestone {
            category,
            description: "walks steadily".into(),
            achieved,
            achieved_date: None,
        };
        let milestones = vec![
            milestone(ObservationCategory::Physical, true),
            milestone(ObservationCategory::Physical, false),
            milestone(ObservationCategory::Literacy, true),
        ];
        assert_eq!(
            category_completion(&milestones, ObservationCategory::Physical),
            (1, 2)
        );
        assert_eq!(
            category_completion(&milestones, ObservationCategory::Numeracy),
            (0, 0)
        );
        assert_eq!(
            completion_percentage(&milestones, ObservationCategory::Physical),
            50
        );
        assert_eq!(
            completion_percentage(&milestones, ObservationCategory::Numeracy),
            0
        );
    }

    #[test]
    fn test_unread_senders_distinct() {
        let message = |id: &str, sender: &str, read| Message {
            id: id.into(),
            sender: UserRef {
                id: sender.into(),
                first_name: "Pat".into(),
                last_name: "Lee".into(),
            },
            recipient: UserRef {
                id: "staff1".into(),
                first_name: "Sam".into(),
                last_name: "Riva".into(),
            },
            subject: "pickup".into(),
            content: "running late".into(),
            read,
            created_at: Utc::now(),
            parent_id: None,
            replies: vec![],
        };
        let messages = vec![
            message("m1", "p1", false),
            message("m2", "p1", false),
            message("m3", "p2", false),
            message("m4", "p3", true),
        ];
        assert_eq!(unread_count(&messages), 3);
        assert_eq!(unread_senders(&messages), 2);
    }

    #[test]
    fn test_observations_this_week() {
        let observation = |date: NaiveDate| Observation {
            id: "o1".into(),
            child_id: "c1".into(),
            title: "block tower".into(),
            date,
            category: ObservationCategory::Creative,
            details: "stacked six blocks".into(),
            development_area: None,
            next_steps: None,
            media: vec![],
        };
        // 2026-08-29 is a Saturday; its ISO week runs Mon 24th to Sun 30th
        let today = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        let observations = vec![
            observation(NaiveDate::from_ymd_opt(2026, 8, 24).unwrap()),
            observation(NaiveDate::from_ymd_opt(2026, 8, 30).unwrap()),
            observation(NaiveDate::from_ymd_opt(2026, 8, 23).unwrap()),
        ];
        assert_eq!(observations_this_week(&observations, today), 2);
    }
}
