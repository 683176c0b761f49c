//! Weekly schedule generation.
//!
//! A [`ScheduleTemplate`] (daily times, start date, weekdays, week count)
//! expands into concrete candidate intervals. The planner marks every
//! candidate that overlaps one of the lifeguard's existing shifts; the
//! gateway then submits the rest one by one. There is no rollback: each
//! shift is an independent resource and a partially created batch is
//! reported as such.
//!
//! Overlap is only checked against the same lifeguard's shifts. Several
//! lifeguards covering the same center at the same time is normal.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use lifeguard_types::{DayOfWeek, NewShift, ScheduleTemplate, Shift, ShiftId};
use serde::Serialize;

/// Days in a week.
const DAYS_PER_WEEK: u64 = 7;

/// Errors raised while expanding a template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    /// The template is malformed; nothing was generated.
    #[error("invalid schedule template: {reason}")]
    InvalidTemplate {
        /// What is wrong with the template.
        reason: String,
    },
}

fn invalid(reason: impl Into<String>) -> ScheduleError {
    ScheduleError::InvalidTemplate {
        reason: reason.into(),
    }
}

/// One concrete occurrence of the template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    /// Local calendar date of the occurrence.
    pub date: NaiveDate,
    /// Start instant.
    pub start_time: DateTime<Utc>,
    /// End instant.
    pub end_time: DateTime<Utc>,
    /// Existing shift this candidate collides with, if any.
    pub conflicts_with: Option<ShiftId>,
}

impl Candidate {
    /// Whether the candidate will be skipped.
    pub const fn is_conflict(&self) -> bool {
        self.conflicts_with.is_some()
    }
}

/// Every candidate of a template with its conflict verdict, in start order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchedulePlan {
    /// The template the plan was expanded from.
    pub template: ScheduleTemplate,
    /// All candidates, earliest first.
    pub candidates: Vec<Candidate>,
}

impl SchedulePlan {
    /// Creation requests for the non-conflicting candidates.
    pub fn requests(&self) -> Vec<NewShift> {
        self.candidates
            .iter()
            .filter(|c| !c.is_conflict())
            .map(|c| NewShift {
                lifeguard_id: self.template.lifeguard_id,
                center_id: self.template.center_id,
                start_time: c.start_time,
                end_time: c.end_time,
            })
            .collect()
    }

    /// Number of candidates that will be skipped.
    pub fn skipped_count(&self) -> usize {
        self.candidates.iter().filter(|c| c.is_conflict()).count()
    }
}

/// Outcome of running a plan against the collaborator.
///
/// Always returned, even when some creates failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScheduleReport {
    /// Ids of the shifts created, in start order.
    pub created: Vec<ShiftId>,
    /// Candidates skipped because of an overlap.
    pub skipped_count: usize,
    /// Candidates whose create request failed.
    pub failed_count: usize,
}

/// Reject templates that cannot produce valid shifts.
///
/// Runs before any expansion so a bad template fails the same way no
/// matter how many occurrences it would have produced.
///
/// # Errors
///
/// Returns [`ScheduleError::InvalidTemplate`].
pub fn validate_template(template: &ScheduleTemplate, max_weeks: u32) -> Result<(), ScheduleError> {
    if template.end_time <= template.start_time {
        return Err(invalid(format!(
            "daily end {} must be after daily start {}",
            template.end_time, template.start_time
        )));
    }
    if template.days.is_empty() {
        return Err(invalid("select at least one weekday"));
    }
    if template.weeks == 0 {
        return Err(invalid("weeks must be at least 1"));
    }
    if template.weeks > max_weeks {
        return Err(invalid(format!(
            "weeks must be at most {max_weeks}, got {}",
            template.weeks
        )));
    }
    Ok(())
}

/// Expand a template into candidate intervals, earliest first.
///
/// The n-th occurrence of a weekday is `start_date + week * 7 + offset`
/// days, where `offset` is the distance from `start_date` to the first
/// such weekday on or after it. Duplicate weekdays are ignored.
///
/// # Errors
///
/// Returns [`ScheduleError::InvalidTemplate`] if validation fails or a
/// date falls outside the calendar range.
pub fn expand_template(
    template: &ScheduleTemplate,
    site_offset: FixedOffset,
    max_weeks: u32,
) -> Result<Vec<Candidate>, ScheduleError> {
    validate_template(template, max_weeks)?;

    let days: BTreeSet<DayOfWeek> = template.days.iter().copied().collect();
    let mut candidates = Vec::new();

    for day in days {
        let first = first_on_or_after(template.start_date, day)?;
        for week in 0..u64::from(template.weeks) {
            let skip = week
                .checked_mul(DAYS_PER_WEEK)
                .ok_or_else(|| invalid("week offset overflow"))?;
            let date = first
                .checked_add_days(Days::new(skip))
                .ok_or_else(|| invalid("date out of range"))?;
            candidates.push(Candidate {
                date,
                start_time: local_instant(date, template.start_time, site_offset)?,
                end_time: local_instant(date, template.end_time, site_offset)?,
                conflicts_with: None,
            });
        }
    }

    candidates.sort_by_key(|c| c.start_time);
    Ok(candidates)
}

/// Expand a template and mark overlaps against the lifeguard's shifts.
///
/// `existing` may contain other lifeguards' shifts; they are ignored.
/// Candidates never overlap each other: each lies within one local day
/// and weekdays are deduplicated.
///
/// # Errors
///
/// Returns [`ScheduleError::InvalidTemplate`].
pub fn plan_weekly_schedule(
    template: &ScheduleTemplate,
    existing: &[Shift],
    site_offset: FixedOffset,
    max_weeks: u32,
) -> Result<SchedulePlan, ScheduleError> {
    let mut candidates = expand_template(template, site_offset, max_weeks)?;
    let own: Vec<&Shift> = existing
        .iter()
        .filter(|s| s.lifeguard_id == template.lifeguard_id)
        .collect();

    for candidate in &mut candidates {
        candidate.conflicts_with = own
            .iter()
            .find(|s| s.overlaps(candidate.start_time, candidate.end_time))
            .map(|s| s.id);
    }

    Ok(SchedulePlan {
        template: template.clone(),
        candidates,
    })
}

fn first_on_or_after(date: NaiveDate, day: DayOfWeek) -> Result<NaiveDate, ScheduleError> {
    let weekday = day.to_weekday();
    date.iter_days()
        .take(7)
        .find(|d| d.weekday() == weekday)
        .ok_or_else(|| invalid("date out of range"))
}

fn local_instant(
    date: NaiveDate,
    time: NaiveTime,
    offset: FixedOffset,
) -> Result<DateTime<Utc>, ScheduleError> {
    offset
        .from_local_datetime(&date.and_time(time))
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| invalid(format!("{date} {time} is not a valid local time")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Offset;
    use lifeguard_types::{CenterId, LifeguardId, ShiftStatus};

    use super::*;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    /// Monday 7 July 2025.
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 7).unwrap()
    }

    fn template() -> ScheduleTemplate {
        ScheduleTemplate {
            lifeguard_id: LifeguardId::new(),
            center_id: CenterId::new(),
            start_time: hm(9, 0),
            end_time: hm(17, 0),
            start_date: monday(),
            days: vec![DayOfWeek::Monday, DayOfWeek::Wednesday, DayOfWeek::Friday],
            weeks: 4,
        }
    }

    fn existing(t: &ScheduleTemplate, lifeguard_id: LifeguardId, date: NaiveDate) -> Shift {
        let start = local_instant(date, hm(12, 0), Utc.fix()).unwrap();
        let end = local_instant(date, hm(20, 0), Utc.fix()).unwrap();
        Shift {
            id: ShiftId::new(),
            lifeguard_id,
            center_id: t.center_id,
            start_time: start,
            end_time: end,
            status: ShiftStatus::Scheduled,
            check_in_time: None,
            check_in_location: None,
            check_out_time: None,
            lifeguard_name: None,
            center_name: None,
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn mon_wed_fri_for_four_weeks_is_twelve_candidates() {
        let candidates = expand_template(&template(), Utc.fix(), 52).unwrap();
        assert_eq!(candidates.len(), 12);
        let dates: Vec<u32> = candidates.iter().map(|c| c.date.day()).collect();
        assert_eq!(dates, vec![7, 9, 11, 14, 16, 18, 21, 23, 25, 28, 30, 1]);
        assert!(candidates.iter().all(|c| c.end_time > c.start_time));
    }

    #[test]
    fn one_overlap_skips_one_candidate() {
        let t = template();
        let wednesday = NaiveDate::from_ymd_opt(2025, 7, 16).unwrap();
        let clash = existing(&t, t.lifeguard_id, wednesday);
        let plan = plan_weekly_schedule(&t, &[clash.clone()], Utc.fix(), 52).unwrap();
        assert_eq!(plan.requests().len(), 11);
        assert_eq!(plan.skipped_count(), 1);
        let skipped = plan.candidates.iter().find(|c| c.is_conflict()).unwrap();
        assert_eq!(skipped.date, wednesday);
        assert_eq!(skipped.conflicts_with, Some(clash.id));
    }

    #[test]
    fn other_lifeguards_shifts_do_not_conflict() {
        let t = template();
        let other = existing(&t, LifeguardId::new(), monday());
        let plan = plan_weekly_schedule(&t, &[other], Utc.fix(), 52).unwrap();
        assert_eq!(plan.skipped_count(), 0);
    }

    #[test]
    fn start_date_mid_week_rolls_to_next_occurrence() {
        let mut t = template();
        // Thursday 10 July: first Monday is 14 July, first Friday 11 July.
        t.start_date = NaiveDate::from_ymd_opt(2025, 7, 10).unwrap();
        t.days = vec![DayOfWeek::Monday, DayOfWeek::Friday];
        t.weeks = 1;
        let dates: Vec<u32> = expand_template(&t, Utc.fix(), 52)
            .unwrap()
            .iter()
            .map(|c| c.date.day())
            .collect();
        assert_eq!(dates, vec![11, 14]);
    }

    #[test]
    fn end_before_start_fails_before_expansion() {
        let mut t = template();
        t.end_time = hm(8, 0);
        t.weeks = 10_000;
        assert!(matches!(
            expand_template(&t, Utc.fix(), 52),
            Err(ScheduleError::InvalidTemplate { .. })
        ));
    }

    #[test]
    fn empty_days_or_zero_weeks_are_invalid() {
        let mut t = template();
        t.days.clear();
        assert!(validate_template(&t, 52).is_err());
        let mut t = template();
        t.weeks = 0;
        assert!(validate_template(&t, 52).is_err());
        let mut t = template();
        t.weeks = 53;
        assert!(validate_template(&t, 52).is_err());
    }

    #[test]
    fn duplicate_weekdays_are_collapsed() {
        let mut t = template();
        t.days = vec![DayOfWeek::Monday, DayOfWeek::Monday];
        t.weeks = 2;
        assert_eq!(expand_template(&t, Utc.fix(), 52).unwrap().len(), 2);
    }

    #[test]
    fn local_times_follow_site_offset() {
        let mut t = template();
        t.weeks = 1;
        t.days = vec![DayOfWeek::Monday];
        let plus_two = FixedOffset::east_opt(7200).unwrap();
        let c = expand_template(&t, plus_two, 52).unwrap();
        let first = c.first().unwrap();
        assert_eq!(first.start_time, Utc.with_ymd_and_hms(2025, 7, 7, 7, 0, 0).unwrap());
    }

    #[test]
    fn requests_carry_template_identity() {
        let t = template();
        let plan = plan_weekly_schedule(&t, &[], Utc.fix(), 52).unwrap();
        assert!(plan
            .requests()
            .iter()
            .all(|r| r.lifeguard_id == t.lifeguard_id && r.center_id == t.center_id));
    }
}
