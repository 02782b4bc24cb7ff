use std::collections::HashSet;

use tracing::{debug, info};

use crate::models::{
    AttendanceStatus, AttendanceTally, Committee, CommitteeOverview, CommitteeStats, Meeting,
    ScopeStats, StatusTriple,
};
use crate::rounding::fair_round;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregationOptions {
    /// Leave meetings without any recorded attendance out of the meeting
    /// count and the averages. By default they count as meetings where
    /// nobody was present, absent or excused.
    pub exclude_unrecorded_meetings: bool,
}

/// Builds overview rows for every committee that can be assessed. Committees
/// without a chair or standing members are dropped.
pub fn overview_rows(committees: &[Committee]) -> Vec<CommitteeOverview> {
    committees
        .iter()
        .filter(|committee| {
            let assessable = committee.is_assessable();
            if !assessable {
                info!(
                    committee = %committee.title,
                    "excluding committee without chair or permanent members"
                );
            }
            assessable
        })
        .map(|committee| CommitteeOverview::new(committee.clone(), 0))
        .collect()
}

/// Recomputes attendance statistics for each overview row from the given
/// meetings and returns the updated working copy. Rows without meetings in
/// `meetings` keep whatever statistics they had.
pub fn aggregate_committees(
    rows: &[CommitteeOverview],
    meetings: &[Meeting],
    options: &AggregationOptions,
) -> Vec<CommitteeOverview> {
    let mut updated = Vec::with_capacity(rows.len());

    for row in rows {
        let mut row = row.clone();

        if !row.committee.is_assessable() {
            info!(
                committee = %row.committee.title,
                "excluding committee without chair or permanent members"
            );
            continue;
        }

        let committee_meetings: Vec<&Meeting> = meetings
            .iter()
            .filter(|meeting| meeting.committee_title == row.committee.title)
            .collect();
        let unrecorded = committee_meetings
            .iter()
            .filter(|meeting| meeting.is_unrecorded())
            .count();

        let counted: Vec<&Meeting> = if options.exclude_unrecorded_meetings {
            committee_meetings
                .iter()
                .copied()
                .filter(|meeting| !meeting.is_unrecorded())
                .collect()
        } else {
            committee_meetings
        };

        row.meeting_count = counted.len();
        if counted.is_empty() {
            debug!(committee = %row.committee.title, "no meetings in selection");
            updated.push(row);
            continue;
        }

        let mut stats = committee_stats(&row.committee, &counted);
        stats.unrecorded_meetings = unrecorded;
        if unrecorded > 0 {
            debug!(
                committee = %row.committee.title,
                unrecorded,
                excluded = options.exclude_unrecorded_meetings,
                "meetings without recorded attendance"
            );
        }
        row.stats = Some(stats);
        updated.push(row);
    }

    updated
}

/// Statistics for one committee over a non-empty set of its meetings.
pub fn committee_stats(committee: &Committee, meetings: &[&Meeting]) -> CommitteeStats {
    let roll: HashSet<&str> = committee.permanent_roll().into_iter().collect();

    let all = scope_stats(meetings, |_| true);
    let permanent = scope_stats(meetings, |name| roll.contains(name));

    CommitteeStats {
        all,
        permanent,
        unrecorded_meetings: 0,
    }
}

fn scope_stats(meetings: &[&Meeting], include: impl Fn(&str) -> bool) -> ScopeStats {
    let include = &include;

    let counts = StatusTriple::from_fn(|status| {
        AttendanceTally::from_names(
            meetings
                .iter()
                .filter_map(|meeting| meeting.attendees(status))
                .flatten()
                .map(|attendee| attendee.name.as_str())
                .filter(|&name| include(name)),
        )
    });

    let averages = StatusTriple::from_fn(|status| {
        let occurrences: usize = meetings
            .iter()
            .map(|meeting| {
                meeting.attendees(status).map_or(0, |attendees| {
                    attendees
                        .iter()
                        .filter(|attendee| include(attendee.name.as_str()))
                        .count()
                })
            })
            .sum();
        average(occurrences, meetings.len())
    });

    let rounded = fair_round(&averages.values());
    let rounded = StatusTriple {
        present: rounded[0],
        absent: rounded[1],
        excused: rounded[2],
    };

    ScopeStats {
        counts,
        averages,
        rounded,
    }
}

fn average(total: usize, meetings: usize) -> f64 {
    if meetings == 0 {
        0.0
    } else {
        total as f64 / meetings as f64
    }
}
