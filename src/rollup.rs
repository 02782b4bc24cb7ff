use std::collections::HashMap;

use crate::members::party_label;
use crate::models::{
    AttendanceStatus, CommitteeAttendance, CommitteeOverview, NonPermanentMemberRow,
    PartyAttendanceRow, PartyRoster, PermanentMemberRow, StatusTriple,
};

#[derive(Debug, Default)]
struct PermanentTotals {
    counts: StatusTriple<u32>,
    relevant_meetings: usize,
}

/// Number of committees in which each member holds a standing seat.
pub fn permanent_committee_counts(rows: &[CommitteeOverview]) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for row in rows {
        for name in row.committee.permanent_roll() {
            *counts.entry(name).or_insert(0) += 1;
        }
    }
    counts
}

/// Attendance of every member holding a standing seat in at least one
/// committee, summed over those committees. Members who never attended are
/// listed with zero counts. Ordered by attendance rate, highest first.
pub fn permanent_member_table(
    rows: &[CommitteeOverview],
    parties: &PartyRoster,
) -> Vec<PermanentMemberRow> {
    let mut order: Vec<&str> = Vec::new();
    let mut totals: HashMap<&str, PermanentTotals> = HashMap::new();

    for row in rows {
        for name in row.committee.permanent_roll() {
            let entry = totals.entry(name).or_insert_with(|| {
                order.push(name);
                PermanentTotals::default()
            });
            entry.relevant_meetings += row.meeting_count;
        }
    }

    for row in rows {
        let Some(stats) = row.current_stats() else {
            continue;
        };
        for status in AttendanceStatus::ALL {
            for member in stats.permanent.counts.get(status).iter() {
                let entry = totals.entry(member.name.as_str()).or_insert_with(|| {
                    order.push(member.name.as_str());
                    PermanentTotals::default()
                });
                *entry.counts.get_mut(status) += member.count;
            }
        }
    }

    let committee_counts = permanent_committee_counts(rows);
    let mut table: Vec<PermanentMemberRow> = order
        .into_iter()
        .filter_map(|name| totals.remove(name).map(|totals| (name, totals)))
        .map(|(name, totals)| PermanentMemberRow {
            name: name.to_string(),
            party: parties.resolve(name),
            present: totals.counts.present,
            absent: totals.counts.absent,
            excused: totals.counts.excused,
            relevant_meetings: totals.relevant_meetings,
            attendance_rate: attendance_rate(totals.counts.present, totals.relevant_meetings),
            permanent_committees: committee_counts.get(name).copied().unwrap_or(0),
        })
        .collect();

    table.sort_by(|a, b| b.attendance_rate.total_cmp(&a.attendance_rate));
    table
}

pub fn attendance_rate(present: u32, relevant_meetings: usize) -> f64 {
    if relevant_meetings == 0 {
        0.0
    } else {
        f64::from(present) / relevant_meetings as f64
    }
}

/// Members who were present at meetings of committees where they hold no
/// standing seat, with a per-committee breakdown. Ordered by number of such
/// attendances, highest first.
pub fn non_permanent_member_table(
    rows: &[CommitteeOverview],
    parties: &PartyRoster,
) -> Vec<NonPermanentMemberRow> {
    let mut order: Vec<&str> = Vec::new();
    let mut attended: HashMap<&str, Vec<CommitteeAttendance>> = HashMap::new();

    for row in rows {
        let Some(stats) = row.current_stats() else {
            continue;
        };
        for member in stats.all.counts.present.iter() {
            let name = member.name.as_str();
            if row.committee.holds_permanent_seat(name) {
                continue;
            }
            attended
                .entry(name)
                .or_insert_with(|| {
                    order.push(name);
                    Vec::new()
                })
                .push(CommitteeAttendance {
                    committee: row.committee.title.clone(),
                    count: member.count,
                });
        }
    }

    let committee_counts = permanent_committee_counts(rows);
    let mut table: Vec<NonPermanentMemberRow> = order
        .into_iter()
        .filter_map(|name| attended.remove(name).map(|per_committee| (name, per_committee)))
        .map(|(name, per_committee)| NonPermanentMemberRow {
            name: name.to_string(),
            party: parties.resolve(name),
            present: per_committee.iter().map(|entry| entry.count).sum(),
            per_committee,
            permanent_committees: committee_counts.get(name).copied().unwrap_or(0),
        })
        .collect();

    table.sort_by(|a, b| b.present.cmp(&a.present));
    table
}

/// Attendance records of all attendees summed per party. Every party of the
/// roster is listed; attendees without a party are grouped in a row with
/// `party: None` when there are any. Ordered by present share, lowest first.
pub fn party_attendance_table(
    rows: &[CommitteeOverview],
    parties: &PartyRoster,
) -> Vec<PartyAttendanceRow> {
    let mut table: Vec<PartyAttendanceRow> = parties
        .party_names()
        .map(|name| PartyAttendanceRow {
            party: Some(name.to_string()),
            counts: StatusTriple::default(),
        })
        .collect();
    let mut unknown = StatusTriple::<u32>::default();

    for row in rows {
        let Some(stats) = row.current_stats() else {
            continue;
        };
        for status in AttendanceStatus::ALL {
            for member in stats.all.counts.get(status).iter() {
                let target = match parties.party_of(&member.name) {
                    Some(party) => table
                        .iter_mut()
                        .find(|entry| entry.party.as_deref() == Some(party)),
                    None => None,
                };
                match target {
                    Some(entry) => *entry.counts.get_mut(status) += member.count,
                    None => *unknown.get_mut(status) += member.count,
                }
            }
        }
    }

    let unknown = PartyAttendanceRow {
        party: None,
        counts: unknown,
    };
    if unknown.total() > 0 {
        tracing::debug!(records = unknown.total(), "attendance records without a known party");
        table.push(unknown);
    }

    table.sort_by(|a, b| {
        a.share(AttendanceStatus::Present)
            .total_cmp(&b.share(AttendanceStatus::Present))
            .then_with(|| party_label(a.party.as_deref()).cmp(party_label(b.party.as_deref())))
    });
    table
}
