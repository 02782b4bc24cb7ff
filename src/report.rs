use std::fmt::Write;

use crate::members::party_label;
use crate::models::AttendanceStatus;
use crate::selection::{DashboardView, Selection};

pub fn build_report(view: &DashboardView, selection: &Selection) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Committee Attendance Report");
    let _ = writeln!(
        output,
        "Generated for {} ({} meetings in selection)",
        selection.describe(),
        view.meeting_count
    );
    match view.latest_meeting {
        Some(date) => {
            let _ = writeln!(output, "Data up to {}", date);
        }
        None => {
            let _ = writeln!(output, "No meetings recorded yet.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Committees");

    if view.overview.is_empty() {
        let _ = writeln!(output, "No committees match this selection.");
    } else {
        for row in view.overview.iter() {
            match row.current_stats() {
                Some(stats) => {
                    let rounded = &stats.permanent.rounded;
                    let _ = writeln!(
                        output,
                        "- {}: {} present, {} absent, {} excused per meeting across {} meetings",
                        row.committee.title,
                        rounded.present,
                        rounded.absent,
                        rounded.excused,
                        row.meeting_count
                    );
                }
                None => {
                    let _ = writeln!(output, "- {}: insufficient data", row.committee.title);
                }
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Parties");

    if view.parties.is_empty() {
        let _ = writeln!(output, "No party rosters loaded.");
    } else {
        for row in view.parties.iter() {
            let _ = writeln!(
                output,
                "- {}: {:.1}% present, {:.1}% absent, {:.1}% excused ({} records)",
                party_label(row.party.as_deref()),
                row.share(AttendanceStatus::Present),
                row.share(AttendanceStatus::Absent),
                row.share(AttendanceStatus::Excused),
                row.total()
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Permanent Members");

    if view.permanent_members.is_empty() {
        let _ = writeln!(output, "No permanent members in this selection.");
    } else {
        for row in view.permanent_members.iter() {
            let _ = writeln!(
                output,
                "- {} ({}) {:.0}% present: {}/{}/{} of {} meetings in {} committees",
                row.name,
                party_label(row.party.as_deref()),
                row.attendance_rate * 100.0,
                row.present,
                row.absent,
                row.excused,
                row.relevant_meetings,
                row.permanent_committees
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Attendance Outside Permanent Seats");

    if view.non_permanent_members.is_empty() {
        let _ = writeln!(output, "Nobody attended a committee outside their seats.");
    } else {
        for row in view.non_permanent_members.iter() {
            let committees: Vec<String> = row
                .per_committee
                .iter()
                .map(|attendance| format!("{} {}", attendance.committee, attendance.count))
                .collect();
            let _ = writeln!(
                output,
                "- {} ({}) present {} times in {} extra committees: {}",
                row.name,
                party_label(row.party.as_deref()),
                row.present,
                row.extra_committees(),
                committees.join(", ")
            );
        }
    }

    output
}
