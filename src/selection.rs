use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::attendance::{aggregate_committees, AggregationOptions};
use crate::members::UNKNOWN_PARTY;
use crate::models::{
    CommitteeOverview, Meeting, NonPermanentMemberRow, PartyAttendanceRow, PermanentMemberRow,
};
use crate::rollup::{non_permanent_member_table, party_attendance_table, permanent_member_table};
use crate::store::Dataset;

/// What the user is looking at. Every bound is optional and inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub committee: Option<String>,
    pub party: Option<String>,
}

impl Selection {
    pub fn includes_date(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }

    pub fn includes_committee(&self, title: &str) -> bool {
        self.committee.as_deref().map_or(true, |wanted| wanted == title)
    }

    /// `unknown` selects members whose party could not be resolved.
    pub fn includes_party(&self, party: Option<&str>) -> bool {
        match self.party.as_deref() {
            None => true,
            Some(UNKNOWN_PARTY) => party.is_none(),
            Some(wanted) => party == Some(wanted),
        }
    }

    pub fn meetings(&self, meetings: &[Meeting]) -> Vec<Meeting> {
        meetings
            .iter()
            .filter(|meeting| {
                self.includes_date(meeting.date)
                    && self.includes_committee(&meeting.committee_title)
            })
            .cloned()
            .collect()
    }

    pub fn committees(&self, rows: &[CommitteeOverview]) -> Vec<CommitteeOverview> {
        rows.iter()
            .filter(|row| self.includes_committee(&row.committee.title))
            .cloned()
            .collect()
    }

    pub fn describe(&self) -> String {
        let mut parts = vec![self
            .committee
            .clone()
            .unwrap_or_else(|| "all committees".to_string())];
        if let Some(party) = &self.party {
            parts.push(format!("party {party}"));
        }
        match (self.from, self.to) {
            (Some(from), Some(to)) => parts.push(format!("{from} to {to}")),
            (Some(from), None) => parts.push(format!("since {from}")),
            (None, Some(to)) => parts.push(format!("until {to}")),
            (None, None) => {}
        }
        parts.join(", ")
    }
}

/// Every table derived for one selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub overview: Vec<CommitteeOverview>,
    pub permanent_members: Vec<PermanentMemberRow>,
    pub non_permanent_members: Vec<NonPermanentMemberRow>,
    pub parties: Vec<PartyAttendanceRow>,
    pub meeting_count: usize,
    /// Most recent meeting in the whole dataset, regardless of selection.
    pub latest_meeting: Option<NaiveDate>,
}

impl DashboardView {
    /// Recomputes all tables from scratch. The dataset is only read.
    pub fn compute(dataset: &Dataset, selection: &Selection, options: &AggregationOptions) -> Self {
        let meetings = selection.meetings(&dataset.meetings);
        let rows = selection.committees(&dataset.committees);
        let overview = aggregate_committees(&rows, &meetings, options);

        let permanent_members = permanent_member_table(&overview, &dataset.parties)
            .into_iter()
            .filter(|row| selection.includes_party(row.party.as_deref()))
            .collect();
        let non_permanent_members = non_permanent_member_table(&overview, &dataset.parties)
            .into_iter()
            .filter(|row| selection.includes_party(row.party.as_deref()))
            .collect();
        let parties = party_attendance_table(&overview, &dataset.parties);

        info!(
            selection = %selection.describe(),
            meetings = meetings.len(),
            committees = overview.len(),
            "recomputed attendance tables"
        );

        Self {
            overview,
            permanent_members,
            non_permanent_members,
            parties,
            meeting_count: meetings.len(),
            latest_meeting: dataset.meetings.iter().map(|meeting| meeting.date).max(),
        }
    }
}
