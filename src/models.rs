use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Excused,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 3] = [Self::Present, Self::Absent, Self::Excused];

    /// Status labels as the parliament API spells them. Anything else is not
    /// an attendance status and yields `None`.
    pub fn from_api_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "AANWEZIG" => Some(Self::Present),
            "AFWEZIG" => Some(Self::Absent),
            "VERONTSCHULDIGD" => Some(Self::Excused),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Excused => "excused",
        }
    }
}

/// Which attendees a statistic covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Scope {
    /// Everyone recorded at the meeting.
    All,
    /// Members holding a standing seat in the committee.
    Permanent,
}

/// One value per attendance status.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusTriple<T> {
    pub present: T,
    pub absent: T,
    pub excused: T,
}

impl<T> StatusTriple<T> {
    pub fn from_fn(mut f: impl FnMut(AttendanceStatus) -> T) -> Self {
        Self {
            present: f(AttendanceStatus::Present),
            absent: f(AttendanceStatus::Absent),
            excused: f(AttendanceStatus::Excused),
        }
    }

    pub fn get(&self, status: AttendanceStatus) -> &T {
        match status {
            AttendanceStatus::Present => &self.present,
            AttendanceStatus::Absent => &self.absent,
            AttendanceStatus::Excused => &self.excused,
        }
    }

    pub fn get_mut(&mut self, status: AttendanceStatus) -> &mut T {
        match status {
            AttendanceStatus::Present => &mut self.present,
            AttendanceStatus::Absent => &mut self.absent,
            AttendanceStatus::Excused => &mut self.excused,
        }
    }
}

impl<T: Copy> StatusTriple<T> {
    pub fn values(&self) -> [T; 3] {
        [self.present, self.absent, self.excused]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub name: String,
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub party: Option<String>,
}

/// A committee meeting. `None` for a status means the parliament recorded
/// nothing for it, which is not the same as an empty list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Meeting {
    pub id: u64,
    pub committee_id: Option<u64>,
    pub committee_title: String,
    pub date: NaiveDate,
    pub present: Option<Vec<Attendee>>,
    pub absent: Option<Vec<Attendee>>,
    pub excused: Option<Vec<Attendee>>,
}

impl Meeting {
    pub fn attendees(&self, status: AttendanceStatus) -> Option<&[Attendee]> {
        match status {
            AttendanceStatus::Present => self.present.as_deref(),
            AttendanceStatus::Absent => self.absent.as_deref(),
            AttendanceStatus::Excused => self.excused.as_deref(),
        }
    }

    pub fn attendees_mut(&mut self, status: AttendanceStatus) -> &mut Option<Vec<Attendee>> {
        match status {
            AttendanceStatus::Present => &mut self.present,
            AttendanceStatus::Absent => &mut self.absent,
            AttendanceStatus::Excused => &mut self.excused,
        }
    }

    pub fn is_unrecorded(&self) -> bool {
        AttendanceStatus::ALL
            .iter()
            .all(|status| self.attendees(*status).is_none())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Committee {
    #[serde(rename = "committee_id")]
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub chair: Option<String>,
    #[serde(default)]
    pub vice_chairs: Vec<String>,
    #[serde(default)]
    pub secretary: Option<String>,
    #[serde(default)]
    pub reporter: Option<String>,
    #[serde(default)]
    pub permanent_members: Vec<String>,
    #[serde(default)]
    pub alternate_members: Vec<String>,
    #[serde(default)]
    pub co_opted_members: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberCount {
    pub name: String,
    pub count: u32,
}

/// Occurrence count per member name, ordered by count descending. Ties keep
/// the order in which names were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AttendanceTally {
    entries: Vec<MemberCount>,
}

impl AttendanceTally {
    pub fn from_names<'a, I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut index: HashMap<&'a str, usize> = HashMap::new();
        let mut entries: Vec<MemberCount> = Vec::new();

        for name in names {
            match index.get(name) {
                Some(&position) => entries[position].count += 1,
                None => {
                    index.insert(name, entries.len());
                    entries.push(MemberCount {
                        name: name.to_string(),
                        count: 1,
                    });
                }
            }
        }

        entries.sort_by(|a, b| b.count.cmp(&a.count));
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = &MemberCount> {
        self.entries.iter()
    }

    pub fn total(&self) -> u32 {
        self.entries.iter().map(|entry| entry.count).sum()
    }

    /// Number of distinct members.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
impl AttendanceTally {
    pub(crate) fn get(&self, name: &str) -> u32 {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map_or(0, |entry| entry.count)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScopeStats {
    pub counts: StatusTriple<AttendanceTally>,
    pub averages: StatusTriple<f64>,
    pub rounded: StatusTriple<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommitteeStats {
    pub all: ScopeStats,
    pub permanent: ScopeStats,
    pub unrecorded_meetings: usize,
}

impl CommitteeStats {
    pub fn scope(&self, scope: Scope) -> &ScopeStats {
        match scope {
            Scope::All => &self.all,
            Scope::Permanent => &self.permanent,
        }
    }
}

/// A row of the committee overview table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitteeOverview {
    pub committee: Committee,
    pub meeting_count: usize,
    pub stats: Option<CommitteeStats>,
}

impl CommitteeOverview {
    pub fn new(committee: Committee, meeting_count: usize) -> Self {
        Self {
            committee,
            meeting_count,
            stats: None,
        }
    }

    /// Statistics describing the current meeting selection. Rows without
    /// meetings in the selection may still carry statistics from an earlier
    /// run; those are not reported here.
    pub fn current_stats(&self) -> Option<&CommitteeStats> {
        if self.meeting_count == 0 {
            None
        } else {
            self.stats.as_ref()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterMember {
    pub name: String,
    #[serde(default)]
    pub id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    #[serde(rename = "party")]
    pub name: String,
    #[serde(default)]
    pub members: Vec<RosterMember>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartyRoster {
    pub parties: Vec<Party>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PermanentMemberRow {
    pub name: String,
    pub party: Option<String>,
    pub present: u32,
    pub absent: u32,
    pub excused: u32,
    pub relevant_meetings: usize,
    pub attendance_rate: f64,
    pub permanent_committees: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitteeAttendance {
    pub committee: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NonPermanentMemberRow {
    pub name: String,
    pub party: Option<String>,
    pub present: u32,
    pub per_committee: Vec<CommitteeAttendance>,
    pub permanent_committees: usize,
}

impl NonPermanentMemberRow {
    /// Committees attended without holding a permanent seat there.
    pub fn extra_committees(&self) -> usize {
        self.per_committee.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartyAttendanceRow {
    pub party: Option<String>,
    pub counts: StatusTriple<u32>,
}

impl PartyAttendanceRow {
    pub fn total(&self) -> u32 {
        self.counts.values().iter().sum()
    }

    /// Share of the party's attendance records with this status, in percent.
    pub fn share(&self, status: AttendanceStatus) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            f64::from(*self.counts.get(status)) / f64::from(total) * 100.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenQuestion {
    pub id: String,
    pub asked_by: String,
    pub minister: String,
    pub asked_on: NaiveDate,
    pub answered_on: Option<NaiveDate>,
    pub subject: Option<String>,
    pub theme: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionTally {
    pub label: Option<String>,
    pub questions: usize,
    pub answered: usize,
    pub avg_answer_days: Option<f64>,
}
