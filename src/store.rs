use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, NaiveDate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::attendance::overview_rows;
use crate::error::DataError;
use crate::members::{full_name, normalize_name, party_label};
use crate::models::{
    AttendanceStatus, Attendee, Committee, CommitteeOverview, Meeting, Party, PartyRoster,
    WrittenQuestion,
};
use crate::selection::DashboardView;

pub const COMMITTEES_FILE: &str = "committees.json";
pub const COMPOSITIONS_FILE: &str = "compositions.json";
pub const MEETINGS_FILE: &str = "meetings.json";
pub const PARTIES_FILE: &str = "parties.json";
pub const QUESTIONS_FILE: &str = "questions.json";

/// The scraped tables, loaded once and only read afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub committees: Vec<CommitteeOverview>,
    pub meetings: Vec<Meeting>,
    pub parties: PartyRoster,
    pub questions: Vec<WrittenQuestion>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CommitteeRecord {
    #[serde(flatten)]
    committee: Committee,
    #[serde(default)]
    meeting_count: usize,
}

/// Committee composition as the parliament API returns it.
#[derive(Debug, Deserialize)]
pub struct CompositionRecord {
    pub id: u64,
    #[serde(rename = "titel")]
    pub title: String,
    #[serde(rename = "functie", default)]
    pub functions: Vec<FunctionRecord>,
}

#[derive(Debug, Deserialize)]
pub struct FunctionRecord {
    #[serde(rename = "naam")]
    pub name: String,
    #[serde(rename = "lid", default)]
    pub members: Vec<PersonRecord>,
}

#[derive(Debug, Deserialize)]
pub struct PersonRecord {
    #[serde(rename = "voornaam")]
    pub first_name: String,
    #[serde(rename = "naam")]
    pub last_name: String,
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(rename = "fractie", default)]
    pub party: Option<PartyRef>,
}

#[derive(Debug, Deserialize)]
pub struct PartyRef {
    #[serde(rename = "naam")]
    pub name: String,
}

impl PersonRecord {
    fn into_attendee(self) -> Attendee {
        Attendee {
            name: full_name(&self.first_name, &self.last_name),
            id: self.id,
            party: self.party.map(|party| party.name),
        }
    }
}

impl CompositionRecord {
    pub fn into_committee(self) -> Committee {
        let groups = self.functions.iter().map(|function| {
            let names = function
                .members
                .iter()
                .map(|person| full_name(&person.first_name, &person.last_name))
                .collect();
            (function.name.as_str(), names)
        });

        Committee::from_role_groups(self.id, &self.title, groups)
    }
}

#[derive(Debug, Deserialize)]
struct StatusGroupRecord {
    #[serde(rename = "aanwezigheid-status")]
    status: String,
    #[serde(rename = "persoon", default)]
    persons: Vec<PersonRecord>,
}

#[derive(Debug, Deserialize)]
struct MeetingRecord {
    id: u64,
    #[serde(default)]
    committee_id: Option<u64>,
    #[serde(default)]
    committee_title: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    present: Option<Vec<Attendee>>,
    #[serde(default)]
    absent: Option<Vec<Attendee>>,
    #[serde(default)]
    excused: Option<Vec<Attendee>>,
    #[serde(rename = "aanwezigheid", default)]
    attendance: Option<Vec<StatusGroupRecord>>,
}

impl MeetingRecord {
    fn into_meeting(self, row: usize) -> Result<Meeting, DataError> {
        let committee_title = self.committee_title.ok_or(DataError::MissingField {
            table: "meetings",
            field: "committee_title",
            row,
        })?;
        let raw_date = self.date.ok_or(DataError::MissingField {
            table: "meetings",
            field: "date",
            row,
        })?;
        let date = parse_date(&raw_date).ok_or(DataError::InvalidDate {
            table: "meetings",
            row,
            value: raw_date,
        })?;

        let mut meeting = Meeting {
            id: self.id,
            committee_id: self.committee_id,
            committee_title,
            date,
            present: self.present,
            absent: self.absent,
            excused: self.excused,
        };

        for group in self.attendance.into_iter().flatten() {
            let Some(status) = AttendanceStatus::from_api_label(&group.status) else {
                warn!(
                    meeting = meeting.id,
                    status = %group.status,
                    "skipping unknown attendance status"
                );
                continue;
            };
            meeting
                .attendees_mut(status)
                .get_or_insert_with(Vec::new)
                .extend(group.persons.into_iter().map(PersonRecord::into_attendee));
        }

        if meeting.is_unrecorded() {
            debug!(
                meeting = meeting.id,
                committee = %meeting.committee_title,
                "no attendance recorded"
            );
        }

        Ok(meeting)
    }
}

#[derive(Debug, Deserialize)]
struct QuestionRecord {
    id: String,
    asked_by: String,
    minister: String,
    asked_on: String,
    #[serde(default)]
    answered_on: Option<String>,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    theme: Option<String>,
}

impl QuestionRecord {
    fn into_question(self, row: usize) -> Result<WrittenQuestion, DataError> {
        let asked_on = parse_date(&self.asked_on).ok_or_else(|| DataError::InvalidDate {
            table: "questions",
            row,
            value: self.asked_on.clone(),
        })?;
        let answered_on = match self.answered_on.as_deref().map(str::trim) {
            Some(value) if !value.is_empty() => {
                let parsed = parse_date(value);
                if parsed.is_none() {
                    warn!(row, value, "treating unparseable answer date as unanswered");
                }
                parsed
            }
            _ => None,
        };

        Ok(WrittenQuestion {
            id: self.id,
            asked_by: normalize_name(&self.asked_by),
            minister: normalize_name(&self.minister),
            asked_on,
            answered_on,
            subject: self.subject,
            theme: self.theme,
        })
    }
}

/// Accepts plain dates and the API's timestamps with offset.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|time| time.date_naive()))
        .or_else(|| {
            DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z")
                .ok()
                .map(|time| time.date_naive())
        })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, DataError> {
    let contents = fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| DataError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_committees(dir: &Path) -> Result<Vec<CommitteeOverview>, DataError> {
    let compositions = dir.join(COMPOSITIONS_FILE);
    let committees = dir.join(COMMITTEES_FILE);

    if !committees.exists() && compositions.exists() {
        return Ok(overview_rows(&load_compositions(&compositions)?));
    }

    let records: Vec<CommitteeRecord> = read_json(&committees)?;
    Ok(records
        .into_iter()
        .map(|record| CommitteeOverview::new(record.committee, record.meeting_count))
        .collect())
}

pub fn load_compositions(path: &Path) -> Result<Vec<Committee>, DataError> {
    let records: Vec<CompositionRecord> = read_json(path)?;
    Ok(records
        .into_iter()
        .map(CompositionRecord::into_committee)
        .collect())
}

/// Meetings without a committee title make the table unusable. Rows with a
/// missing or invalid date are left out.
pub fn load_meetings(path: &Path) -> Result<Vec<Meeting>, DataError> {
    let records: Vec<MeetingRecord> = read_json(path)?;
    let mut meetings = Vec::with_capacity(records.len());

    for (row, record) in records.into_iter().enumerate() {
        match record.into_meeting(row) {
            Ok(meeting) => meetings.push(meeting),
            Err(error @ DataError::MissingField {
                field: "committee_title",
                ..
            }) => return Err(error),
            Err(error) => warn!(row, %error, "skipping meeting row"),
        }
    }

    Ok(meetings)
}

pub fn load_parties(path: &Path) -> Result<PartyRoster, DataError> {
    let parties: Vec<Party> = read_json(path)?;
    Ok(PartyRoster::new(parties))
}

pub fn load_questions(path: &Path) -> Result<Vec<WrittenQuestion>, DataError> {
    if !path.exists() {
        debug!(path = %path.display(), "no written questions table");
        return Ok(Vec::new());
    }
    let records: Vec<QuestionRecord> = read_json(path)?;
    let mut questions = Vec::with_capacity(records.len());

    for (row, record) in records.into_iter().enumerate() {
        match record.into_question(row) {
            Ok(question) => questions.push(question),
            Err(error) => warn!(row, %error, "skipping written question row"),
        }
    }

    Ok(questions)
}

pub fn load_dataset(dir: &Path) -> Result<Dataset, DataError> {
    let dataset = Dataset {
        committees: load_committees(dir)?,
        meetings: load_meetings(&dir.join(MEETINGS_FILE))?,
        parties: load_parties(&dir.join(PARTIES_FILE))?,
        questions: load_questions(&dir.join(QUESTIONS_FILE)).unwrap_or_else(|error| {
            warn!(%error, "ignoring unreadable written questions table");
            Vec::new()
        }),
    };

    info!(
        dir = %dir.display(),
        committees = dataset.committees.len(),
        meetings = dataset.meetings.len(),
        parties = dataset.parties.parties.len(),
        questions = dataset.questions.len(),
        "loaded tables"
    );
    Ok(dataset)
}

pub fn write_committees(path: &Path, committees: Vec<Committee>) -> anyhow::Result<()> {
    let records: Vec<CommitteeRecord> = committees
        .into_iter()
        .map(|committee| CommitteeRecord {
            committee,
            meeting_count: 0,
        })
        .collect();
    let json = serde_json::to_string_pretty(&records)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct CommitteeCsvRow<'a> {
    committee_id: u64,
    committee: &'a str,
    meeting_count: usize,
    unrecorded_meetings: Option<usize>,
    avg_present_all: Option<f64>,
    avg_absent_all: Option<f64>,
    avg_excused_all: Option<f64>,
    avg_present_permanent: Option<f64>,
    avg_absent_permanent: Option<f64>,
    avg_excused_permanent: Option<f64>,
    rounded_present_all: Option<i64>,
    rounded_absent_all: Option<i64>,
    rounded_excused_all: Option<i64>,
    rounded_present_permanent: Option<i64>,
    rounded_absent_permanent: Option<i64>,
    rounded_excused_permanent: Option<i64>,
}

impl<'a> CommitteeCsvRow<'a> {
    fn from_overview(row: &'a CommitteeOverview) -> Self {
        let stats = row.current_stats();
        Self {
            committee_id: row.committee.id,
            committee: &row.committee.title,
            meeting_count: row.meeting_count,
            unrecorded_meetings: stats.map(|stats| stats.unrecorded_meetings),
            avg_present_all: stats.map(|stats| stats.all.averages.present),
            avg_absent_all: stats.map(|stats| stats.all.averages.absent),
            avg_excused_all: stats.map(|stats| stats.all.averages.excused),
            avg_present_permanent: stats.map(|stats| stats.permanent.averages.present),
            avg_absent_permanent: stats.map(|stats| stats.permanent.averages.absent),
            avg_excused_permanent: stats.map(|stats| stats.permanent.averages.excused),
            rounded_present_all: stats.map(|stats| stats.all.rounded.present),
            rounded_absent_all: stats.map(|stats| stats.all.rounded.absent),
            rounded_excused_all: stats.map(|stats| stats.all.rounded.excused),
            rounded_present_permanent: stats.map(|stats| stats.permanent.rounded.present),
            rounded_absent_permanent: stats.map(|stats| stats.permanent.rounded.absent),
            rounded_excused_permanent: stats.map(|stats| stats.permanent.rounded.excused),
        }
    }
}

#[derive(Debug, Serialize)]
struct CommitteeCountCsvRow<'a> {
    committee: &'a str,
    scope: &'static str,
    status: &'static str,
    member: &'a str,
    count: u32,
}

#[derive(Debug, Serialize)]
struct GuestAttendanceCsvRow<'a> {
    member: &'a str,
    party: &'a str,
    committee: &'a str,
    present: u32,
    permanent_committees: usize,
}

#[derive(Debug, Serialize)]
struct PartyCsvRow<'a> {
    party: &'a str,
    present: u32,
    absent: u32,
    excused: u32,
    total: u32,
    present_pct: f64,
    absent_pct: f64,
    excused_pct: f64,
}

fn csv_writer(path: &Path) -> anyhow::Result<csv::Writer<fs::File>> {
    csv::WriterBuilder::new()
        .delimiter(b';')
        .from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))
}

/// Writes the derived tables of a view as semicolon-separated files and
/// returns their paths.
pub fn export_view(view: &DashboardView, dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let committees = dir.join("committees.csv");
    let mut writer = csv_writer(&committees)?;
    for row in &view.overview {
        writer.serialize(CommitteeCsvRow::from_overview(row))?;
    }
    writer.flush()?;

    let counts = dir.join("committee_counts.csv");
    let mut writer = csv_writer(&counts)?;
    for row in &view.overview {
        let Some(stats) = row.current_stats() else {
            continue;
        };
        for (scope, scope_stats) in [("all", &stats.all), ("permanent", &stats.permanent)] {
            for status in AttendanceStatus::ALL {
                for member in scope_stats.counts.get(status).iter() {
                    writer.serialize(CommitteeCountCsvRow {
                        committee: &row.committee.title,
                        scope,
                        status: status.label(),
                        member: &member.name,
                        count: member.count,
                    })?;
                }
            }
        }
    }
    writer.flush()?;

    let permanent = dir.join("permanent_members.csv");
    let mut writer = csv_writer(&permanent)?;
    for row in &view.permanent_members {
        writer.serialize(row)?;
    }
    writer.flush()?;

    let guests = dir.join("non_permanent_members.csv");
    let mut writer = csv_writer(&guests)?;
    for row in &view.non_permanent_members {
        for attendance in &row.per_committee {
            writer.serialize(GuestAttendanceCsvRow {
                member: &row.name,
                party: party_label(row.party.as_deref()),
                committee: &attendance.committee,
                present: attendance.count,
                permanent_committees: row.permanent_committees,
            })?;
        }
    }
    writer.flush()?;

    let parties = dir.join("parties.csv");
    let mut writer = csv_writer(&parties)?;
    for row in &view.parties {
        writer.serialize(PartyCsvRow {
            party: party_label(row.party.as_deref()),
            present: row.counts.present,
            absent: row.counts.absent,
            excused: row.counts.excused,
            total: row.total(),
            present_pct: row.share(AttendanceStatus::Present),
            absent_pct: row.share(AttendanceStatus::Absent),
            excused_pct: row.share(AttendanceStatus::Excused),
        })?;
    }
    writer.flush()?;

    let written = vec![committees, counts, permanent, guests, parties];
    info!(dir = %dir.display(), files = written.len(), "exported tables");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::AggregationOptions;
    use crate::selection::Selection;

    fn write(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).expect("write fixture");
    }

    fn fixture_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("temp dir");
        write(
            dir.path(),
            COMMITTEES_FILE,
            r#"[
                {"committee_id": 1460, "title": "Commissie voor Onderwijs",
                 "chair": "Karin Brouwers", "vice_chairs": ["Jan Laeremans"],
                 "permanent_members": ["Koen Daniëls"], "alternate_members": ["Kathleen Krekels"],
                 "meeting_count": 12}
            ]"#,
        );
        write(
            dir.path(),
            MEETINGS_FILE,
            r#"[
                {"id": 1764019, "committee_id": 1460, "committee_title": "Commissie voor Onderwijs",
                 "date": "2023-10-04",
                 "present": [{"name": "Karin Brouwers", "id": 1, "party": "cd&v"}],
                 "absent": [], "online": [{"name": "Koen Daniëls"}]},
                {"id": 1764020, "committee_title": "Commissie voor Onderwijs",
                 "date": "2023-10-11T10:00:00+02:00",
                 "aanwezigheid": [
                    {"aanwezigheid-status": "AANWEZIG",
                     "persoon": [{"voornaam": "Koen", "naam": "Daniëls", "id": 2, "fractie": {"naam": "N-VA"}}]},
                    {"aanwezigheid-status": "ONBEKEND", "persoon": []}
                 ]},
                {"id": 1764021, "committee_title": "Commissie voor Onderwijs", "date": "2023-10-18"}
            ]"#,
        );
        write(
            dir.path(),
            PARTIES_FILE,
            r#"[{"party": "cd&v", "members": [{"name": "Karin Brouwers", "id": 1}]},
                {"party": "N-VA", "members": [{"name": "Koen Daniëls", "id": 2}]}]"#,
        );
        write(
            dir.path(),
            QUESTIONS_FILE,
            r#"[{"id": "1870123", "asked_by": "Daniëls, Koen", "minister": "Weyts, Ben",
                 "asked_on": "2023-10-02", "answered_on": "2023-10-20", "theme": "Onderwijs"}]"#,
        );
        dir
    }

    #[test]
    fn loads_all_tables() {
        let dir = fixture_dir();
        let dataset = load_dataset(dir.path()).expect("dataset loads");

        assert_eq!(dataset.committees.len(), 1);
        assert_eq!(dataset.committees[0].meeting_count, 12);
        assert_eq!(dataset.meetings.len(), 3);
        assert_eq!(dataset.parties.party_of("Koen Daniëls"), Some("N-VA"));
        assert_eq!(dataset.questions[0].asked_by, "Koen Daniëls");
        assert_eq!(dataset.questions[0].minister, "Ben Weyts");
    }

    #[test]
    fn keeps_missing_attendance_distinct_from_empty() {
        let dir = fixture_dir();
        let meetings = load_meetings(&dir.path().join(MEETINGS_FILE)).expect("meetings load");

        let first = &meetings[0];
        assert_eq!(first.attendees(AttendanceStatus::Absent).map(<[_]>::len), Some(0));
        assert!(first.excused.is_none());

        let second = &meetings[1];
        assert_eq!(second.date, NaiveDate::from_ymd_opt(2023, 10, 11).expect("valid date"));
        let present = second.present.as_ref().expect("present converted");
        assert_eq!(present[0].name, "Koen Daniëls");
        assert_eq!(present[0].party.as_deref(), Some("N-VA"));
        assert!(second.absent.is_none());

        assert!(meetings[2].is_unrecorded());
    }

    #[test]
    fn meeting_without_committee_title_fails_fast() {
        let dir = tempfile::tempdir().expect("temp dir");
        write(dir.path(), MEETINGS_FILE, r#"[{"id": 1, "date": "2023-10-04"}]"#);
        let error = load_meetings(&dir.path().join(MEETINGS_FILE)).expect_err("must fail");
        assert!(matches!(
            error,
            DataError::MissingField {
                field: "committee_title",
                row: 0,
                ..
            }
        ));
    }

    #[test]
    fn meeting_rows_without_usable_date_are_left_out() {
        let dir = tempfile::tempdir().expect("temp dir");
        write(
            dir.path(),
            MEETINGS_FILE,
            r#"[
                {"id": 1, "committee_title": "C", "date": "2023-10-04", "present": []},
                {"id": 2, "committee_title": "C"},
                {"id": 3, "committee_title": "C", "date": "4 oktober"}
            ]"#,
        );
        let meetings = load_meetings(&dir.path().join(MEETINGS_FILE)).expect("meetings load");
        assert_eq!(meetings.len(), 1);
        assert_eq!(meetings[0].id, 1);
    }

    #[test]
    fn broken_question_rows_do_not_block_attendance_tables() {
        let dir = fixture_dir();
        write(
            dir.path(),
            QUESTIONS_FILE,
            r#"[
                {"id": "1", "asked_by": "Daniëls, Koen", "minister": "Weyts, Ben",
                 "asked_on": "2023-10-02", "answered_on": "n.v.t."},
                {"id": "2", "asked_by": "Daniëls, Koen", "minister": "Weyts, Ben",
                 "asked_on": "ergens in oktober"}
            ]"#,
        );

        let dataset = load_dataset(dir.path()).expect("dataset loads");
        assert_eq!(dataset.meetings.len(), 3);
        assert_eq!(dataset.questions.len(), 1);
        assert_eq!(dataset.questions[0].answered_on, None);

        write(dir.path(), QUESTIONS_FILE, "not json");
        let dataset = load_dataset(dir.path()).expect("dataset loads without questions");
        assert!(dataset.questions.is_empty());
        assert!(load_questions(&dir.path().join(QUESTIONS_FILE)).is_err());
    }

    #[test]
    fn converts_compositions_into_committees() {
        let dir = tempfile::tempdir().expect("temp dir");
        write(
            dir.path(),
            COMPOSITIONS_FILE,
            r#"[{"id": 1460, "titel": "Commissie voor Onderwijs", "functie": [
                {"naam": "voorzitter", "lid": [{"voornaam": "Karin", "naam": "Brouwers", "id": 1}]},
                {"naam": "vast lid", "lid": [{"voornaam": "Koen", "naam": "Daniëls", "id": 2}]},
                {"naam": "plaatsvervangend lid", "lid": [{"voornaam": "Kathleen", "naam": "Krekels"}]}
            ]}]"#,
        );

        let rows = load_committees(dir.path()).expect("compositions load");
        assert_eq!(rows.len(), 1);
        let committee = &rows[0].committee;
        assert_eq!(committee.chair.as_deref(), Some("Karin Brouwers"));
        assert_eq!(committee.permanent_roll(), vec!["Karin Brouwers", "Koen Daniëls"]);
        assert_eq!(committee.alternate_members, vec!["Kathleen Krekels".to_string()]);

        let out = dir.path().join(COMMITTEES_FILE);
        write_committees(&out, vec![committee.clone()]).expect("committees written");
        let reloaded = load_committees(dir.path()).expect("committees reload");
        assert_eq!(&reloaded[0].committee, committee);
    }

    #[test]
    fn exports_semicolon_separated_tables() {
        let dir = fixture_dir();
        let dataset = load_dataset(dir.path()).expect("dataset loads");
        let view = DashboardView::compute(
            &dataset,
            &Selection::default(),
            &AggregationOptions::default(),
        );

        let out = dir.path().join("export");
        let written = export_view(&view, &out).expect("export succeeds");
        assert_eq!(written.len(), 5);

        let permanent = fs::read_to_string(out.join("permanent_members.csv")).expect("csv written");
        let header = permanent.lines().next().expect("header line");
        assert!(header.starts_with("name;party;present;absent;excused;relevant_meetings"));
        assert!(permanent.contains("Koen Daniëls;N-VA;1;0;0;3"));

        let committees = fs::read_to_string(out.join("committees.csv")).expect("csv written");
        assert!(committees.contains("1460;Commissie voor Onderwijs;3;1;"));

        let counts = fs::read_to_string(out.join("committee_counts.csv")).expect("csv written");
        assert_eq!(
            counts.lines().next(),
            Some("committee;scope;status;member;count")
        );
        assert!(counts.contains("Commissie voor Onderwijs;permanent;present;Koen Daniëls;1"));
    }

    #[test]
    fn missing_questions_table_is_empty() {
        let dir = tempfile::tempdir().expect("temp dir");
        let questions = load_questions(&dir.path().join(QUESTIONS_FILE)).expect("no file is fine");
        assert!(questions.is_empty());
    }
}
