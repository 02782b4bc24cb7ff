use std::collections::HashMap;

use clap::ValueEnum;

use crate::models::{PartyRoster, QuestionTally, WrittenQuestion};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum QuestionGrouping {
    Member,
    Party,
    Minister,
}

impl WrittenQuestion {
    /// Days between asking and answering, `None` while unanswered.
    pub fn answer_days(&self) -> Option<i64> {
        self.answered_on.map(|answered| (answered - self.asked_on).num_days())
    }
}

#[derive(Default)]
struct Accumulator {
    questions: usize,
    answered: usize,
    total_days: i64,
}

pub fn tally_questions(
    questions: &[WrittenQuestion],
    parties: &PartyRoster,
    grouping: QuestionGrouping,
) -> Vec<QuestionTally> {
    let mut order: Vec<Option<String>> = Vec::new();
    let mut groups: HashMap<Option<String>, Accumulator> = HashMap::new();

    for question in questions {
        let label = match grouping {
            QuestionGrouping::Member => Some(question.asked_by.clone()),
            QuestionGrouping::Party => parties.resolve(&question.asked_by),
            QuestionGrouping::Minister => Some(question.minister.clone()),
        };

        if !groups.contains_key(&label) {
            order.push(label.clone());
        }
        let entry = groups.entry(label).or_default();
        entry.questions += 1;
        if let Some(days) = question.answer_days() {
            entry.answered += 1;
            entry.total_days += days;
        }
    }

    let mut tallies: Vec<QuestionTally> = order
        .into_iter()
        .filter_map(|label| {
            let entry = groups.remove(&label)?;
            Some(QuestionTally {
                label,
                questions: entry.questions,
                answered: entry.answered,
                avg_answer_days: (entry.answered > 0)
                    .then(|| entry.total_days as f64 / entry.answered as f64),
            })
        })
        .collect();

    tallies.sort_by(|a, b| b.questions.cmp(&a.questions));
    tallies
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::{Party, RosterMember};

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, month, day).expect("valid date")
    }

    fn question(
        id: &str,
        asked_by: &str,
        minister: &str,
        answered: Option<NaiveDate>,
    ) -> WrittenQuestion {
        WrittenQuestion {
            id: id.to_string(),
            asked_by: asked_by.to_string(),
            minister: minister.to_string(),
            asked_on: date(10, 2),
            answered_on: answered,
            subject: None,
            theme: None,
        }
    }

    fn roster() -> PartyRoster {
        PartyRoster::new(vec![Party {
            name: "N-VA".to_string(),
            members: vec![RosterMember {
                name: "Koen Daniëls".to_string(),
                id: Some(2),
            }],
        }])
    }

    fn questions() -> Vec<WrittenQuestion> {
        vec![
            question("1", "Koen Daniëls", "Ben Weyts", Some(date(10, 12))),
            question("2", "Ann Peeters", "Ben Weyts", None),
            question("3", "Koen Daniëls", "Hilde Crevits", Some(date(10, 22))),
        ]
    }

    #[test]
    fn answer_delay_in_days() {
        let questions = questions();
        assert_eq!(questions[0].answer_days(), Some(10));
        assert_eq!(questions[1].answer_days(), None);
    }

    #[test]
    fn groups_by_member() {
        let tallies = tally_questions(&questions(), &roster(), QuestionGrouping::Member);
        assert_eq!(tallies.len(), 2);
        assert_eq!(tallies[0].label.as_deref(), Some("Koen Daniëls"));
        assert_eq!(tallies[0].questions, 2);
        assert_eq!(tallies[0].answered, 2);
        assert_eq!(tallies[0].avg_answer_days, Some(15.0));
        assert_eq!(tallies[1].avg_answer_days, None);
    }

    #[test]
    fn groups_by_party_with_unresolved_members() {
        let tallies = tally_questions(&questions(), &roster(), QuestionGrouping::Party);
        assert_eq!(tallies[0].label.as_deref(), Some("N-VA"));
        assert_eq!(tallies[1].label, None);
        assert_eq!(tallies[1].questions, 1);
    }

    #[test]
    fn groups_by_minister_in_first_seen_order_on_ties() {
        let tallies = tally_questions(&questions(), &roster(), QuestionGrouping::Minister);
        assert_eq!(tallies[0].label.as_deref(), Some("Ben Weyts"));
        assert_eq!(tallies[0].answered, 1);
        assert_eq!(tallies[1].label.as_deref(), Some("Hilde Crevits"));
    }
}
