use crate::models::{Party, PartyRoster};

/// Label used wherever an unresolved party has to be shown or selected.
pub const UNKNOWN_PARTY: &str = "unknown";

/// Turns "Last, First" into "First Last". Names without a comma are only
/// trimmed.
pub fn normalize_name(raw: &str) -> String {
    match raw.split_once(',') {
        Some((last, first)) => {
            let (first, last) = (first.trim(), last.trim());
            if first.is_empty() {
                last.to_string()
            } else {
                format!("{first} {last}")
            }
        }
        None => raw.trim().to_string(),
    }
}

pub fn full_name(first_name: &str, last_name: &str) -> String {
    format!("{} {}", first_name.trim(), last_name.trim())
}

pub fn party_label(party: Option<&str>) -> &str {
    party.unwrap_or(UNKNOWN_PARTY)
}

impl PartyRoster {
    pub fn new(parties: Vec<Party>) -> Self {
        Self { parties }
    }

    /// Party whose member list holds exactly this name. The first listed
    /// party wins if a name appears twice.
    pub fn party_of(&self, name: &str) -> Option<&str> {
        self.parties
            .iter()
            .find(|party| party.members.iter().any(|member| member.name == name))
            .map(|party| party.name.as_str())
    }

    /// Same as [`party_of`](Self::party_of), logging names that cannot be
    /// resolved.
    pub fn resolve(&self, name: &str) -> Option<String> {
        let party = self.party_of(name).map(str::to_string);
        if party.is_none() {
            tracing::debug!(member = name, "no party found for member");
        }
        party
    }

    pub fn party_names(&self) -> impl Iterator<Item = &str> {
        self.parties.iter().map(|party| party.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RosterMember;

    fn roster() -> PartyRoster {
        PartyRoster::new(vec![
            Party {
                name: "N-VA".to_string(),
                members: vec![RosterMember {
                    name: "Peter Van Rompuy".to_string(),
                    id: Some(4021),
                }],
            },
            Party {
                name: "Groen".to_string(),
                members: vec![
                    RosterMember {
                        name: "Björn Rzoska".to_string(),
                        id: Some(3100),
                    },
                    RosterMember {
                        name: "Elisabeth Meuleman".to_string(),
                        id: None,
                    },
                ],
            },
        ])
    }

    #[test]
    fn swaps_last_and_first_name() {
        assert_eq!(normalize_name("Van Rompuy, Peter"), "Peter Van Rompuy");
        assert_eq!(normalize_name("  Daniëls ,  Koen "), "Koen Daniëls");
        assert_eq!(normalize_name("Jan Jambon"), "Jan Jambon");
        assert_eq!(normalize_name("Demir,"), "Demir");
    }

    #[test]
    fn resolves_party_by_exact_name() {
        let roster = roster();
        assert_eq!(roster.party_of("Björn Rzoska"), Some("Groen"));
        assert_eq!(roster.party_of("Peter Van Rompuy"), Some("N-VA"));
        assert_eq!(roster.party_of("peter van rompuy"), None);
        assert_eq!(roster.resolve("Unknown Member"), None);
    }

    #[test]
    fn unresolved_party_has_a_label() {
        assert_eq!(party_label(None), UNKNOWN_PARTY);
        assert_eq!(party_label(Some("Vooruit")), "Vooruit");
    }

    #[test]
    fn party_names_keep_roster_order() {
        let roster = roster();
        assert_eq!(roster.party_names().collect::<Vec<_>>(), vec!["N-VA", "Groen"]);
    }
}
