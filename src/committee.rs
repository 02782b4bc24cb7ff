use std::collections::HashSet;

use crate::models::Committee;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Chair,
    ViceChair,
    Secretary,
    Reporter,
    Permanent,
    Alternate,
    CoOpted,
}

impl Role {
    /// Function names used by the parliament's committee composition API.
    pub fn from_function_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "voorzitter" => Some(Self::Chair),
            "ondervoorzitter"
            | "eerste ondervoorzitter"
            | "tweede ondervoorzitter"
            | "derde ondervoorzitter"
            | "vierde ondervoorzitter" => Some(Self::ViceChair),
            "secretaris" => Some(Self::Secretary),
            "verslaggever" => Some(Self::Reporter),
            "vast lid" | "lid" => Some(Self::Permanent),
            "plaatsvervangend lid" => Some(Self::Alternate),
            "toegevoegd lid" => Some(Self::CoOpted),
            _ => None,
        }
    }
}

impl Committee {
    /// Builds a committee from `(function name, member names)` groups.
    pub fn from_role_groups<'a, I>(id: u64, title: &str, groups: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Vec<String>)>,
    {
        let mut committee = Committee {
            id,
            title: title.to_string(),
            ..Committee::default()
        };

        for (function, names) in groups {
            let Some(role) = Role::from_function_name(function) else {
                tracing::warn!(committee = title, function, "skipping unknown committee function");
                continue;
            };
            for name in names {
                committee.assign(role, name);
            }
        }

        committee
    }

    fn assign(&mut self, role: Role, name: String) {
        let single_seat = match role {
            Role::Chair => &mut self.chair,
            Role::Secretary => &mut self.secretary,
            Role::Reporter => &mut self.reporter,
            Role::ViceChair => return self.vice_chairs.push(name),
            Role::Permanent => return self.permanent_members.push(name),
            Role::Alternate => return self.alternate_members.push(name),
            Role::CoOpted => return self.co_opted_members.push(name),
        };

        if single_seat.is_none() {
            *single_seat = Some(name);
        } else {
            tracing::debug!(
                committee = %self.title,
                member = %name,
                ?role,
                "seat already taken, keeping member as permanent"
            );
            self.permanent_members.push(name);
        }
    }

    /// Everyone holding a standing seat: chair, vice-chairs, secretary,
    /// reporter, permanent and co-opted members, in that order and without
    /// duplicates.
    pub fn permanent_roll(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.chair
            .iter()
            .chain(&self.vice_chairs)
            .chain(&self.secretary)
            .chain(&self.reporter)
            .chain(&self.permanent_members)
            .chain(&self.co_opted_members)
            .map(String::as_str)
            .filter(|name| seen.insert(*name))
            .collect()
    }

    pub fn holds_permanent_seat(&self, name: &str) -> bool {
        self.permanent_roll().contains(&name)
    }

    /// Committees without a chair or without standing members cannot be
    /// assessed for attendance.
    pub fn is_assessable(&self) -> bool {
        self.chair.is_some() && !self.permanent_roll().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn maps_api_function_names() {
        assert_eq!(Role::from_function_name("Voorzitter"), Some(Role::Chair));
        assert_eq!(
            Role::from_function_name("derde ondervoorzitter"),
            Some(Role::ViceChair)
        );
        assert_eq!(Role::from_function_name("lid"), Some(Role::Permanent));
        assert_eq!(
            Role::from_function_name("toegevoegd lid"),
            Some(Role::CoOpted)
        );
        assert_eq!(Role::from_function_name("griffier"), None);
    }

    #[test]
    fn permanent_roll_includes_officers_and_co_opted_members() {
        let committee = Committee::from_role_groups(
            1460,
            "Commissie voor Onderwijs",
            vec![
                ("voorzitter", names(&["Karin Brouwers"])),
                ("eerste ondervoorzitter", names(&["Jan Laeremans"])),
                ("secretaris", names(&["Loes Vandromme"])),
                ("vast lid", names(&["Koen Daniëls", "Karin Brouwers"])),
                ("plaatsvervangend lid", names(&["Kathleen Krekels"])),
                ("toegevoegd lid", names(&["Jos D'Haese"])),
                ("griffier", names(&["Someone Else"])),
            ],
        );

        assert_eq!(
            committee.permanent_roll(),
            vec![
                "Karin Brouwers",
                "Jan Laeremans",
                "Loes Vandromme",
                "Koen Daniëls",
                "Jos D'Haese"
            ]
        );
        assert!(!committee.holds_permanent_seat("Kathleen Krekels"));
        assert!(!committee.holds_permanent_seat("Someone Else"));
        assert!(committee.is_assessable());
    }

    #[test]
    fn second_chair_stays_on_the_roll() {
        let committee = Committee::from_role_groups(
            7,
            "Commissie ad hoc",
            vec![("voorzitter", names(&["Ann Peeters", "Bert Claes"]))],
        );
        assert_eq!(committee.chair.as_deref(), Some("Ann Peeters"));
        assert!(committee.holds_permanent_seat("Bert Claes"));
    }

    #[test]
    fn committee_without_chair_is_not_assessable() {
        let committee = Committee::from_role_groups(
            8,
            "Controlecommissie",
            vec![("vast lid", names(&["Ann Peeters"]))],
        );
        assert!(!committee.is_assessable());

        let committee = Committee::from_role_groups(
            9,
            "Werkgroep",
            Vec::<(&str, Vec<String>)>::new(),
        );
        assert!(!committee.is_assessable());
    }
}
