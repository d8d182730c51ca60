use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! strong_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new<S: AsRef<str>>(s: S) -> Self {
                Self(s.as_ref().to_owned())
            }
            pub fn random() -> Self {
                Self(Uuid::new_v4().to_string())
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

strong_id!(
    /// Identifiant fort pour Volunteer
    VolunteerId
);
strong_id!(
    /// Identifiant fort pour Church
    ChurchId
);
strong_id!(
    /// Identifiant fort pour Role
    RoleId
);
strong_id!(
    /// Identifiant fort pour AssignmentRecord
    AssignmentId
);

/// Type de culte. `EarlySunday` (RDJ) est le culte du dimanche matin,
/// distinct du culte du dimanche soir (`Sunday`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceTag {
    EarlySunday,
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl ServiceTag {
    pub const ALL: [ServiceTag; 8] = [
        ServiceTag::EarlySunday,
        ServiceTag::Sunday,
        ServiceTag::Monday,
        ServiceTag::Tuesday,
        ServiceTag::Wednesday,
        ServiceTag::Thursday,
        ServiceTag::Friday,
        ServiceTag::Saturday,
    ];

    /// Tag "naturel" d'un jour de semaine ; le dimanche donne le culte du soir.
    pub fn from_weekday(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Sun => ServiceTag::Sunday,
            Weekday::Mon => ServiceTag::Monday,
            Weekday::Tue => ServiceTag::Tuesday,
            Weekday::Wed => ServiceTag::Wednesday,
            Weekday::Thu => ServiceTag::Thursday,
            Weekday::Fri => ServiceTag::Friday,
            Weekday::Sat => ServiceTag::Saturday,
        }
    }

    /// Clé courte utilisée en CSV et en CLI.
    pub fn key(self) -> &'static str {
        match self {
            ServiceTag::EarlySunday => "rdj",
            ServiceTag::Sunday => "sun",
            ServiceTag::Monday => "mon",
            ServiceTag::Tuesday => "tue",
            ServiceTag::Wednesday => "wed",
            ServiceTag::Thursday => "thu",
            ServiceTag::Friday => "fri",
            ServiceTag::Saturday => "sat",
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for ServiceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ServiceTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = match s.trim().to_lowercase().as_str() {
            "rdj" | "early-sunday" | "early_sunday" | "earlysunday" => ServiceTag::EarlySunday,
            "sun" | "sunday" | "dom" | "domingo" => ServiceTag::Sunday,
            "mon" | "monday" | "seg" | "segunda" => ServiceTag::Monday,
            "tue" | "tuesday" | "ter" | "terca" | "terça" => ServiceTag::Tuesday,
            "wed" | "wednesday" | "qua" | "quarta" => ServiceTag::Wednesday,
            "thu" | "thursday" | "qui" | "quinta" => ServiceTag::Thursday,
            "fri" | "friday" | "sex" | "sexta" => ServiceTag::Friday,
            "sat" | "saturday" | "sab" | "sabado" | "sáb" | "sábado" => ServiceTag::Saturday,
            other => return Err(format!("unknown service tag: {other}")),
        };
        Ok(tag)
    }
}

/// Ensemble compact de tags (8 drapeaux). Sert aux disponibilités des
/// volontaires comme aux jours de culte des églises.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ServiceTag>", into = "Vec<ServiceTag>")]
pub struct ServiceTags(u8);

impl ServiceTags {
    pub fn empty() -> Self {
        Self(0)
    }
    pub fn all() -> Self {
        ServiceTag::ALL.into_iter().collect()
    }
    pub fn contains(&self, tag: ServiceTag) -> bool {
        self.0 & tag.bit() != 0
    }
    pub fn insert(&mut self, tag: ServiceTag) {
        self.0 |= tag.bit();
    }
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
    pub fn iter(self) -> impl Iterator<Item = ServiceTag> {
        ServiceTag::ALL.into_iter().filter(move |t| self.contains(*t))
    }

    /// Parse une liste `rdj,sun|wed` (séparateurs `,`, `|`, `;` ou espaces).
    pub fn parse_list(raw: &str) -> Result<Self, String> {
        raw.split(|c: char| c == ',' || c == '|' || c == ';' || c.is_whitespace())
            .filter(|chunk| !chunk.is_empty())
            .map(str::parse::<ServiceTag>)
            .collect()
    }
}

impl FromIterator<ServiceTag> for ServiceTags {
    fn from_iter<I: IntoIterator<Item = ServiceTag>>(iter: I) -> Self {
        let mut tags = ServiceTags::empty();
        for tag in iter {
            tags.insert(tag);
        }
        tags
    }
}

impl From<Vec<ServiceTag>> for ServiceTags {
    fn from(tags: Vec<ServiceTag>) -> Self {
        tags.into_iter().collect()
    }
}

impl From<ServiceTags> for Vec<ServiceTag> {
    fn from(tags: ServiceTags) -> Self {
        tags.iter().collect()
    }
}

impl fmt::Display for ServiceTags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<&str> = self.iter().map(ServiceTag::key).collect();
        f.write_str(&keys.join(","))
    }
}

/// Les deux fonctions tenues par la paire affectée à un culte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubRole {
    Requester,
    DoorOpener,
}

/// Compteurs cumulés d'un volontaire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub assignments: u32,
    pub requester: u32,
    pub door_opener: u32,
}

impl Counters {
    pub fn record(&mut self, sub_role: SubRole) {
        self.assignments += 1;
        match sub_role {
            SubRole::Requester => self.requester += 1,
            SubRole::DoorOpener => self.door_opener += 1,
        }
    }
}

/// Volontaire (porteiro)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volunteer {
    pub id: VolunteerId,
    pub name: String,
    pub church: ChurchId,
    pub role: RoleId,
    #[serde(default)]
    pub availability: ServiceTags,
    #[serde(default)]
    pub counters: Counters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_assigned: Option<NaiveDate>,
}

impl Volunteer {
    pub fn new<N: Into<String>>(
        name: N,
        church: ChurchId,
        role: RoleId,
        availability: ServiceTags,
    ) -> Self {
        Self {
            id: VolunteerId::random(),
            name: name.into(),
            church,
            role,
            availability,
            counters: Counters::default(),
            last_assigned: None,
        }
    }

    pub fn is_available(&self, tag: ServiceTag) -> bool {
        self.availability.contains(tag)
    }
}

/// Église et ses jours de culte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Church {
    pub id: ChurchId,
    pub name: String,
    #[serde(default)]
    pub service_days: ServiceTags,
}

impl Church {
    pub fn new<N: Into<String>>(name: N, service_days: ServiceTags) -> Self {
        Self {
            id: ChurchId::random(),
            name: name.into(),
            service_days,
        }
    }
}

/// Fonction (ex. porteiro). Seules les fonctions actives sont planifiables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Role {
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self {
            id: RoleId::random(),
            name: name.into(),
            active: true,
        }
    }
}

/// Mois calendaire : unité de remplacement d'une escala.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonthScope {
    pub year: i32,
    pub month: u32,
}

impl MonthScope {
    pub fn new(year: i32, month: u32) -> Result<Self, String> {
        if !(1..=12).contains(&month) {
            return Err(format!("invalid month: {month}"));
        }
        Ok(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }
}

impl fmt::Display for MonthScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("expected YYYY-MM, got {s}"))?;
        let year: i32 = year.parse().map_err(|_| format!("invalid year in {s}"))?;
        let month: u32 = month.parse().map_err(|_| format!("invalid month in {s}"))?;
        MonthScope::new(year, month)
    }
}

/// Culte à couvrir : une date et son type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceDate {
    pub date: NaiveDate,
    pub tag: ServiceTag,
}

impl ServiceDate {
    pub fn new(date: NaiveDate, tag: ServiceTag) -> Self {
        Self { date, tag }
    }
}

/// Item d'escala : une paire (demandeur, ouvreur) pour un culte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub id: AssignmentId,
    pub date: NaiveDate,
    pub tag: ServiceTag,
    pub church: ChurchId,
    pub role: RoleId,
    pub requester: VolunteerId,
    pub door_opener: VolunteerId,
}

impl AssignmentRecord {
    pub fn new(
        slot: ServiceDate,
        church: ChurchId,
        role: RoleId,
        requester: VolunteerId,
        door_opener: VolunteerId,
    ) -> Self {
        Self {
            id: AssignmentId::random(),
            date: slot.date,
            tag: slot.tag,
            church,
            role,
            requester,
            door_opener,
        }
    }

    pub fn service_date(&self) -> ServiceDate {
        ServiceDate::new(self.date, self.tag)
    }

    pub fn involves(&self, volunteer: &VolunteerId) -> bool {
        &self.requester == volunteer || &self.door_opener == volunteer
    }

    pub fn sub_role_of(&self, volunteer: &VolunteerId) -> Option<SubRole> {
        if &self.requester == volunteer {
            Some(SubRole::Requester)
        } else if &self.door_opener == volunteer {
            Some(SubRole::DoorOpener)
        } else {
            None
        }
    }

    pub fn in_scope(&self, church: &ChurchId, role: &RoleId, scope: MonthScope) -> bool {
        &self.church == church && &self.role == role && scope.contains(self.date)
    }
}

/// Registre complet : églises, fonctions, volontaires et escalas.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Registry {
    #[serde(default)]
    pub churches: Vec<Church>,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub volunteers: Vec<Volunteer>,
    #[serde(default)]
    pub assignments: Vec<AssignmentRecord>,
}

impl Registry {
    pub fn find_church(&self, id: &ChurchId) -> Option<&Church> {
        self.churches.iter().find(|c| &c.id == id)
    }
    pub fn find_church_by_name(&self, name: &str) -> Option<&Church> {
        self.churches.iter().find(|c| same_name(&c.name, name))
    }
    pub fn find_role(&self, id: &RoleId) -> Option<&Role> {
        self.roles.iter().find(|r| &r.id == id)
    }
    pub fn find_role_by_name(&self, name: &str) -> Option<&Role> {
        self.roles.iter().find(|r| same_name(&r.name, name))
    }
    pub fn find_volunteer(&self, id: &VolunteerId) -> Option<&Volunteer> {
        self.volunteers.iter().find(|v| &v.id == id)
    }
    pub fn find_volunteer_by_name(&self, name: &str) -> Option<&Volunteer> {
        self.volunteers.iter().find(|v| same_name(&v.name, name))
    }
    pub fn find_volunteer_mut(&mut self, id: &VolunteerId) -> Option<&mut Volunteer> {
        self.volunteers.iter_mut().find(|v| &v.id == id)
    }
    pub fn find_assignment(&self, id: &AssignmentId) -> Option<&AssignmentRecord> {
        self.assignments.iter().find(|a| &a.id == id)
    }

    pub fn add_church(&mut self, church: Church) -> Result<ChurchId, String> {
        if church.name.trim().is_empty() {
            return Err("church name cannot be empty".to_string());
        }
        if self.find_church_by_name(&church.name).is_some() {
            return Err(format!("church already exists: {}", church.name));
        }
        let id = church.id.clone();
        self.churches.push(church);
        Ok(id)
    }

    pub fn add_role(&mut self, role: Role) -> Result<RoleId, String> {
        if role.name.trim().is_empty() {
            return Err("role name cannot be empty".to_string());
        }
        if self.find_role_by_name(&role.name).is_some() {
            return Err(format!("role already exists: {}", role.name));
        }
        let id = role.id.clone();
        self.roles.push(role);
        Ok(id)
    }

    pub fn add_volunteer(&mut self, volunteer: Volunteer) -> Result<VolunteerId, String> {
        if volunteer.name.trim().is_empty() {
            return Err("volunteer name cannot be empty".to_string());
        }
        if self.find_church(&volunteer.church).is_none() {
            return Err(format!("unknown church: {}", volunteer.church));
        }
        if self.find_role(&volunteer.role).is_none() {
            return Err(format!("unknown role: {}", volunteer.role));
        }
        let id = volunteer.id.clone();
        self.volunteers.push(volunteer);
        Ok(id)
    }

    /// Retire un volontaire. Ses items d'escala restent en place ; l'audit
    /// les signale jusqu'à la prochaine génération du mois.
    pub fn remove_volunteer(&mut self, id: &VolunteerId) -> Option<Volunteer> {
        let pos = self.volunteers.iter().position(|v| &v.id == id)?;
        Some(self.volunteers.remove(pos))
    }

    pub fn set_availability(&mut self, id: &VolunteerId, availability: ServiceTags) -> bool {
        match self.find_volunteer_mut(id) {
            Some(v) => {
                v.availability = availability;
                true
            }
            None => false,
        }
    }

    pub fn church_service_tags(&self, church: &ChurchId) -> Option<ServiceTags> {
        self.find_church(church).map(|c| c.service_days)
    }

    /// Volontaires de l'église et de la fonction disponibles pour `tag`,
    /// dans l'ordre d'inscription.
    pub fn eligible_volunteers(
        &self,
        church: &ChurchId,
        role: &RoleId,
        tag: ServiceTag,
    ) -> Vec<Volunteer> {
        self.volunteers
            .iter()
            .filter(|v| &v.church == church && &v.role == role && v.is_available(tag))
            .cloned()
            .collect()
    }

    /// Supprime les items du périmètre (église, fonction, mois). Renvoie le nombre retiré.
    pub fn delete_assignments(
        &mut self,
        church: &ChurchId,
        role: &RoleId,
        scope: MonthScope,
    ) -> usize {
        let before = self.assignments.len();
        self.assignments.retain(|a| !a.in_scope(church, role, scope));
        before - self.assignments.len()
    }

    pub fn insert_assignments<I: IntoIterator<Item = AssignmentRecord>>(&mut self, records: I) {
        self.assignments.extend(records);
    }

    /// Compteurs et dernière date recalculés à partir des items d'escala.
    pub fn derived_counters(&self) -> HashMap<VolunteerId, (Counters, Option<NaiveDate>)> {
        let mut out: HashMap<VolunteerId, (Counters, Option<NaiveDate>)> = HashMap::new();
        for record in &self.assignments {
            for (volunteer, sub_role) in [
                (&record.requester, SubRole::Requester),
                (&record.door_opener, SubRole::DoorOpener),
            ] {
                let entry = out.entry(volunteer.clone()).or_default();
                entry.0.record(sub_role);
                entry.1 = entry.1.max(Some(record.date));
            }
        }
        out
    }

    /// Dernière date d'escala de chaque volontaire, strictement avant `cutoff`.
    pub fn last_assigned_before(&self, cutoff: NaiveDate) -> HashMap<VolunteerId, NaiveDate> {
        let mut out: HashMap<VolunteerId, NaiveDate> = HashMap::new();
        for record in self.assignments.iter().filter(|a| a.date < cutoff) {
            for volunteer in [&record.requester, &record.door_opener] {
                let last = out.entry(volunteer.clone()).or_insert(record.date);
                *last = (*last).max(record.date);
            }
        }
        out
    }

    /// Réaligne les compteurs stockés sur les items d'escala.
    pub fn recount(&mut self) {
        let derived = self.derived_counters();
        for volunteer in &mut self.volunteers {
            let (counters, last) = derived.get(&volunteer.id).copied().unwrap_or_default();
            volunteer.counters = counters;
            volunteer.last_assigned = last;
        }
    }
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}
