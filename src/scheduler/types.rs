use crate::model::{AssignmentId, ChurchId, Counters, RoleId, VolunteerId};
use chrono::NaiveDate;
use thiserror::Error;

/// Options de rotation
#[derive(Debug, Clone, Copy)]
pub struct RotationOptions {
    /// Part des compteurs historiques ; sinon tout le monde démarre à zéro.
    pub seed_from_history: bool,
}

impl Default for RotationOptions {
    fn default() -> Self {
        Self {
            seed_from_history: true,
        }
    }
}

/// État d'un volontaire pendant (et à l'issue de) une rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    pub volunteer: VolunteerId,
    pub counters: Counters,
    pub last_assigned: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    SameVolunteerTwice,
    DuplicateSlot,
    Unavailable,
    CounterDrift,
}

#[derive(Debug, Clone)]
pub struct Conflict {
    pub kind: ConflictKind,
    pub volunteer: Option<VolunteerId>,
    pub record: Option<AssignmentId>,
    pub other: Option<AssignmentId>,
}

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("no service dates given")]
    NoServiceDates,
    #[error("unknown church: {0}")]
    UnknownChurch(ChurchId),
    #[error("unknown role: {0}")]
    UnknownRole(RoleId),
    #[error("role is not active: {0}")]
    InactiveRole(RoleId),
    #[error("unknown volunteer: {0}")]
    UnknownVolunteer(VolunteerId),
    #[error("unknown assignment: {0}")]
    UnknownAssignment(AssignmentId),
    #[error("amend invalid: {0}")]
    AmendInvalid(&'static str),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
