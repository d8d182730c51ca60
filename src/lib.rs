#![forbid(unsafe_code)]
//! Escala — génération des escalas de porteiros par église et par fonction.
//!
//! - Stockage fichier (JSON, écriture atomique) ; import CSV.
//! - Rotation gloutonne équitable : charge totale puis demandeur / ouvreur.
//! - Disponibilités par type de culte, dimanche matin (RDJ) distinct du soir.
//! - Remplacement d'un mois en bloc, audit des incohérences.

pub mod calendar;
pub mod io;
pub mod model;
pub mod scheduler;
pub mod storage;

pub use model::{
    AssignmentId, AssignmentRecord, Church, ChurchId, Counters, MonthScope, Registry, Role,
    RoleId, ServiceDate, ServiceTag, ServiceTags, SubRole, Volunteer, VolunteerId,
};
pub use scheduler::{
    rotate, Conflict, ConflictKind, Rotation, RotationOptions, RotationScheduler, SchedError,
    Standing,
};
pub use storage::{generate_persisted, JsonStorage, Storage};
