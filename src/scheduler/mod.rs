mod conflicts;
mod mutate;
mod rotation;
mod types;
mod util;

pub use rotation::{rotate, Rotation};
pub use types::{Conflict, ConflictKind, RotationOptions, SchedError, Standing};

use crate::calendar;
use crate::model::{
    AssignmentId, AssignmentRecord, ChurchId, MonthScope, Registry, RoleId, VolunteerId,
};
use chrono::NaiveDate;

/// RotationScheduler : encapsule le Registry sur lequel on génère les escalas
#[derive(Debug, Default)]
pub struct RotationScheduler {
    registry: Registry,
}

impl RotationScheduler {
    pub fn new() -> Self {
        Self {
            registry: Registry::default(),
        }
    }

    pub fn from_registry(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Génère l'escala des dates données pour (église, fonction).
    ///
    /// Les items existants des mois touchés sont remplacés en bloc ; en cas
    /// d'erreur le registre reste inchangé.
    pub fn generate(
        &mut self,
        dates: &[NaiveDate],
        church: &ChurchId,
        role: &RoleId,
        opts: RotationOptions,
    ) -> Result<Vec<AssignmentRecord>, SchedError> {
        rotation::generate(self, dates, church, role, opts)
    }

    /// Génère tout un mois à partir des jours de culte de l'église.
    pub fn generate_month(
        &mut self,
        church: &ChurchId,
        role: &RoleId,
        scope: MonthScope,
        opts: RotationOptions,
    ) -> Result<Vec<AssignmentRecord>, SchedError> {
        rotation::validate(&self.registry, church, role)?;
        let entry = self
            .registry
            .find_church(church)
            .ok_or_else(|| SchedError::UnknownChurch(church.clone()))?;
        let dates = calendar::month_calendar_dates(entry, scope)?;
        if dates.is_empty() {
            // aucun jour de culte : on vide quand même le mois
            let removed = self.registry.delete_assignments(church, role, scope);
            if removed > 0 {
                self.registry.recount();
            }
            return Ok(Vec::new());
        }
        self.generate(&dates, church, role, opts)
    }

    /// Escala d'un mois, triée par culte.
    pub fn schedule_for_month(
        &self,
        church: &ChurchId,
        role: &RoleId,
        scope: MonthScope,
    ) -> Vec<&AssignmentRecord> {
        let mut out: Vec<&AssignmentRecord> = self
            .registry
            .assignments
            .iter()
            .filter(|a| a.in_scope(church, role, scope))
            .collect();
        out.sort_by_key(|a| a.service_date());
        out
    }

    pub fn detect_conflicts(&self) -> Vec<Conflict> {
        conflicts::detect_conflicts(self)
    }

    pub fn replace_volunteer(
        &mut self,
        record: &AssignmentId,
        from: &VolunteerId,
        to: &VolunteerId,
    ) -> Result<(), SchedError> {
        mutate::replace_volunteer(self, record, from, to)
    }

    pub fn exchange_roles(&mut self, record: &AssignmentId) -> Result<(), SchedError> {
        mutate::exchange_roles(self, record)
    }
}
