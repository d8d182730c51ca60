use super::Standing;
use crate::model::{AssignmentId, AssignmentRecord, Counters};
use chrono::NaiveDate;

/// Clé de tri des candidats : le moins chargé d'abord, puis le moins
/// récemment affecté (jamais affecté en tête).
pub(super) fn rank(standing: &Standing) -> (u32, Option<NaiveDate>) {
    (standing.counters.assignments, standing.last_assigned)
}

/// Le premier retenu a trop demandé, ou le second a trop ouvert : on inverse.
pub(super) fn should_swap(first: &Counters, second: &Counters) -> bool {
    first.requester > first.door_opener || second.door_opener > second.requester
}

pub(super) fn find_assignment_index(
    records: &[AssignmentRecord],
    id: &AssignmentId,
) -> Option<usize> {
    records.iter().position(|r| &r.id == id)
}
