use super::{Conflict, ConflictKind, RotationScheduler};
use crate::model::{AssignmentRecord, VolunteerId};

pub(super) fn detect_conflicts(scheduler: &RotationScheduler) -> Vec<Conflict> {
    let registry = &scheduler.registry;
    let mut out = Vec::new();

    for (idx, a) in registry.assignments.iter().enumerate() {
        if a.requester == a.door_opener {
            out.push(conflict(ConflictKind::SameVolunteerTwice, Some(&a.requester), a, None));
        }

        for b in registry.assignments.iter().skip(idx + 1) {
            if a.church == b.church && a.role == b.role && a.service_date() == b.service_date() {
                out.push(conflict(ConflictKind::DuplicateSlot, None, a, Some(b)));
            }
        }

        for volunteer_id in [&a.requester, &a.door_opener] {
            let fits = registry.find_volunteer(volunteer_id).is_some_and(|v| {
                v.church == a.church && v.role == a.role && v.is_available(a.tag)
            });
            if !fits {
                out.push(conflict(ConflictKind::Unavailable, Some(volunteer_id), a, None));
            }
        }
    }

    let derived = registry.derived_counters();
    for volunteer in &registry.volunteers {
        let (counters, _) = derived.get(&volunteer.id).copied().unwrap_or_default();
        if counters != volunteer.counters {
            out.push(Conflict {
                kind: ConflictKind::CounterDrift,
                volunteer: Some(volunteer.id.clone()),
                record: None,
                other: None,
            });
        }
    }

    out
}

fn conflict(
    kind: ConflictKind,
    volunteer: Option<&VolunteerId>,
    record: &AssignmentRecord,
    other: Option<&AssignmentRecord>,
) -> Conflict {
    Conflict {
        kind,
        volunteer: volunteer.cloned(),
        record: Some(record.id.clone()),
        other: other.map(|o| o.id.clone()),
    }
}
