use super::{types::SchedError, util, RotationOptions, RotationScheduler, Standing};
use crate::calendar;
use crate::model::{
    AssignmentRecord, ChurchId, Registry, RoleId, ServiceDate, ServiceTag, ServiceTags, SubRole,
    Volunteer,
};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Résultat d'une rotation : les items émis et l'état final des compteurs,
/// dans l'ordre du pool.
#[derive(Debug, Clone, Default)]
pub struct Rotation {
    pub records: Vec<AssignmentRecord>,
    pub standings: Vec<Standing>,
}

/// Rotation gloutonne, sans accès au registre.
///
/// Les cultes sont traités dans l'ordre chronologique ; pour chacun, les deux
/// candidats disponibles les moins chargés sont retenus, puis l'ordre
/// demandeur / ouvreur est corrigé localement selon leurs propres compteurs.
/// Un culte avec moins de deux candidats est ignoré.
pub fn rotate(
    pool: &[Volunteer],
    slots: &[ServiceDate],
    church: &ChurchId,
    role: &RoleId,
    opts: RotationOptions,
) -> Rotation {
    let mut seen = HashSet::new();
    let pool: Vec<&Volunteer> = pool.iter().filter(|v| seen.insert(v.id.clone())).collect();

    let mut standings: Vec<Standing> = pool
        .iter()
        .map(|v| {
            if opts.seed_from_history {
                Standing {
                    volunteer: v.id.clone(),
                    counters: v.counters,
                    last_assigned: v.last_assigned,
                }
            } else {
                Standing {
                    volunteer: v.id.clone(),
                    counters: Default::default(),
                    last_assigned: None,
                }
            }
        })
        .collect();

    let mut slots = slots.to_vec();
    slots.sort();
    slots.dedup();

    let mut records = Vec::new();
    for slot in &slots {
        let mut candidates: Vec<usize> = pool
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_available(slot.tag))
            .map(|(idx, _)| idx)
            .collect();

        if candidates.len() < 2 {
            debug!(date = %slot.date, tag = %slot.tag, candidates = candidates.len(), "not enough volunteers, slot skipped");
            continue;
        }

        // sort_by_key est stable : à égalité, l'ordre du pool l'emporte
        candidates.sort_by_key(|idx| util::rank(&standings[*idx]));
        let (first, second) = (candidates[0], candidates[1]);

        let (requester, door_opener) =
            if util::should_swap(&standings[first].counters, &standings[second].counters) {
                (second, first)
            } else {
                (first, second)
            };

        for (idx, sub_role) in [(requester, SubRole::Requester), (door_opener, SubRole::DoorOpener)] {
            let standing = &mut standings[idx];
            standing.counters.record(sub_role);
            standing.last_assigned = Some(slot.date);
        }

        debug!(
            date = %slot.date,
            tag = %slot.tag,
            requester = %pool[requester].name,
            door_opener = %pool[door_opener].name,
            "pair assigned"
        );

        records.push(AssignmentRecord::new(
            *slot,
            church.clone(),
            role.clone(),
            pool[requester].id.clone(),
            pool[door_opener].id.clone(),
        ));
    }

    Rotation { records, standings }
}

/// Vérifie le couple (église, fonction) ; renvoie les jours de culte.
pub(super) fn validate(
    registry: &Registry,
    church: &ChurchId,
    role: &RoleId,
) -> Result<ServiceTags, SchedError> {
    let service_days = registry
        .church_service_tags(church)
        .ok_or_else(|| SchedError::UnknownChurch(church.clone()))?;
    let role_entry = registry
        .find_role(role)
        .ok_or_else(|| SchedError::UnknownRole(role.clone()))?;
    if !role_entry.active {
        return Err(SchedError::InactiveRole(role.clone()));
    }
    Ok(service_days)
}

pub(super) fn generate(
    scheduler: &mut RotationScheduler,
    dates: &[NaiveDate],
    church: &ChurchId,
    role: &RoleId,
    opts: RotationOptions,
) -> Result<Vec<AssignmentRecord>, SchedError> {
    let registry = &scheduler.registry;
    let service_days = validate(registry, church, role)?;
    if dates.is_empty() {
        return Err(SchedError::NoServiceDates);
    }

    // Tout se fait sur une copie : le registre n'est remplacé qu'en fin de course.
    let mut working = registry.clone();

    let mut removed = 0usize;
    for scope in calendar::month_scopes(dates) {
        removed += working.delete_assignments(church, role, scope);
    }
    working.recount();

    let slots = calendar::expand(dates, service_days);
    for date in dates {
        if !slots.iter().any(|s| s.date == *date) {
            warn!(%date, "no service on this date for the church, ignored");
        }
    }

    let pool = load_pool(&working, &slots, church, role);
    let rotation = rotate(&pool, &slots, church, role, opts);

    working.insert_assignments(rotation.records.iter().cloned());
    working.recount();

    info!(
        church = %church,
        role = %role,
        slots = slots.len(),
        pool = pool.len(),
        removed,
        inserted = rotation.records.len(),
        "schedule generated"
    );

    scheduler.registry = working;
    Ok(rotation.records)
}

/// Pool éligible chargé une fois par tag, fusionné par id, remis dans
/// l'ordre d'inscription. `slots` doit être trié.
fn load_pool(
    registry: &Registry,
    slots: &[ServiceDate],
    church: &ChurchId,
    role: &RoleId,
) -> Vec<Volunteer> {
    let mut tags: Vec<ServiceTag> = slots.iter().map(|s| s.tag).collect();
    tags.sort();
    tags.dedup();

    let mut pool: Vec<Volunteer> = Vec::new();
    for tag in tags {
        for volunteer in registry.eligible_volunteers(church, role, tag) {
            if !pool.iter().any(|p| p.id == volunteer.id) {
                pool.push(volunteer);
            }
        }
    }

    let order: HashMap<_, _> = registry
        .volunteers
        .iter()
        .enumerate()
        .map(|(idx, v)| (v.id.clone(), idx))
        .collect();
    pool.sort_by_key(|v| order.get(&v.id).copied().unwrap_or(usize::MAX));

    // l'ancienneté ne tient compte que des cultes antérieurs au premier généré
    if let Some(first) = slots.first() {
        let recent = registry.last_assigned_before(first.date);
        for volunteer in &mut pool {
            volunteer.last_assigned = recent.get(&volunteer.id).copied();
        }
    }
    pool
}
