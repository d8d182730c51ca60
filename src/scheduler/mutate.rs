use super::{util, RotationScheduler, SchedError};
use crate::model::{AssignmentId, SubRole, VolunteerId};

pub(super) fn replace_volunteer(
    scheduler: &mut RotationScheduler,
    record_id: &AssignmentId,
    from: &VolunteerId,
    to: &VolunteerId,
) -> Result<(), SchedError> {
    let Some(pos) = util::find_assignment_index(&scheduler.registry.assignments, record_id) else {
        return Err(SchedError::UnknownAssignment(record_id.clone()));
    };

    let record = &scheduler.registry.assignments[pos];
    let Some(sub_role) = record.sub_role_of(from) else {
        return Err(SchedError::AmendInvalid("volunteer not in record"));
    };
    if from == to {
        return Err(SchedError::AmendInvalid("same volunteer"));
    }

    let target = scheduler
        .registry
        .find_volunteer(to)
        .ok_or_else(|| SchedError::UnknownVolunteer(to.clone()))?;
    if target.church != record.church || target.role != record.role {
        return Err(SchedError::AmendInvalid("volunteer outside church or role"));
    }
    if !target.is_available(record.tag) {
        return Err(SchedError::AmendInvalid("volunteer unavailable for service"));
    }
    if record.involves(to) {
        return Err(SchedError::AmendInvalid("volunteer already in record"));
    }

    let record = &mut scheduler.registry.assignments[pos];
    match sub_role {
        SubRole::Requester => record.requester = to.clone(),
        SubRole::DoorOpener => record.door_opener = to.clone(),
    }
    scheduler.registry.recount();
    Ok(())
}

pub(super) fn exchange_roles(
    scheduler: &mut RotationScheduler,
    record_id: &AssignmentId,
) -> Result<(), SchedError> {
    let Some(pos) = util::find_assignment_index(&scheduler.registry.assignments, record_id) else {
        return Err(SchedError::UnknownAssignment(record_id.clone()));
    };

    let record = &mut scheduler.registry.assignments[pos];
    std::mem::swap(&mut record.requester, &mut record.door_opener);
    scheduler.registry.recount();
    Ok(())
}
