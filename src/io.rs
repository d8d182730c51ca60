use crate::model::{AssignmentRecord, Registry, ServiceTags, Volunteer, VolunteerId};
use crate::scheduler::{Conflict, ConflictKind};
use anyhow::{bail, Context};
use csv::{ReaderBuilder, WriterBuilder};
use std::fmt::Write as _;
use std::path::Path;

/// Import de volontaires depuis CSV: header `name,church,role[,available]`.
///
/// L'église et la fonction sont cherchées par nom dans le registre ;
/// `available` est une liste de tags (`rdj|sun|wed`), vide = aucune dispo.
pub fn import_volunteers_csv<P: AsRef<Path>>(
    path: P,
    registry: &Registry,
) -> anyhow::Result<Vec<Volunteer>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let name = rec.get(0).context("missing name")?.trim();
        let church = rec.get(1).context("missing church")?.trim();
        let role = rec.get(2).context("missing role")?.trim();
        if name.is_empty() || church.is_empty() || role.is_empty() {
            bail!("invalid volunteer row (empty)");
        }
        let church = registry
            .find_church_by_name(church)
            .with_context(|| format!("unknown church {church} for volunteer {name}"))?;
        let role = registry
            .find_role_by_name(role)
            .with_context(|| format!("unknown role {role} for volunteer {name}"))?;
        let availability = match rec.get(3).map(str::trim) {
            Some(raw) if !raw.is_empty() => ServiceTags::parse_list(raw)
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("invalid availability for volunteer {name}"))?,
            _ => ServiceTags::empty(),
        };
        out.push(Volunteer::new(
            name,
            church.id.clone(),
            role.id.clone(),
            availability,
        ));
    }
    Ok(out)
}

/// Export CSV de l'audit: header `kind,volunteer,record,other`
pub fn export_conflicts_csv<P: AsRef<Path>>(path: P, conflicts: &[Conflict]) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record(["kind", "volunteer", "record", "other"])?;
    for c in conflicts {
        w.write_record([
            conflict_kind_key(c.kind),
            c.volunteer.as_ref().map(|v| v.as_str()).unwrap_or(""),
            c.record.as_ref().map(|r| r.as_str()).unwrap_or(""),
            c.other.as_ref().map(|r| r.as_str()).unwrap_or(""),
        ])?;
    }
    w.flush()?;
    Ok(())
}

pub fn conflict_kind_key(kind: ConflictKind) -> &'static str {
    match kind {
        ConflictKind::SameVolunteerTwice => "same_volunteer",
        ConflictKind::DuplicateSlot => "duplicate",
        ConflictKind::Unavailable => "unavailable",
        ConflictKind::CounterDrift => "counter_drift",
    }
}

/// Export CSV des compteurs: header `id,name,assignments,requester,door_opener,last_assigned`
pub fn export_stats_csv<P: AsRef<Path>>(path: P, registry: &Registry) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record(["id", "name", "assignments", "requester", "door_opener", "last_assigned"])?;
    let (mut total, mut req, mut door) = (itoa::Buffer::new(), itoa::Buffer::new(), itoa::Buffer::new());
    for v in &registry.volunteers {
        let last = v.last_assigned.map(|d| d.to_string()).unwrap_or_default();
        w.write_record([
            v.id.as_str(),
            v.name.as_str(),
            total.format(v.counters.assignments),
            req.format(v.counters.requester),
            door.format(v.counters.door_opener),
            last.as_str(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Rendu texte d'une escala, une ligne par culte.
pub fn render_schedule(registry: &Registry, records: &[&AssignmentRecord]) -> String {
    let name_of = |id: &VolunteerId| {
        registry
            .find_volunteer(id)
            .map(|v| v.name.clone())
            .unwrap_or_else(|| format!("<{id}>"))
    };
    let mut out = String::new();
    for r in records {
        let _ = writeln!(
            out,
            "{} {:<3} | {} -> {}",
            r.date,
            r.tag.key(),
            name_of(&r.requester),
            name_of(&r.door_opener)
        );
    }
    out
}
