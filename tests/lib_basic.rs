#![forbid(unsafe_code)]
use escala::{
    model::{AssignmentRecord, Church, ChurchId, MonthScope, Role, RoleId, ServiceDate, ServiceTag, ServiceTags, Volunteer, VolunteerId},
    scheduler::{RotationOptions, RotationScheduler, SchedError},
};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn tags(raw: &str) -> ServiceTags {
    ServiceTags::parse_list(raw).unwrap()
}

fn setup(days: &str) -> (RotationScheduler, ChurchId, RoleId) {
    let mut s = RotationScheduler::new();
    let church = s.registry_mut().add_church(Church::new("Sede", tags(days))).unwrap();
    let role = s.registry_mut().add_role(Role::new("Porteiro")).unwrap();
    (s, church, role)
}

fn add(s: &mut RotationScheduler, name: &str, church: &ChurchId, role: &RoleId, available: &str) -> VolunteerId {
    s.registry_mut()
        .add_volunteer(Volunteer::new(name, church.clone(), role.clone(), tags(available)))
        .unwrap()
}

fn summary(records: &[AssignmentRecord]) -> Vec<(NaiveDate, ServiceTag, VolunteerId, VolunteerId)> {
    records
        .iter()
        .map(|r| (r.date, r.tag, r.requester.clone(), r.door_opener.clone()))
        .collect()
}

#[test]
fn each_slot_gets_a_distinct_pair_or_nothing() {
    let (mut s, church, role) = setup("rdj,sun,wed");
    add(&mut s, "Ana", &church, &role, "rdj,sun,wed");
    add(&mut s, "Bia", &church, &role, "sun,wed");
    add(&mut s, "Caio", &church, &role, "sun");
    add(&mut s, "Davi", &church, &role, "wed");

    let scope = MonthScope::new(2025, 10).unwrap();
    let records = s.generate_month(&church, &role, scope, RotationOptions::default()).unwrap();

    // RDJ : une seule personne disponible, jamais couvert
    assert!(records.iter().all(|r| r.tag != ServiceTag::EarlySunday));
    // 4 dimanches soir + 5 mercredis
    assert_eq!(records.len(), 9);

    let mut slots = HashSet::new();
    for r in &records {
        assert_ne!(r.requester, r.door_opener);
        assert!(slots.insert(r.service_date()), "slot covered twice");
    }
}

#[test]
fn selection_always_takes_the_lowest_counts() {
    let (mut s, church, role) = setup("sun,wed");
    for (name, available) in [("Ana", "sun,wed"), ("Bia", "wed"), ("Caio", "sun"), ("Davi", "sun,wed"), ("Eva", "wed")] {
        add(&mut s, name, &church, &role, available);
    }
    let scope = MonthScope::new(2025, 10).unwrap();
    let records = s.generate_month(&church, &role, scope, RotationOptions::default()).unwrap();
    assert!(!records.is_empty());

    // rejoue la génération et vérifie qu'aucun candidat moins chargé n'a été écarté
    let registry = s.registry();
    let mut counts: HashMap<VolunteerId, u32> = HashMap::new();
    for r in &records {
        let chosen_max = [&r.requester, &r.door_opener]
            .iter()
            .map(|id| counts.get(*id).copied().unwrap_or(0))
            .max()
            .unwrap();
        for v in &registry.volunteers {
            if v.is_available(r.tag) && !r.involves(&v.id) {
                assert!(counts.get(&v.id).copied().unwrap_or(0) >= chosen_max);
            }
        }
        *counts.entry(r.requester.clone()).or_default() += 1;
        *counts.entry(r.door_opener.clone()).or_default() += 1;
    }
}

#[test]
fn regeneration_replaces_the_month() {
    let (mut s, church, role) = setup("sun,wed");
    for name in ["Ana", "Bia", "Caio"] {
        add(&mut s, name, &church, &role, "sun,wed");
    }
    let scope = MonthScope::new(2025, 10).unwrap();

    let first = s.generate_month(&church, &role, scope, RotationOptions::default()).unwrap();
    let counters_after_first: Vec<_> = s.registry().volunteers.iter().map(|v| v.counters).collect();
    let second = s.generate_month(&church, &role, scope, RotationOptions::default()).unwrap();

    assert_eq!(summary(&first), summary(&second));
    assert_eq!(s.schedule_for_month(&church, &role, scope).len(), second.len());
    assert_eq!(s.registry().assignments.len(), second.len());
    let counters_after_second: Vec<_> = s.registry().volunteers.iter().map(|v| v.counters).collect();
    assert_eq!(counters_after_first, counters_after_second);
}

#[test]
fn sub_roles_are_corrected_from_history() {
    let (mut s, church, role) = setup("wed");
    let a = add(&mut s, "Ana", &church, &role, "wed");
    let b = add(&mut s, "Bia", &church, &role, "wed");

    // historique août-septembre : Ana demande toujours, Bia ouvre toujours
    let history: Vec<AssignmentRecord> = [(8, 27), (9, 3), (9, 10), (9, 17), (9, 24)]
        .iter()
        .map(|(month, day)| {
            AssignmentRecord::new(
                ServiceDate::new(d(2025, *month, *day), ServiceTag::Wednesday),
                church.clone(),
                role.clone(),
                a.clone(),
                b.clone(),
            )
        })
        .collect();
    s.registry_mut().insert_assignments(history);
    s.registry_mut().recount();
    let ana = s.registry().find_volunteer(&a).unwrap();
    assert_eq!((ana.counters.requester, ana.counters.door_opener), (5, 0));

    let records = s
        .generate(&[d(2025, 10, 1)], &church, &role, RotationOptions::default())
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].requester, b);
    assert_eq!(records[0].door_opener, a);

    // l'historique n'est pas touché
    assert_eq!(s.registry().assignments.len(), 6);
    assert_eq!(s.registry().find_volunteer(&a).unwrap().counters.door_opener, 1);
}

#[test]
fn later_months_do_not_count_as_recent() {
    let (mut s, church, role) = setup("wed");
    let ids: Vec<_> = ["Ana", "Bia", "Caio", "Davi"]
        .iter()
        .map(|n| add(&mut s, n, &church, &role, "wed"))
        .collect();

    // septembre : Ana et Bia ; novembre (déjà généré) : Caio et Davi
    let record = |date: NaiveDate, req: &VolunteerId, door: &VolunteerId| {
        AssignmentRecord::new(
            ServiceDate::new(date, ServiceTag::Wednesday),
            church.clone(),
            role.clone(),
            req.clone(),
            door.clone(),
        )
    };
    let history = [
        record(d(2025, 9, 3), &ids[0], &ids[1]),
        record(d(2025, 11, 5), &ids[2], &ids[3]),
    ];
    s.registry_mut().insert_assignments(history);
    s.registry_mut().recount();

    let records = s
        .generate(&[d(2025, 10, 1)], &church, &role, RotationOptions::default())
        .unwrap();
    assert_eq!(records.len(), 1);
    // Caio et Davi n'ont rien fait avant octobre : ils passent en premier
    assert!(records[0].involves(&ids[2]));
    assert!(records[0].involves(&ids[3]));
    assert_eq!(s.registry().assignments.len(), 3);
}

#[test]
fn sunday_yields_two_independent_services() {
    let (mut s, church, role) = setup("rdj,sun");
    let early: Vec<_> = ["Ana", "Bia"].iter().map(|n| add(&mut s, n, &church, &role, "rdj")).collect();
    let evening: Vec<_> = ["Caio", "Davi"].iter().map(|n| add(&mut s, n, &church, &role, "sun")).collect();

    let records = s
        .generate(&[d(2025, 10, 5)], &church, &role, RotationOptions::default())
        .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].tag, ServiceTag::EarlySunday);
    assert!(early.iter().all(|id| records[0].involves(id)));
    assert_eq!(records[1].tag, ServiceTag::Sunday);
    assert!(evening.iter().all(|id| records[1].involves(id)));
}

#[test]
fn empty_pool_clears_the_month_without_inserting() {
    let (mut s, church, role) = setup("sun,wed");
    let stale = AssignmentRecord::new(
        ServiceDate::new(d(2025, 10, 8), ServiceTag::Wednesday),
        church.clone(),
        role.clone(),
        VolunteerId::new("gone-1"),
        VolunteerId::new("gone-2"),
    );
    s.registry_mut().insert_assignments([stale]);

    let dates = [d(2025, 10, 1), d(2025, 10, 5), d(2025, 10, 8), d(2025, 10, 12), d(2025, 10, 15)];
    let records = s.generate(&dates, &church, &role, RotationOptions::default()).unwrap();
    assert!(records.is_empty());
    assert!(s.registry().assignments.is_empty());
}

#[test]
fn every_month_present_is_cleared() {
    let (mut s, church, role) = setup("wed");
    add(&mut s, "Ana", &church, &role, "wed");
    add(&mut s, "Bia", &church, &role, "wed");

    let dates = [d(2025, 10, 29), d(2025, 11, 5)];
    s.generate(&dates, &church, &role, RotationOptions::default()).unwrap();
    s.generate(&dates, &church, &role, RotationOptions::default()).unwrap();

    assert_eq!(s.registry().assignments.len(), 2);
    assert_eq!(s.schedule_for_month(&church, &role, MonthScope::new(2025, 11).unwrap()).len(), 1);
}

#[test]
fn other_scopes_are_left_alone() {
    let (mut s, church, role) = setup("wed");
    let other_role = s.registry_mut().add_role(Role::new("Recepção")).unwrap();
    for name in ["Ana", "Bia"] {
        add(&mut s, name, &church, &role, "wed");
    }
    for name in ["Caio", "Davi"] {
        add(&mut s, name, &church, &other_role, "wed");
    }
    let scope = MonthScope::new(2025, 10).unwrap();
    let porteiros = s.generate_month(&church, &role, scope, RotationOptions::default()).unwrap();
    let recepcao = s.generate_month(&church, &other_role, scope, RotationOptions::default()).unwrap();
    s.generate_month(&church, &role, scope, RotationOptions::default()).unwrap();

    assert_eq!(s.registry().assignments.len(), porteiros.len() + recepcao.len());
    assert_eq!(s.schedule_for_month(&church, &other_role, scope).len(), recepcao.len());
}

#[test]
fn invalid_requests_are_rejected() {
    let (mut s, church, role) = setup("wed");
    let mut inactive = Role::new("Antiga");
    inactive.active = false;
    let inactive = s.registry_mut().add_role(inactive).unwrap();

    let dates = [d(2025, 10, 1)];
    assert!(matches!(
        s.generate(&dates, &church, &inactive, RotationOptions::default()),
        Err(SchedError::InactiveRole(_))
    ));
    assert!(matches!(
        s.generate(&dates, &ChurchId::new("nope"), &role, RotationOptions::default()),
        Err(SchedError::UnknownChurch(_))
    ));
    assert!(matches!(
        s.generate(&[], &church, &role, RotationOptions::default()),
        Err(SchedError::NoServiceDates)
    ));
}

#[test]
fn church_without_service_days_generates_nothing() {
    let (mut s, church, role) = setup("");
    add(&mut s, "Ana", &church, &role, "sun,wed");
    add(&mut s, "Bia", &church, &role, "sun,wed");
    let scope = MonthScope::new(2025, 10).unwrap();
    let records = s.generate_month(&church, &role, scope, RotationOptions::default()).unwrap();
    assert!(records.is_empty());
}

#[test]
fn month_without_service_days_still_checks_the_role() {
    let (mut s, church, _) = setup("");
    let mut retired = Role::new("Antiga");
    retired.active = false;
    let retired = s.registry_mut().add_role(retired).unwrap();
    let kept = AssignmentRecord::new(
        ServiceDate::new(d(2025, 10, 8), ServiceTag::Wednesday),
        church.clone(),
        retired.clone(),
        VolunteerId::new("v-1"),
        VolunteerId::new("v-2"),
    );
    s.registry_mut().insert_assignments([kept]);
    let scope = MonthScope::new(2025, 10).unwrap();

    assert!(matches!(
        s.generate_month(&church, &RoleId::new("nope"), scope, RotationOptions::default()),
        Err(SchedError::UnknownRole(_))
    ));
    assert!(matches!(
        s.generate_month(&church, &retired, scope, RotationOptions::default()),
        Err(SchedError::InactiveRole(_))
    ));
    // rien n'a été effacé
    assert_eq!(s.schedule_for_month(&church, &retired, scope).len(), 1);
}

#[test]
fn rendered_schedule() {
    let (mut s, church, role) = setup("wed");
    for name in ["Ana", "Bia", "Caio"] {
        add(&mut s, name, &church, &role, "wed");
    }
    let dates = [d(2025, 10, 15), d(2025, 10, 1), d(2025, 10, 8)];
    s.generate(&dates, &church, &role, RotationOptions { seed_from_history: false })
        .unwrap();
    let scope = MonthScope::new(2025, 10).unwrap();
    let records = s.schedule_for_month(&church, &role, scope);
    let rendered = escala::io::render_schedule(s.registry(), &records);
    insta::assert_snapshot!(rendered.trim_end(), @r"
2025-10-01 wed | Ana -> Bia
2025-10-08 wed | Caio -> Ana
2025-10-15 wed | Bia -> Caio
");
}
