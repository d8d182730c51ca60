//! Expansion des mois en cultes à couvrir.
//!
//! Table de correspondance date → tag : un jour de semaine donne son tag
//! s'il fait partie des jours de culte de l'église ; un dimanche peut
//! donner le culte du matin (RDJ), celui du soir, les deux ou aucun.

use crate::model::{Church, MonthScope, ServiceDate, ServiceTag, ServiceTags};
use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Weekday};

/// Tags de culte d'une date, dans l'ordre de la journée.
pub fn tags_for_date(date: NaiveDate, service_days: ServiceTags) -> Vec<ServiceTag> {
    let weekday = date.weekday();
    let mut candidates = Vec::with_capacity(2);
    if weekday == Weekday::Sun {
        candidates.push(ServiceTag::EarlySunday);
    }
    candidates.push(ServiceTag::from_weekday(weekday));
    candidates.retain(|tag| service_days.contains(*tag));
    candidates
}

/// Développe des dates calendaires en cultes, triés et sans doublon.
pub fn expand(dates: &[NaiveDate], service_days: ServiceTags) -> Vec<ServiceDate> {
    let mut out: Vec<ServiceDate> = dates
        .iter()
        .flat_map(|date| {
            tags_for_date(*date, service_days)
                .into_iter()
                .map(move |tag| ServiceDate::new(*date, tag))
        })
        .collect();
    out.sort();
    out.dedup();
    out
}

/// Tous les jours d'un mois.
pub fn month_days(scope: MonthScope) -> Result<Vec<NaiveDate>> {
    let mut current = scope
        .first_day()
        .with_context(|| format!("invalid month {scope}"))?;
    let mut out = Vec::with_capacity(31);
    while scope.contains(current) {
        out.push(current);
        current = current.succ_opt().context("date overflow")?;
    }
    Ok(out)
}

/// Dates du mois où l'église a au moins un culte.
pub fn month_calendar_dates(church: &Church, scope: MonthScope) -> Result<Vec<NaiveDate>> {
    Ok(month_days(scope)?
        .into_iter()
        .filter(|date| !tags_for_date(*date, church.service_days).is_empty())
        .collect())
}

/// Cultes du mois pour l'église (dimanches éclatés en RDJ / soir).
pub fn month_service_dates(church: &Church, scope: MonthScope) -> Result<Vec<ServiceDate>> {
    Ok(expand(&month_days(scope)?, church.service_days))
}

/// Mois distincts présents dans une liste de dates, triés.
pub fn month_scopes(dates: &[NaiveDate]) -> Vec<MonthScope> {
    let mut scopes: Vec<MonthScope> = dates.iter().map(|d| MonthScope::of(*d)).collect();
    scopes.sort();
    scopes.dedup();
    scopes
}
