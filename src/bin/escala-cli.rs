#![forbid(unsafe_code)]
use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use escala::{
    io,
    model::{AssignmentId, Church, ChurchId, MonthScope, Registry, Role, RoleId, ServiceTags, Volunteer, VolunteerId},
    scheduler::{RotationOptions, RotationScheduler},
    storage::{JsonStorage, Storage},
};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI d'escala des porteiros (stockage JSON local)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON du registre
    #[arg(long, global = true, default_value = "escala.json")]
    registry: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Enregistrer une église et ses jours de culte
    AddChurch {
        #[arg(long)]
        name: String,
        /// liste "rdj,sun,wed"
        #[arg(long, default_value = "")]
        days: String,
    },

    /// Enregistrer une fonction
    AddRole {
        #[arg(long)]
        name: String,
        #[arg(long)]
        inactive: bool,
    },

    /// Enregistrer un volontaire
    AddVolunteer {
        #[arg(long)]
        name: String,
        #[arg(long)]
        church: String,
        #[arg(long)]
        role: String,
        /// liste "rdj,sun,wed"
        #[arg(long, default_value = "")]
        available: String,
    },

    /// Importer des volontaires depuis un CSV
    ImportVolunteers {
        #[arg(long)]
        csv: String,
    },

    /// Modifier les disponibilités d'un volontaire
    SetAvailability {
        /// nom ou id
        #[arg(long)]
        volunteer: String,
        #[arg(long)]
        available: String,
    },

    /// Supprimer un volontaire
    RemoveVolunteer {
        #[arg(long)]
        volunteer: String,
    },

    /// Générer (ou régénérer) l'escala d'un mois
    Generate {
        #[arg(long)]
        church: String,
        #[arg(long)]
        role: String,
        /// YYYY-MM
        #[arg(long)]
        month: String,
        /// Compteurs remis à zéro pour cette génération
        #[arg(long)]
        from_zero: bool,
    },

    /// Afficher l'escala d'un mois
    Show {
        #[arg(long)]
        church: String,
        #[arg(long)]
        role: String,
        #[arg(long)]
        month: String,
    },

    /// Remplacer un volontaire dans un item d'escala
    Replace {
        #[arg(long)]
        record: String,
        #[arg(long)]
        from: String,
        #[arg(long)]
        with: String,
    },

    /// Inverser demandeur et ouvreur d'un item
    Exchange {
        #[arg(long)]
        record: String,
    },

    /// Vérifier les incohérences
    Check {
        /// Export CSV des incohérences (optionnel)
        #[arg(long)]
        report: Option<String>,
    },

    /// Compteurs par volontaire
    Stats {
        #[arg(long)]
        out: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let storage = JsonStorage::open(&cli.registry)?;
    let mut scheduler = RotationScheduler::from_registry(storage.load_or_default()?);

    let code = match cli.cmd {
        Commands::AddChurch { name, days } => {
            let days = ServiceTags::parse_list(&days).map_err(anyhow::Error::msg)?;
            let id = scheduler
                .registry_mut()
                .add_church(Church::new(name, days))
                .map_err(anyhow::Error::msg)?;
            storage.save(scheduler.registry())?;
            println!("{id}");
            0
        }
        Commands::AddRole { name, inactive } => {
            let mut role = Role::new(name);
            role.active = !inactive;
            let id = scheduler.registry_mut().add_role(role).map_err(anyhow::Error::msg)?;
            storage.save(scheduler.registry())?;
            println!("{id}");
            0
        }
        Commands::AddVolunteer {
            name,
            church,
            role,
            available,
        } => {
            let church = resolve_church(scheduler.registry(), &church)?;
            let role = resolve_role(scheduler.registry(), &role)?;
            let availability = ServiceTags::parse_list(&available).map_err(anyhow::Error::msg)?;
            let id = scheduler
                .registry_mut()
                .add_volunteer(Volunteer::new(name, church, role, availability))
                .map_err(anyhow::Error::msg)?;
            storage.save(scheduler.registry())?;
            println!("{id}");
            0
        }
        Commands::ImportVolunteers { csv } => {
            let volunteers = io::import_volunteers_csv(csv, scheduler.registry())?;
            let count = volunteers.len();
            for v in volunteers {
                scheduler.registry_mut().add_volunteer(v).map_err(anyhow::Error::msg)?;
            }
            storage.save(scheduler.registry())?;
            println!("{count} volunteer(s) imported");
            0
        }
        Commands::SetAvailability {
            volunteer,
            available,
        } => {
            let id = resolve_volunteer(scheduler.registry(), &volunteer)?;
            let availability = ServiceTags::parse_list(&available).map_err(anyhow::Error::msg)?;
            scheduler.registry_mut().set_availability(&id, availability);
            storage.save(scheduler.registry())?;
            0
        }
        Commands::RemoveVolunteer { volunteer } => {
            let id = resolve_volunteer(scheduler.registry(), &volunteer)?;
            scheduler.registry_mut().remove_volunteer(&id);
            storage.save(scheduler.registry())?;
            0
        }
        Commands::Generate {
            church,
            role,
            month,
            from_zero,
        } => {
            let church = resolve_church(scheduler.registry(), &church)?;
            let role = resolve_role(scheduler.registry(), &role)?;
            let scope: MonthScope = month.parse().map_err(anyhow::Error::msg)?;
            let opts = RotationOptions {
                seed_from_history: !from_zero,
            };
            let records = scheduler.generate_month(&church, &role, scope, opts)?;
            storage.save(scheduler.registry())?;
            let refs: Vec<_> = records.iter().collect();
            print!("{}", io::render_schedule(scheduler.registry(), &refs));
            println!("{} service(s) scheduled for {scope}", records.len());
            0
        }
        Commands::Show {
            church,
            role,
            month,
        } => {
            let church = resolve_church(scheduler.registry(), &church)?;
            let role = resolve_role(scheduler.registry(), &role)?;
            let scope: MonthScope = month.parse().map_err(anyhow::Error::msg)?;
            let records = scheduler.schedule_for_month(&church, &role, scope);
            for r in records {
                print!("{} | ", r.id);
                print!("{}", io::render_schedule(scheduler.registry(), &[r]));
            }
            0
        }
        Commands::Replace { record, from, with } => {
            let from = resolve_volunteer(scheduler.registry(), &from)?;
            let to = resolve_volunteer(scheduler.registry(), &with)?;
            scheduler.replace_volunteer(&AssignmentId::new(record), &from, &to)?;
            storage.save(scheduler.registry())?;
            0
        }
        Commands::Exchange { record } => {
            scheduler.exchange_roles(&AssignmentId::new(record))?;
            storage.save(scheduler.registry())?;
            0
        }
        Commands::Check { report } => {
            let conflicts = scheduler.detect_conflicts();
            if conflicts.is_empty() {
                println!("OK: no conflicts");
                0
            } else {
                eprintln!("Found {} conflict(s)", conflicts.len());
                if let Some(path) = report {
                    io::export_conflicts_csv(path, &conflicts)?;
                }
                // Code 2 = WARNING/INCOMPLETE
                2
            }
        }
        Commands::Stats { out } => {
            if let Some(path) = out {
                io::export_stats_csv(path, scheduler.registry())?;
            }
            for v in &scheduler.registry().volunteers {
                println!(
                    "{} | total {} | requester {} | door-opener {}",
                    v.name, v.counters.assignments, v.counters.requester, v.counters.door_opener
                );
            }
            0
        }
    };

    std::process::exit(code);
}

fn resolve_church(registry: &Registry, key: &str) -> Result<ChurchId> {
    registry
        .find_church_by_name(key)
        .or_else(|| registry.find_church(&ChurchId::new(key)))
        .map(|c| c.id.clone())
        .ok_or_else(|| anyhow!("unknown church: {key}"))
}

fn resolve_role(registry: &Registry, key: &str) -> Result<RoleId> {
    registry
        .find_role_by_name(key)
        .or_else(|| registry.find_role(&RoleId::new(key)))
        .map(|r| r.id.clone())
        .ok_or_else(|| anyhow!("unknown role: {key}"))
}

fn resolve_volunteer(registry: &Registry, key: &str) -> Result<VolunteerId> {
    let found = registry
        .find_volunteer(&VolunteerId::new(key))
        .or_else(|| registry.find_volunteer_by_name(key));
    match found {
        Some(v) => Ok(v.id.clone()),
        None => bail!("unknown volunteer: {key}"),
    }
}
