use anyhow::{Context, Result};
use chamada::config::{Settings, default_config_path};
use chamada::directory::{Directory, admin_login};
use chamada::init::init_csv;
use chamada::logging::{determine_level, init_logging};
use chamada::model::EntryFields;
use chamada::registry::Registry;
use chamada::report::{self, Category, name_and_rank};
use chamada::session;
use chamada::store::FileStore;
use chrono::{Local, NaiveDate};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Tiragem de falta diária", long_about = None)]
struct Cli {
    /// Settings file (TOML)
    #[arg(short, long, env = "CHAMADA_CONFIG")]
    config: Option<PathBuf>,

    /// Where the day's records are kept
    #[arg(long, env = "CHAMADA_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Personnel CSV (id,nome,patente)
    #[arg(long, env = "CHAMADA_DIRECTORY")]
    directory: Option<PathBuf>,

    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a blank personnel CSV
    Init {
        #[arg(default_value = "efetivo")]
        file: String,
    },
    /// Show today's record for a member
    Status { name: String },
    /// Confirm presence or justify an absence
    Mark {
        name: String,
        #[arg(long)]
        present: bool,
        #[arg(short, long, default_value = "")]
        justification: String,
    },
    /// Administrator panel
    Admin {
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        password: String,
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand, Debug)]
enum AdminAction {
    /// Totals and members of each category
    List,
    /// Overwrite the record of a directory member
    Edit {
        id: String,
        #[arg(long)]
        present: bool,
        #[arg(short, long, default_value = "")]
        justification: String,
    },
    /// Export the three categories to an xlsx workbook
    Report {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut settings = Settings::load(&config_path)
        .with_context(|| format!("reading {}", config_path.display()))?;
    if let Some(dir) = cli.data_dir {
        settings.data_dir = dir;
    }
    if let Some(csv) = cli.directory {
        settings.directory = Some(csv);
    }
    init_logging(determine_level(&settings.log_level, cli.verbose, cli.quiet));

    let now = Local::now().naive_local();
    let today = now.date();

    match cli.command {
        Commands::Init { file } => {
            let path = init_csv(&file)?;
            println!("Arquivo criado: {}", path.display());
        }
        Commands::Status { name } => {
            let (directory, registry) = open(&settings, today)?;
            let person = directory.login(&name)?;
            println!("Olá, {}", person.name);
            match registry.find_today(&person.id, today) {
                Some(entry) => println!(
                    "Registro já realizado para hoje: {} ({})",
                    entry.status_label(),
                    entry.timestamp_string()
                ),
                None => println!("Nenhum registro para hoje."),
            }
        }
        Commands::Mark {
            name,
            present,
            justification,
        } => {
            let (directory, mut registry) = open(&settings, today)?;
            let person = directory.login(&name)?;
            let fields = EntryFields {
                justification,
                present,
            };
            let entry = session::submit(&mut registry, person, fields, now)?;
            println!("Registro atualizado com sucesso. ({})", entry.timestamp_string());
        }
        Commands::Admin {
            user,
            password,
            action,
        } => {
            let admin = admin_login(&settings.admins, &user, &password)?;
            let (directory, mut registry) = open(&settings, today)?;
            match action {
                AdminAction::List => print_panel(&registry, &directory),
                AdminAction::Edit {
                    id,
                    present,
                    justification,
                } => {
                    let fields = EntryFields {
                        justification,
                        present,
                    };
                    session::admin_edit(&mut registry, &directory, &id, fields, now)?;
                    println!("Registro editado com sucesso.");
                }
                AdminAction::Report { output } => {
                    let path = report::output_path(today, output);
                    let classification = registry.classify(&directory);
                    report::generate_report(
                        &path,
                        &classification,
                        &directory,
                        today,
                        &admin.username,
                    )?;
                    println!("Relatório gerado: {}", path.display());
                }
            }
        }
    }
    Ok(())
}

fn open(settings: &Settings, today: NaiveDate) -> Result<(Directory, Registry<FileStore>)> {
    let directory = settings
        .load_directory()
        .context("loading personnel directory")?;
    let registry = Registry::open(FileStore::new(&settings.data_dir), today);
    Ok((directory, registry))
}

fn print_panel(registry: &Registry<FileStore>, directory: &Directory) {
    let c = registry.classify(directory);

    println!("Total de {}: {}", Category::Confirmed.title(), c.confirmed.len());
    for e in &c.confirmed {
        let (name, rank) = name_and_rank(directory, e);
        println!("  Nome: {} - Patente: {}", name, rank);
        println!("  Data e Hora: {}", e.timestamp_string());
    }

    println!("Total de {}: {}", Category::Justified.title(), c.justified.len());
    for e in &c.justified {
        let (name, rank) = name_and_rank(directory, e);
        println!("  Nome: {} - Patente: {}", name, rank);
        println!("  Justificativa: {}", e.justification);
        println!("  Hora Enviada: {}", e.timestamp_string());
    }

    println!("Total de {}: {}", Category::Absent.title(), c.absent.len());
    for p in &c.absent {
        println!("  [{}] Nome: {} - Patente: {}", p.id, p.name, p.rank);
    }
}
