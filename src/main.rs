use clap::{Parser, Subcommand};
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::error::Error;
use std::path::{Path, PathBuf};
use subnet_ledger::output::{
    render_allocation, render_organizations, render_reports, write_reports_csv,
};
use subnet_ledger::{
    AllocationRequest, Config, JsonFileStore, RegisterRequest, ReportQuery, SubnetManager,
};

#[derive(Parser)]
#[command(name = "subnet-ledger")]
#[command(about = "Assign IPv4 host addresses to organizations and report their subnets")]
struct Args {
    /// Ledger file (overrides SUBNET_LEDGER_STORE)
    #[arg(short, long)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a new organization
    Register {
        name: String,
        /// Declared number of PCs (informational)
        #[arg(long)]
        pc_count: u64,
    },
    /// Allocate addresses to an organization
    Allocate {
        /// JSON request file; replaces the flags below
        #[arg(long, conflicts_with_all = ["org", "ip", "subnet", "count"])]
        request: Option<PathBuf>,
        #[arg(long)]
        org: Option<String>,
        /// Base address, host bits are dropped
        #[arg(long)]
        ip: Option<String>,
        /// Prefix length ("24") or dotted mask ("255.255.255.0")
        #[arg(long)]
        subnet: Option<String>,
        #[arg(long)]
        count: Option<u64>,
        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Show assigned subnets per organization
    Report {
        /// Organization name or "all"
        #[arg(long, default_value = "all")]
        org: String,
        #[arg(long, conflicts_with = "json")]
        csv: bool,
        #[arg(long)]
        json: bool,
    },
    /// List registered organizations
    Orgs,
    /// Address counts per organization and prefix length, as JSON
    Export,
    /// Describe a network without allocating
    Calc { ip: String, subnet: String },
}

fn init_logging(path: &Path) -> Result<(), Box<dyn Error>> {
    if path.exists() {
        log4rs::init_file(path, Default::default())
            .map_err(|e| format!("Error initializing log4rs from {}: {e}", path.display()))?;
        return Ok(());
    }
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{h({l:5})} {M} - {m}{n}")))
        .build();
    let config = log4rs::Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(LevelFilter::Warn))?;
    log4rs::init_config(config)?;
    Ok(())
}

fn allocation_request(
    request: Option<PathBuf>,
    org: Option<String>,
    ip: Option<String>,
    subnet: Option<String>,
    count: Option<u64>,
) -> Result<AllocationRequest, Box<dyn Error>> {
    if let Some(path) = request {
        let json = std::fs::read_to_string(&path)
            .map_err(|e| format!("Error reading request file {}: {e}", path.display()))?;
        return Ok(AllocationRequest::from_json(&json)?);
    }
    match (org, ip, subnet, count) {
        (Some(organization_name), Some(ip_address), Some(subnet_spec), Some(requested_count)) => {
            Ok(AllocationRequest {
                organization_name,
                ip_address,
                subnet_spec,
                requested_count,
            })
        }
        _ => Err("allocate needs --request or all of --org, --ip, --subnet and --count".into()),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    let mut config = Config::from_env()?;
    if let Some(store) = args.store {
        config.store_path = store;
    }
    init_logging(&config.log_config)?;
    log::info!("#Start main() store={}", config.store_path.display());

    let store = JsonFileStore::open(&config.store_path)?;
    let manager = SubnetManager::new(store).with_mask_policy(config.mask_policy);

    match args.command {
        Command::Register { name, pc_count } => {
            let org = manager.register_organization(&RegisterRequest {
                org_name: name,
                pc_count,
            })?;
            println!("Organization '{}' registered successfully", org.name);
        }
        Command::Allocate {
            request,
            org,
            ip,
            subnet,
            count,
            json,
        } => {
            let req = allocation_request(request, org, ip, subnet, count)?;
            let result = manager.allocate(&req)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", render_allocation(&result));
            }
        }
        Command::Report { org, csv, json } => {
            let query: ReportQuery = org.parse()?;
            let reports = manager.report(&query)?;
            if csv {
                write_reports_csv(&mut std::io::stdout().lock(), &reports)?;
            } else if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                print!("{}", render_reports(&reports));
            }
        }
        Command::Orgs => {
            print!(
                "{}",
                render_organizations(&manager.organizations()?, config.display_tz)
            );
        }
        Command::Export => {
            println!("{}", serde_json::to_string_pretty(&manager.export()?)?);
        }
        Command::Calc { ip, subnet } => {
            println!(
                "{}",
                serde_json::to_string_pretty(&manager.calculate(&ip, &subnet)?)?
            );
        }
    }

    Ok(())
}
