use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use vault_quests::catalog::default_catalog;
use vault_quests::config::{
    load_milestones, resolve_color_enabled, resolve_now, resolve_rewards_path, ENV_LOG,
};
use vault_quests::date::day_key;
use vault_quests::error::CliError;
use vault_quests::model::{Milestone, Quest};
use vault_quests::output::{quest_rows, render_simple_table, to_stable_json, Styler, QUEST_HEADERS};
use vault_quests::script::{parse_script, replay};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Format {
    Table,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "quests", version, about = "Vault quest and streak engine")]
struct Cli {
    /// Overrides logical "now" (RFC3339) for deterministic output/testing.
    #[arg(long, global = true)]
    now: Option<String>,

    /// JSON reward tiers file: [{"threshold": 1}, ...]
    #[arg(long, global = true)]
    rewards: Option<String>,

    #[arg(long, global = true, value_enum, default_value = "table")]
    format: Format,

    /// Disables ANSI color output.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Lists the built-in quest catalog.
    Catalog,
    /// Shows the streak milestone table.
    Milestones,
    /// Prints the UTC day-key for an epoch-millisecond timestamp.
    DayKey(DayKeyArgs),
    /// Replays a JSON script of steps through a fresh engine.
    Replay(ReplayArgs),
}

#[derive(Args, Debug)]
struct DayKeyArgs {
    #[arg(allow_hyphen_values = true)]
    millis: String,
}

#[derive(Args, Debug)]
struct ReplayArgs {
    script: String,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(c) => c,
        Err(e) => {
            let _ = e.print();
            std::process::exit(if e.use_stderr() { 2 } else { 0 });
        }
    };

    init_tracing();

    let exit = match run(cli) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{}", e);
            e.exit_code
        }
    };

    std::process::exit(exit);
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env(ENV_LOG)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn print_line(s: &str) {
    println!("{}", s);
}

fn print_json<T: serde::Serialize>(obj: &T) -> Result<(), CliError> {
    let s = to_stable_json(obj).map_err(|e| CliError::io(format!("JSON output error: {}", e)))?;
    println!("{}", s);
    Ok(())
}

fn milestone_rows(milestones: &[Milestone]) -> Vec<Vec<String>> {
    milestones
        .iter()
        .map(|m| vec![m.days.to_string(), m.xp.to_string()])
        .collect()
}

fn run(cli: Cli) -> Result<(), CliError> {
    let now = resolve_now(cli.now.as_deref())?;
    let rewards_path = resolve_rewards_path(cli.rewards.as_deref());
    let styler = Styler::new(resolve_color_enabled(cli.no_color));

    match cli.command {
        Command::Catalog => {
            let quests: Vec<Quest> = default_catalog().iter().map(|d| d.instantiate()).collect();

            if cli.format == Format::Json {
                #[derive(serde::Serialize)]
                struct Out {
                    quests: Vec<Quest>,
                }
                print_json(&Out { quests })?;
            } else {
                print_line(&render_simple_table(&QUEST_HEADERS, &quest_rows(&quests, &styler)));
            }
            Ok(())
        }

        Command::Milestones => {
            let milestones = load_milestones(rewards_path.as_deref())?;

            if cli.format == Format::Json {
                #[derive(serde::Serialize)]
                struct Out {
                    milestones: Vec<Milestone>,
                }
                print_json(&Out { milestones })?;
            } else {
                print_line(&render_simple_table(&["days", "xp"], &milestone_rows(&milestones)));
            }
            Ok(())
        }

        Command::DayKey(args) => {
            let millis: f64 = args
                .millis
                .trim()
                .parse()
                .map_err(|_| CliError::usage(format!("Invalid timestamp: {}", args.millis)))?;
            let key = day_key(millis)?;

            if cli.format == Format::Json {
                #[derive(serde::Serialize)]
                struct Out {
                    day_key: String,
                }
                print_json(&Out {
                    day_key: key.to_string(),
                })?;
            } else {
                print_line(&key.to_string());
            }
            Ok(())
        }

        Command::Replay(args) => {
            let txt = fs::read_to_string(&args.script)
                .map_err(|_| CliError::io(format!("Cannot read script: {}", args.script)))?;
            let script = parse_script(&txt)?;
            let milestones = load_milestones(rewards_path.as_deref())?;
            let report = replay(&script, milestones, now)?;

            if cli.format == Format::Json {
                print_json(&report)?;
                return Ok(());
            }

            print_line(&render_simple_table(&QUEST_HEADERS, &quest_rows(&report.quests, &styler)));

            if !report.streaks.is_empty() {
                print_line("");
                let rows: Vec<Vec<String>> = report
                    .streaks
                    .iter()
                    .map(|s| {
                        let next = match (s.milestones.next, s.milestones.days_to_next) {
                            (Some(m), Some(d)) => format!("{}d (+{} xp) in {}d", m.days, m.xp, d),
                            _ => "all reached".to_string(),
                        };
                        vec![
                            s.vault_id.clone(),
                            s.wallet.clone(),
                            s.current.to_string(),
                            s.longest.to_string(),
                            next,
                        ]
                    })
                    .collect();
                print_line(&render_simple_table(
                    &["vault", "wallet", "current", "longest", "next milestone"],
                    &rows,
                ));
            }

            print_line("");
            print_line(&format!("xp: {}", report.xp_total));
            Ok(())
        }
    }
}
