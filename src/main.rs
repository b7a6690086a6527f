use std::path::Path;

use anyhow::{Context, anyhow, bail};
use chrono::{Local, Timelike};
use clap::{ArgAction, CommandFactory, Parser, ValueEnum};
use clap_complete::Shell;
use comfy_table::{ContentArrangement, Table};
use is_terminal::IsTerminal;
use serde::{Deserialize, Serialize};

mod classifier;
mod console;
mod excel;
mod magnitude;
mod offense_xml;
mod report;
mod schema;
mod template;
mod tokenizer;

use classifier::{Classification, Classifier};
use magnitude::MagnitudeTable;
use report::ShiftInfo;
use schema::{Event, EventKind, Layout};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
enum Mode {
    /// Parse the raw export and write the per-shift WA summary
    Wa,
    /// Parse the raw export and write per-event detail files
    Details,
    /// Convert the offense XML export to an Excel workbook
    Excel,
    /// Write a starter detail template for an event name
    Template,
    /// Classify event names against the reference list
    FpCheck,
    /// Append an event name and magnitude to the reference table
    AddEvent,
}

#[derive(Clone, Copy, Debug, ValueEnum, Serialize, Deserialize)]
enum LogLevel { Error, Warn, Info, Debug, Trace }

#[derive(Clone, Copy, Debug, ValueEnum, Serialize, Deserialize)]
enum LogFormat { Text, Json }

#[derive(Parser, Debug)]
#[command(
    name = "ShiftReport",
    about = "SOC shift-report generator",
    long_about = "SOC shift-report generator that parses tab-delimited analyst exports and XML offense exports, classifies event names against a reference list, and writes WA summaries, per-event detail files, and Excel exports.",
    after_long_help = "Examples:\n  ShiftReport --mode wa --shift 1\n  ShiftReport --mode details --shift 3 --layout extended\n  ShiftReport --mode excel --xml-path closed.xml --shift 2\n  ShiftReport --mode fp-check --reference-csv event_db.csv\n  ShiftReport --mode add-event --event-name \"Port Scan\" --magnitude 3"
)]
struct Args {
    /// Run one mode non-interactively; omit for the menu
    #[arg(long, value_enum)]
    mode: Option<Mode>,
    /// Shift key: 1=afternoon, 2=night, 3=morning
    #[arg(long, short = 's')]
    shift: Option<String>,
    #[arg(long, default_value = "raw.txt")]
    raw_path: String,
    #[arg(long, default_value = "raw.xml")]
    xml_path: String,
    #[arg(long, default_value = "templates")]
    template_dir: String,
    #[arg(long, default_value = "outputs")]
    output_dir: String,
    #[arg(long, default_value = "event_db.csv")]
    reference_csv: String,
    #[arg(long, default_value = "false_positives.txt")]
    fp_list: String,
    #[arg(long, value_enum, default_value = "legacy")]
    layout: Layout,
    /// Event name for the template and add-event modes
    #[arg(long)]
    event_name: Option<String>,
    /// Magnitude 1-10 for the add-event mode
    #[arg(long)]
    magnitude: Option<u8>,
    #[arg(long, short = 'C', default_value_t = false)]
    no_color: bool,
    #[arg(long, default_value_t = false)]
    force_color: bool,
    #[arg(long, default_value_t = false)]
    progress: bool,
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,
    #[arg(short = 'q', long, default_value_t = false)]
    quiet: bool,
    #[arg(long)]
    log_level: Option<LogLevel>,
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
    #[arg(long)]
    log_path: Option<String>,
    #[arg(long, value_enum)]
    completions: Option<Shell>,
    #[arg(long)]
    completions_out: Option<String>,
    #[arg(long)]
    config: Option<String>,
}

#[derive(Deserialize)]
struct AppConfig {
    raw_path: Option<String>,
    xml_path: Option<String>,
    template_dir: Option<String>,
    output_dir: Option<String>,
    reference_csv: Option<String>,
    fp_list: Option<String>,
    layout: Option<Layout>,
    shift: Option<String>,
    progress: Option<bool>,
    force_color: Option<bool>,
    log_format: Option<LogFormat>,
    log_path: Option<String>,
}

fn apply_config(args: &mut Args, cfg: AppConfig) {
    if args.raw_path == "raw.txt" && let Some(v) = cfg.raw_path { args.raw_path = v; }
    if args.xml_path == "raw.xml" && let Some(v) = cfg.xml_path { args.xml_path = v; }
    if args.template_dir == "templates" && let Some(v) = cfg.template_dir { args.template_dir = v; }
    if args.output_dir == "outputs" && let Some(v) = cfg.output_dir { args.output_dir = v; }
    if args.reference_csv == "event_db.csv" && let Some(v) = cfg.reference_csv { args.reference_csv = v; }
    if args.fp_list == "false_positives.txt" && let Some(v) = cfg.fp_list { args.fp_list = v; }
    if let Some(v) = cfg.layout { args.layout = v; }
    if args.shift.is_none() { args.shift = cfg.shift; }
    if let Some(v) = cfg.progress { args.progress = v; }
    if let Some(v) = cfg.force_color { args.force_color = v; }
    if let Some(v) = cfg.log_format { args.log_format = Some(v); }
    if args.log_path.is_none() && let Some(v) = cfg.log_path { args.log_path = Some(v); }
}

fn main() {
    let mut args = Args::parse();
    if let Some(sh) = args.completions {
        let mut cmd = Args::command();
        if let Some(path) = args.completions_out.as_ref() {
            if let Ok(mut f) = std::fs::File::create(path) { clap_complete::generate(sh, &mut cmd, "ShiftReport", &mut f); } else { clap_complete::generate(sh, &mut cmd, "ShiftReport", &mut std::io::stdout()); }
        } else {
            clap_complete::generate(sh, &mut cmd, "ShiftReport", &mut std::io::stdout());
        }
        return;
    }
    if let Some(p) = args.config.as_ref()
        && let Ok(s) = std::fs::read_to_string(p)
        && let Ok(cfg) = toml::from_str::<AppConfig>(&s) { apply_config(&mut args, cfg); }
    else {
        let def = "ShiftReport.toml";
        if let Ok(s) = std::fs::read_to_string(def)
            && let Ok(cfg) = toml::from_str::<AppConfig>(&s) { apply_config(&mut args, cfg); }
    }
    init_logging(&args);
    let term = std::env::var("TERM").unwrap_or_default();
    let no_color_env = std::env::var_os("NO_COLOR").is_some();
    let color_default = std::io::stdout().is_terminal() && !no_color_env && term != "dumb";
    let enable_color = if args.force_color { true } else { color_default && !args.no_color };
    console::set_color(enable_color);
    match args.mode {
        Some(mode) => {
            if let Err(e) = run_mode(mode, &args) {
                console::error(&format!("{:#}", e));
                std::process::exit(1);
            }
        }
        None => menu_loop(&args),
    }
}

fn init_logging(args: &Args) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if args.quiet {
        builder.filter_level(log::LevelFilter::Error);
    } else if let Some(lvl) = args.log_level {
        let f = match lvl { LogLevel::Error => log::LevelFilter::Error, LogLevel::Warn => log::LevelFilter::Warn, LogLevel::Info => log::LevelFilter::Info, LogLevel::Debug => log::LevelFilter::Debug, LogLevel::Trace => log::LevelFilter::Trace };
        builder.filter_level(f);
    } else if args.verbose > 0 {
        let f = if args.verbose >= 3 { log::LevelFilter::Trace } else if args.verbose == 2 { log::LevelFilter::Debug } else { log::LevelFilter::Info };
        builder.filter_level(f);
    }
    if let Some(fmt) = args.log_format {
        match fmt {
            LogFormat::Json => {
                builder.format(|buf, record| {
                    use std::io::Write;
                    let ts = chrono::Local::now().to_rfc3339();
                    let obj = serde_json::json!({
                        "ts": ts,
                        "level": record.level().to_string(),
                        "target": record.target(),
                        "msg": record.args().to_string(),
                    });
                    writeln!(buf, "{}", obj)
                });
            }
            LogFormat::Text => {
                builder.format(|buf, record| {
                    use std::io::Write;
                    let ts = chrono::Local::now().format("%H:%M:%S");
                    writeln!(buf, "[{:<5} {}] {}", record.level(), ts, record.args())
                });
            }
        }
    }
    if let Some(path) = args.log_path.as_ref() {
        match std::fs::File::create(path) {
            Ok(f) => {
                builder.target(env_logger::Target::Pipe(Box::new(f)));
            }
            Err(e) => {
                eprintln!("Failed to open log file {}: {}", path, e);
            }
        }
    }
    builder.init();
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MenuAction {
    Run(Mode),
    Exit,
}

const MENU: &str = "\nSelect mode:\n  1. Process raw export (WA summary)\n  2. Process raw export (event detail files)\n  3. Offense XML to Excel\n  4. Generate detail template\n  5. False-positive check\n  6. Add event to reference database\n  7. Exit";

fn menu_choice(input: &str) -> Option<MenuAction> {
    match input.trim() {
        "1" => Some(MenuAction::Run(Mode::Wa)),
        "2" => Some(MenuAction::Run(Mode::Details)),
        "3" => Some(MenuAction::Run(Mode::Excel)),
        "4" => Some(MenuAction::Run(Mode::Template)),
        "5" => Some(MenuAction::Run(Mode::FpCheck)),
        "6" => Some(MenuAction::Run(Mode::AddEvent)),
        "7" | "q" | "exit" => Some(MenuAction::Exit),
        _ => None,
    }
}

fn menu_loop(args: &Args) {
    loop {
        println!("{}", MENU);
        let Some(input) = prompt("Mode [1-7]: ") else { break };
        match menu_choice(&input) {
            Some(MenuAction::Exit) => break,
            Some(MenuAction::Run(mode)) => {
                // A failed mode reports and returns to the menu; only exit
                // leaves the loop.
                if let Err(e) = run_mode(mode, args) {
                    console::error(&format!("{:#}", e));
                }
            }
            None => console::warn(&format!("Unknown choice '{}'", input.trim())),
        }
    }
}

fn run_mode(mode: Mode, args: &Args) -> anyhow::Result<()> {
    match mode {
        Mode::Wa => {
            let shift = select_shift(args)?;
            run_wa(args, shift)
        }
        Mode::Details => {
            let shift = select_shift(args)?;
            run_details(args, shift)
        }
        Mode::Excel => {
            let shift = select_shift(args)?;
            run_excel(args, shift)
        }
        Mode::Template => run_template(args),
        Mode::FpCheck => run_fp_check(args),
        Mode::AddEvent => run_add_event(args),
    }
}

fn prompt(msg: &str) -> Option<String> {
    use std::io::Write;
    print!("{}", msg);
    let _ = std::io::stdout().flush();
    let mut line = String::new();
    match std::io::stdin().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim().to_string()),
    }
}

fn select_shift(args: &Args) -> anyhow::Result<&'static ShiftInfo> {
    if let Some(s) = args.shift.as_ref() {
        return report::shift_info(s)
            .ok_or_else(|| anyhow!("unknown shift '{}' (expected 1, 2 or 3)", s));
    }
    let default = report::default_shift(Local::now().hour());
    let input = prompt(&format!(
        "Pilih shift (1=Sore, 2=Malam, 3=Pagi) [default={}]: ",
        default.key
    ))
    .unwrap_or_default();
    if input.is_empty() {
        return Ok(default);
    }
    match report::shift_info(&input) {
        Some(s) => Ok(s),
        None => {
            console::warn(&format!("Unknown shift '{}', using default {}", input, default.key));
            Ok(default)
        }
    }
}

fn read_input(path: &str) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("input file {} not found", path))
}

fn run_wa(args: &Args, shift: &ShiftInfo) -> anyhow::Result<()> {
    let raw = read_input(&args.raw_path)?;
    let wa_template_path = Path::new(&args.template_dir).join("wa.txt");
    let wa_template = std::fs::read_to_string(&wa_template_path)
        .with_context(|| format!("WA template {} not found", wa_template_path.display()))?;
    let events = schema::parse_events(&raw, args.layout, args.progress);
    let dir = report::clean_shift_folder(Path::new(&args.output_dir), shift.key)?;
    let offenses: Vec<&Event> = events.iter().filter(|e| e.kind() == EventKind::Offense).collect();
    let logs: Vec<&Event> = events.iter().filter(|e| e.kind() == EventKind::LogActivity).collect();
    let date = Local::now().format("%d/%m/%Y").to_string();
    report::write_wa(&offenses, &logs, shift, &wa_template, &date, &dir)?;
    Ok(())
}

fn run_details(args: &Args, shift: &ShiftInfo) -> anyhow::Result<()> {
    let raw = read_input(&args.raw_path)?;
    let events = schema::parse_events(&raw, args.layout, args.progress);
    let dir = report::shift_dir(Path::new(&args.output_dir), shift.key);
    std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    let table = MagnitudeTable::load(Path::new(&args.reference_csv));
    let n = report::write_event_details(&events, &dir, Path::new(&args.template_dir), &table);
    console::info(&format!("{} detail file(s) written to {}", n, dir.display()));
    Ok(())
}

fn run_excel(args: &Args, shift: &ShiftInfo) -> anyhow::Result<()> {
    let xml = read_input(&args.xml_path)?;
    let rows = offense_xml::parse_offenses(&xml);
    if rows.is_empty() {
        log::warn!("No OffenseForm entries found in {}", args.xml_path);
    }
    let date = offense_xml::first_closed_date(&rows)
        .map(excel::localized_date)
        .unwrap_or_else(|| excel::UNKNOWN_DATE.to_string());
    let name = excel::workbook_name(shift, &date);
    excel::write_xlsx(&rows, Path::new(&name))?;
    console::ok(&format!("Excel export written to {}", name));
    Ok(())
}

fn event_name_input(args: &Args, msg: &str) -> anyhow::Result<String> {
    if let Some(n) = args.event_name.as_ref() {
        let n = n.trim();
        if n.is_empty() {
            bail!("event name must not be empty");
        }
        return Ok(n.to_string());
    }
    match prompt(msg) {
        Some(s) if !s.is_empty() => Ok(s),
        _ => bail!("no event name given"),
    }
}

fn run_template(args: &Args) -> anyhow::Result<()> {
    let name = event_name_input(args, "Event name for the template: ")?;
    let dir = Path::new(&args.template_dir);
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(format!("{}.txt", name));
    if path.exists() {
        bail!("template {} already exists", path.display());
    }
    std::fs::write(&path, template::detail_skeleton(&name))
        .with_context(|| format!("writing {}", path.display()))?;
    console::ok(&format!("Template skeleton written to {}", path.display()));
    Ok(())
}

fn run_fp_check(args: &Args) -> anyhow::Result<()> {
    let raw = read_input(&args.raw_path)?;
    let events = schema::parse_events(&raw, args.layout, args.progress);
    let table = MagnitudeTable::load(Path::new(&args.reference_csv));
    if table.is_empty() {
        log::warn!("Reference table is empty; every event name will classify as Unknown");
    }
    let fp = classifier::load_false_positives(Path::new(&args.fp_list));
    let clf = Classifier::new(table.names(), fp);
    let refs: Vec<&Event> = events.iter().collect();
    let counts = classifier::count_by_name(&refs);
    let mut out = Table::new();
    out.set_content_arrangement(ContentArrangement::Dynamic);
    out.set_header(vec!["Event Name", "Count", "Status", "Suggestions"]);
    let mut valid = 0;
    let mut fp_count = 0;
    let mut unknown = 0;
    for (name, count) in &counts {
        let cls = clf.classify(name);
        let suggestions = match &cls {
            Classification::Unknown { suggestions } => {
                unknown += 1;
                suggestions.join("\n")
            }
            Classification::FalsePositive => {
                fp_count += 1;
                String::new()
            }
            Classification::Valid => {
                valid += 1;
                String::new()
            }
        };
        out.add_row(vec![name.clone(), count.to_string(), cls.label().to_string(), suggestions]);
    }
    println!("{out}");
    console::info(&format!("{} valid, {} false positive, {} unknown", valid, fp_count, unknown));
    Ok(())
}

fn run_add_event(args: &Args) -> anyhow::Result<()> {
    let name = event_name_input(args, "Event name to add: ")?;
    let magnitude = match args.magnitude {
        Some(m) => m,
        None => prompt("Magnitude (1-10): ")
            .unwrap_or_default()
            .parse::<u8>()
            .map_err(|_| anyhow!("magnitude must be an integer between 1 and 10"))?,
    };
    magnitude::append_entry(Path::new(&args.reference_csv), &name, magnitude)?;
    console::ok(&format!("'{}' added to {} with magnitude {}", name, args.reference_csv, magnitude));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args::parse_from(["ShiftReport"])
    }

    fn empty_config() -> AppConfig {
        AppConfig {
            raw_path: None,
            xml_path: None,
            template_dir: None,
            output_dir: None,
            reference_csv: None,
            fp_list: None,
            layout: None,
            shift: None,
            progress: None,
            force_color: None,
            log_format: None,
            log_path: None,
        }
    }

    #[test]
    fn menu_maps_choices_to_modes() {
        assert_eq!(menu_choice("1"), Some(MenuAction::Run(Mode::Wa)));
        assert_eq!(menu_choice(" 3 "), Some(MenuAction::Run(Mode::Excel)));
        assert_eq!(menu_choice("6"), Some(MenuAction::Run(Mode::AddEvent)));
        assert_eq!(menu_choice("7"), Some(MenuAction::Exit));
        assert_eq!(menu_choice("exit"), Some(MenuAction::Exit));
        assert_eq!(menu_choice("nope"), None);
    }

    #[test]
    fn config_fills_unset_paths() {
        let mut args = base_args();
        let cfg = AppConfig {
            raw_path: Some("export.tsv".to_string()),
            shift: Some("2".to_string()),
            layout: Some(Layout::Extended),
            ..empty_config()
        };
        apply_config(&mut args, cfg);
        assert_eq!(args.raw_path, "export.tsv");
        assert_eq!(args.shift.as_deref(), Some("2"));
        assert_eq!(args.layout, Layout::Extended);
    }

    #[test]
    fn cli_values_win_over_config() {
        let mut args = Args::parse_from(["ShiftReport", "--raw-path", "mine.txt", "--shift", "1"]);
        let cfg = AppConfig {
            raw_path: Some("export.tsv".to_string()),
            shift: Some("2".to_string()),
            ..empty_config()
        };
        apply_config(&mut args, cfg);
        assert_eq!(args.raw_path, "mine.txt");
        assert_eq!(args.shift.as_deref(), Some("1"));
    }

    #[test]
    fn shift_flag_must_be_valid() {
        let mut args = base_args();
        args.shift = Some("9".to_string());
        assert!(select_shift(&args).is_err());
        args.shift = Some("3".to_string());
        assert_eq!(select_shift(&args).unwrap().greeting, "Selamat Pagi");
    }
}
