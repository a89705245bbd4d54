use crate::action::{self, Action};
use clap::ArgMatches;
use magichome_api::{encoder::Thresholds, DriverConfig};
use serde_derive::Deserialize;
use std::env;
use tracing::Level;

#[derive(Deserialize)]
pub struct Config {
    log_level: Option<String>,
    pub white_effects: Option<Thresholds>,
    pub device: Vec<Device>,
}

impl Config {
    pub fn get_log_level(&self) -> Level {
        let v = self.log_level.as_deref().unwrap_or("warn");

        match v {
            "info" => Level::INFO,
            "debug" => Level::DEBUG,
            "trace" => Level::TRACE,
            _ => Level::WARN,
        }
    }

    pub fn get_thresholds(&self) -> Thresholds {
        self.white_effects.clone().unwrap_or_default()
    }

    pub fn get_device(&self, name: &str) -> Option<&Device> {
        self.device.iter().find(|d| d.name == name)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: None,
            white_effects: None,
            device: vec![],
        }
    }
}

#[derive(Deserialize)]
pub struct Device {
    pub name: String,
    pub cfg: DriverConfig,
}

/// What the user asked for on the command line.

pub struct Invocation {
    pub device: String,
    pub action: Action,
}

fn cli() -> clap::Command {
    use clap::{crate_version, Arg, ArgAction, Command};

    Command::new("magichomed")
        .version(crate_version!())
        .about("Controls MagicHome Wi-Fi LED lights.")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Specifies the configuration file")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Sets verbosity of log; can be used more than once")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("print_cfg")
                .long("print-config")
                .help("Displays the configuration and exits")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("device")
                .value_name("DEVICE")
                .help("Name of a [[device]] entry in the configuration")
                .required_unless_present("print_cfg"),
        )
        .subcommand_required(false)
        .subcommands(action::commands())
}

// Applies the command line options to the configuration. The number
// of '-v' options determines the log level.

fn apply_cmdline(mut cfg: Config, matches: &ArgMatches) -> Config {
    match matches.get_count("verbose") {
        0 => (),
        1 => cfg.log_level = Some(String::from("info")),
        2 => cfg.log_level = Some(String::from("debug")),
        _ => cfg.log_level = Some(String::from("trace")),
    };
    cfg
}

// Pulls the device name and command from the command line. Returns
// `None` if either is missing.

fn get_invocation(matches: &ArgMatches) -> Option<Invocation> {
    let device = matches.get_one::<String>("device")?.clone();
    let action = Action::from_matches(matches.subcommand()?)?;

    Some(Invocation { device, action })
}

fn parse_config(path: &str, contents: &str) -> Option<Config> {
    match toml::from_str(contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            print!("ERROR: {},\n       ignoring {}\n", e, path);
            None
        }
    }
}

async fn from_file(path: &str) -> Option<Config> {
    use tokio::fs;

    if let Ok(contents) = fs::read(path).await {
        let contents = String::from_utf8_lossy(&contents);

        parse_config(path, &contents)
    } else {
        None
    }
}

async fn find_cfg() -> Config {
    const CFG_FILE: &str = "magichome.toml";

    // Directories that could contain a configuration file, in the
    // order they're searched. In the home directory, the file is
    // hidden (i.e. `.magichome.toml`.)

    let mut dirs = vec![String::from("./")];

    if let Ok(home) = env::var("HOME") {
        dirs.push(format!("{}/.", home))
    }

    dirs.push(String::from("/usr/local/etc/"));
    dirs.push(String::from("/etc/"));

    for dir in dirs {
        let file = format!("{}{}", &dir, CFG_FILE);

        if let Some(cfg) = from_file(&file).await {
            return cfg;
        }
    }
    Config::default()
}

fn dump_config(cfg: &Config) {
    let thr = cfg.get_thresholds();

    println!("Configuration:");
    println!("    log level: {}\n", cfg.get_log_level());

    println!("White effects:");
    println!("    color/white threshold: {}", thr.color_white_threshold);
    println!(
        "    color/white threshold (simultaneous): {}",
        thr.color_white_threshold_simultaneous
    );
    println!(
        "    color off threshold (simultaneous): {}",
        thr.color_off_threshold_simultaneous
    );
    println!(
        "    allow simultaneous color/white: {}\n",
        thr.allow_simultaneous_color_white
    );

    println!("Device configuration:");
    if !cfg.device.is_empty() {
        for ii in &cfg.device {
            println!("    name: {}\n    cfg: {:?}\n", &ii.name, &*ii.cfg)
        }
    } else {
        println!("    No devices specified.");
    }
}

#[tracing::instrument(name = "loading config")]
pub async fn get() -> Option<(Config, Invocation)> {
    let matches = cli().get_matches();

    // A file named on the command line must exist and be valid.
    // Otherwise the usual places are searched.

    let cfg = if let Some(path) = matches.get_one::<String>("config") {
        match from_file(path).await {
            Some(cfg) => cfg,
            None => {
                eprintln!("ERROR: couldn't load configuration from {}", path);
                return None;
            }
        }
    } else {
        find_cfg().await
    };
    let cfg = apply_cmdline(cfg, &matches);

    if matches.get_flag("print_cfg") {
        dump_config(&cfg);
        None
    } else if let Some(inv) = get_invocation(&matches) {
        Some((cfg, inv))
    } else {
        eprintln!("{}", cli().render_usage());
        None
    }
}
