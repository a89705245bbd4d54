// The commands accepted on the command line. Numeric arguments are
// clamped here since the controller expects values in range.

use clap::{value_parser, Arg, ArgMatches, Command};
use magichome_api::color::clamp;
use magichome_drv_wifi::Intent;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Action {
    Power(bool),
    Hue(u16),
    Saturation(u8),
    Brightness(u8),
    Identify,
    Rainbow,
    Pattern { pattern: u8, speed: u8 },
    Status,
    Watch,
}

fn number(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .help(help)
        .required(true)
        .allow_negative_numbers(true)
        .value_parser(value_parser!(i64))
}

pub fn commands() -> Vec<Command> {
    vec![
        Command::new("on").about("Turns the light on"),
        Command::new("off").about("Turns the light off"),
        Command::new("hue")
            .about("Sets the hue")
            .arg(number("value", "Hue in degrees (0 - 359)")),
        Command::new("saturation")
            .about("Sets the saturation")
            .arg(number("value", "Saturation percentage")),
        Command::new("brightness")
            .about("Sets the brightness")
            .arg(number("value", "Brightness percentage")),
        Command::new("identify").about("Flashes the light"),
        Command::new("rainbow").about("Sweeps the light through every hue"),
        Command::new("pattern")
            .about("Starts one of the controller's built-in patterns")
            .arg(number("pattern", "Pattern number"))
            .arg(number("speed", "Speed percentage")),
        Command::new("status").about("Reads and prints the light's state"),
        Command::new("watch").about("Prints the light's state as it changes"),
    ]
}

fn get(matches: &ArgMatches, name: &str, max: i64) -> Option<i64> {
    matches
        .get_one::<i64>(name)
        .map(|v| clamp(*v, 0, max))
}

impl Action {
    /// Builds the action from a parsed subcommand.

    pub fn from_matches((cmd, args): (&str, &ArgMatches)) -> Option<Self> {
        match cmd {
            "on" => Some(Action::Power(true)),
            "off" => Some(Action::Power(false)),
            "hue" => get(args, "value", 359).map(|v| Action::Hue(v as u16)),
            "saturation" => {
                get(args, "value", 100).map(|v| Action::Saturation(v as u8))
            }
            "brightness" => {
                get(args, "value", 100).map(|v| Action::Brightness(v as u8))
            }
            "identify" => Some(Action::Identify),
            "rainbow" => Some(Action::Rainbow),
            "pattern" => Some(Action::Pattern {
                pattern: get(args, "pattern", 255)? as u8,
                speed: get(args, "speed", 100)? as u8,
            }),
            "status" => Some(Action::Status),
            "watch" => Some(Action::Watch),
            _ => None,
        }
    }

    /// Returns the intent to send to the controller, if the action
    /// changes the light.

    pub fn intent(&self) -> Option<Intent> {
        match *self {
            Action::Power(v) => Some(Intent::Power(v)),
            Action::Hue(v) => Some(Intent::Hue(v)),
            Action::Saturation(v) => Some(Intent::Saturation(v)),
            Action::Brightness(v) => Some(Intent::Brightness(v)),
            Action::Identify => Some(Intent::Identify),
            Action::Rainbow => Some(Intent::Rainbow),
            Action::Pattern { pattern, speed } => {
                Some(Intent::Pattern { pattern, speed })
            }
            Action::Status | Action::Watch => None,
        }
    }

    /// True if the action starts an effect the program should wait
    /// on before exiting.

    pub fn is_effect(&self) -> bool {
        matches!(self, Action::Identify | Action::Rainbow)
    }
}
