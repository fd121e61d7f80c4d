// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn build_cli() -> Command {
    Command::new("aurum")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Aurum Contributors")
        .about("AUR helper core: metadata queries and conflict analysis")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .default_value("/etc/aurum.toml")
                .global(true)
                .help("Configuration file"),
        )
        .arg(
            Arg::new("aur_host")
                .long("aur-host")
                .value_name("HOST")
                .global(true)
                .help("Override the AUR host"),
        )
        .arg(
            Arg::new("db_path")
                .short('d')
                .long("db-path")
                .value_name("DIR")
                .global(true)
                .help("Override the pacman database directory"),
        )
        .subcommand(
            Command::new("info")
                .about("Show AUR records for packages")
                .arg(
                    Arg::new("names")
                        .required(true)
                        .num_args(1..)
                        .help("Package names"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print records as JSON"),
                ),
        )
        .subcommand(
            Command::new("search")
                .about("Search the AUR by name and description")
                .arg(Arg::new("terms").num_args(0..).help("Search terms"))
                .arg(
                    Arg::new("names_only")
                        .long("names-only")
                        .action(ArgAction::SetTrue)
                        .help("Match terms against package names only"),
                ),
        )
        .subcommand(Command::new("catalog").about("Enumerate every package in the AUR"))
        .subcommand(
            Command::new("conflicts")
                .about("Show conflicts for a prospective transaction")
                .arg(
                    Arg::new("repo")
                        .long("repo")
                        .value_name("NAME")
                        .action(ArgAction::Append)
                        .help("Sync repository package to install"),
                )
                .arg(
                    Arg::new("aur")
                        .long("aur")
                        .value_name("NAME")
                        .action(ArgAction::Append)
                        .help("AUR package to install"),
                ),
        )
        .subcommand(
            Command::new("replacements").about("Show installed packages that sync packages replace"),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "elvish", "fish", "powershell", "zsh"])
                        .help("Shell type"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let out_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).expect("Failed to create man directory");

    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();
    man.render(&mut buffer).expect("Failed to render man page");

    let man_path = man_dir.join("aurum.1");
    fs::write(&man_path, buffer).expect("Failed to write man page");
}
