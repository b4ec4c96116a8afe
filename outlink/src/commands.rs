use clap::{arg, command};
use outlink_core::config::DEFAULT_CONFIG_DIR;
use url::Url;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

fn data_dir_arg() -> clap::Arg {
    arg!(-d --"data-dir" <PATH>)
        .required(false)
        .help("Directory holding the outlink database and cached blocklist")
        .default_value(DEFAULT_CONFIG_DIR)
}

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("outlink")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("outlink")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(arg!(-v --"verbose" "Enable debug logging").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Initializes the outlink database on your filesystem")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Location to store the outlink database")
                        .default_value(DEFAULT_CONFIG_DIR),
                )
                .arg(
                    arg!(-f - -"force")
                        .help(
                            "Forces the overwriting of any existing database at the specified \
                        location.",
                        )
                        .required(false),
                ),
        )
        .subcommand(
            command!("crawl")
                .about(
                    "Crawl a site and record every outbound link that is not on the blocklist. \
                Resumes the previous frontier if it still has work.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .help("A seed URL (repeatable)")
                        .value_parser(clap::value_parser!(Url))
                        .action(clap::ArgAction::Append)
                        .conflicts_with("seeds-file"),
                )
                .arg(
                    arg!(-S --"seeds-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of seed URLs")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .conflicts_with("url"),
                )
                .arg(
                    arg!(--"self-domain" <DOMAIN>)
                        .required(false)
                        .help("Links containing this string are internal (default: derived from the first seed)"),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of async worker 'threads' in the worker pool.")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"max-retries" <COUNT>)
                        .required(false)
                        .help("Fetch attempts per URL before it is marked failed")
                        .value_parser(clap::value_parser!(u32)),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Per-page fetch timeout in seconds")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--"no-refresh-blocklist")
                        .required(false)
                        .help("Use the cached blocklist instead of downloading a fresh copy")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"blocklist-url" <URL>)
                        .required(false)
                        .help("Where to download the hosts-format blocklist from"),
                )
                .arg(
                    arg!(--"match-policy" <POLICY>)
                        .required(false)
                        .help("How blocked domains match URLs: substring or host-suffix")
                        .value_parser(["substring", "host-suffix"]),
                )
                .arg(
                    arg!(-c --"config" <PATH>)
                        .required(false)
                        .help("JSON crawl configuration; command-line flags override its values")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(data_dir_arg()),
        )
        .subcommand(
            command!("report")
                .about("Summarize the recorded links and frontier state")
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                )
                .arg(
                    arg!(-s --"session" <ID>)
                        .required(false)
                        .help("Crawl session to describe (default: the most recent)"),
                )
                .arg(data_dir_arg()),
        )
        .subcommand(
            command!("frontier")
                .about("Inspect or adjust the persisted crawl frontier")
                .subcommand_required(true)
                .subcommand(
                    command!("status")
                        .about("Show entry counts per state")
                        .arg(data_dir_arg()),
                )
                .subcommand(
                    command!("requeue")
                        .about("Move failed URLs back to pending with a fresh retry budget")
                        .arg(data_dir_arg()),
                ),
        )
}
