use crate::CLAP_STYLING;
use clap::{arg, command};
use url::Url;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("crator")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("crator")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Only log warnings and errors").required(false))
        .subcommand_required(true)
        .subcommand(
            command!("crawl")
                .about(
                    "Fetch a host or collection of hosts, reject captcha, login and mirror \
                pages, and save the rest as <index>.html.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .help("The URL to fetch")
                        .value_parser(clap::value_parser!(Url))
                        .conflicts_with("hosts-file"),
                )
                .arg(
                    arg!(-H --"hosts-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of URLs to fetch")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .conflicts_with("url"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Directory receiving the saved pages")
                        .default_value("~/.local/share/crator/pages"),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of parallel page writers.")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("1"),
                )
                .arg(
                    arg!(--"login-url" <URL>)
                        .required(false)
                        .help("Known login page of the site; redirects through it are rejected")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(--"proxy" <URL>)
                        .required(false)
                        .help("Proxy for all requests, e.g. socks5h://127.0.0.1:9050 for onion sites"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("30"),
                )
                .arg(
                    arg!(--"poll-ms" <MILLIS>)
                        .required(false)
                        .help("Longest the saver waits before re-checking an idle queue")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("100"),
                )
                .arg(
                    arg!(--"pace-ms" <MILLIS>)
                        .required(false)
                        .help("Delay between handing pages to writers (0 disables)")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("100"),
                )
                .arg(
                    arg!(--"json")
                        .required(false)
                        .help("Print the summary as JSON")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
}
