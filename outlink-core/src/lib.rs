pub mod config;
pub mod crawl;
pub mod data;
pub mod error;
pub mod frontier;
pub mod links;
pub mod report;

use colored::Colorize;

pub use error::{CoreError, Result};

pub fn print_banner() {
    let banner = r#"
              _   _ _       _
   ___  _   _| |_| (_)_ __ | | __
  / _ \| | | | __| | | '_ \| |/ /
 | (_) | |_| | |_| | | | | |   <
  \___/ \__,_|\__|_|_|_| |_|_|\_\
"#;
    println!("{}", banner.bright_cyan());
    println!(
        "  {} {}\n",
        "outbound link crawler".dimmed(),
        env!("CARGO_PKG_VERSION").dimmed()
    );
}
