pub use crate::error::Error;

pub use anstream::eprintln;
pub use anstream::println;
pub use color_eyre::eyre::{eyre, Context, Result};

use colored::Colorize;
use mockexam_core::notice::Notice;

pub fn new_table() -> prettytable::Table {
    let mut table = prettytable::Table::new();

    let format = prettytable::format::FormatBuilder::new()
        .padding(1, 1)
        .build();

    table.set_format(format);

    table
}

/// Print notices to stderr; warnings in yellow, the rest dimmed.
pub fn print_notices(notices: &[Notice]) {
    for notice in notices {
        log::debug!("notice: {:?}", notice);
        if notice.is_warning() {
            eprintln!("{} {}", "warning:".yellow().bold(), notice);
        } else {
            eprintln!("{}", notice.to_string().bright_black());
        }
    }
}
