//! # artvault
//!
//! Command-line interface for the artwork vault.
//!
//! ## Usage
//! ```bash
//! artvault scan /plex/Metadata
//! artvault delete /plex/Metadata/Movies/a/posters/x.jpg --reason duplicate
//! artvault undo 12 --verbose
//! ```

mod cli;

use artwork_vault::Result;

fn main() -> Result<()> {
    cli::run()
}
