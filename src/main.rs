//! # doc-organize CLI
//!
//! Command-line interface for the document organizer.
//!
//! ## Usage
//! ```bash
//! doc-organize init-config
//! doc-organize preview ~/Documents
//! doc-organize organize ~/Documents
//! ```

mod cli;

use document_organizer::Result;

fn main() -> Result<()> {
    cli::run()
}
