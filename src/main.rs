//! # tt - nested folder task manager
//!
//! A terminal user interface for tasks organised in folders of any depth.
//!
//! ## Key Features
//!
//! - **Nested folders**: every folder holds tasks and further folders
//! - **Per-folder progress**: completed, total and overdue counts over a
//!   folder's own tasks
//! - **Staged deletion**: mark items across folders, then confirm or cancel
//!   in one step
//! - **Single-file storage**: the whole tree is one JSON document, rewritten
//!   after every change
//!
//! ## Quick Start
//!
//! ```bash
//! echo '{"name":"Root"}' > config.json
//! tt
//!
//! # Or point at another tree
//! tt -c ~/work/tasks.json
//! ```
//!
//! ## Keys
//!
//! - `n` new item (`alt+t` switches between task and folder), `e` edit
//! - `enter` opens a folder or toggles a task, `b` goes back up
//! - `d` stages for deletion, then `c` confirms or `esc` cancels
//! - `f` sorts tasks (`1` priority, `2` name, `3` completion)
//! - `p` previews a folder, `/` filters, `r` reloads from disk, `q` quits
//!
//! Logs go to the local data directory; set `TASKTREE_LOG_LEVEL` to change
//! verbosity.

use chrono::Local;
use clap::Parser;

pub mod cli;
pub mod db;
pub mod error;
pub mod fields;
pub mod logging;
pub mod ops;
pub mod status;
pub mod task;
pub mod tree;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod input;
    pub mod item_form;
    pub mod run;
    pub mod session;
    pub mod utils;
}

use cli::Cli;
use db::Store;
use tui::session::Session;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging() {
        eprintln!("Logging disabled: {e}");
    }

    let store = Store::new(cli.config);
    let tree = match store.load_tree(Local::now()) {
        Ok(tree) => tree,
        Err(e) => {
            tracing::error!(error = %e, "failed to load task tree");
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = tui::run::run_tui(Session::new(tree, store)) {
        tracing::error!(error = %e, "terminal UI failed");
        eprintln!("Terminal error: {e}");
        std::process::exit(1);
    }
}
