mod config;
mod index;
mod scan;
mod show;
mod status;

pub use config::ConfigCommand;
pub use index::IndexArgs;
pub use scan::ScanArgs;
pub use show::ShowArgs;

pub use config::handle_config;
pub use index::handle_index;
pub use scan::handle_scan;
pub use show::{handle_list, handle_show};
pub use status::handle_status;
