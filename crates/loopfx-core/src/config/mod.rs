//! Configuration file utilities
//!
//! Generic YAML loading/saving plus the standard config location. The
//! binary defines the actual config struct; anything `Serialize +
//! DeserializeOwned + Default` works here.
//!
//! ```ignore
//! use loopfx_core::config::{default_config_path, load_config, save_config};
//!
//! let path = default_config_path("config.yaml");
//! let config: UnitConfig = load_config(&path);
//! save_config(&config, &path)?;
//! ```

mod io;
mod paths;

pub use io::{load_config, save_config, try_load_config};
pub use paths::{config_dir, default_config_path, APP_DIR_NAME};
