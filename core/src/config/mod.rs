mod load;
mod types;

pub use load::{
    apply_env_overrides, load_default, load_from_path, load_from_str, load_layered,
    CONFIG_PATH_ENV,
};
pub use types::{AwaiterConfig, LoggingConfig, SidebarConfig};
