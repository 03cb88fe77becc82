mod commands;
mod handlers;

pub use commands::{Cli, Commands};
pub use handlers::{
    handle_create, handle_list, handle_prefetch, handle_serve, handle_show, GlobalOptions,
};
