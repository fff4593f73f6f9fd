//! Built-in tools for treesh.
//!
//! The command surface is fixed: there are no user-defined tools.

mod cat;
mod cd;
mod cp;
mod echo;
mod file;
mod help;
mod ls;
mod mkdir;
mod moderation;
mod mv;
mod pwd;
mod rm;
mod vim;

use super::ToolRegistry;

/// Register all built-in tools with the registry.
pub fn register_builtins(registry: &mut ToolRegistry) {
    registry.register(echo::Echo);
    registry.register(cp::Cp);
    registry.register(mv::Mv);
    registry.register(ls::Ls);
    registry.register(file::File);
    registry.register(mkdir::Mkdir);
    registry.register(vim::Vim);
    registry.register(cd::Cd);
    registry.register(rm::Rm);
    registry.register(cat::Cat);
    registry.register(moderation::Ban);
    registry.register(moderation::Unban);
    registry.register(moderation::ListBanned);
    registry.register(help::Help);
    registry.register(pwd::Pwd);
    registry.alias("-h", "help");
}
