//! Chat-style front door to the kernel.
//!
//! Messages starting with the command prefix (`/shell` by default) are shell
//! commands; everything else is not ours. The gateway checks the ban list,
//! runs the elevation challenge for keyword-led commands, and puts the
//! banner in front of every command reply.

use std::sync::Arc;

use tracing::{info, warn};

use crate::interpreter::Prompt;
use crate::kernel::{Kernel, Reply, ShellError};
use crate::state::Session;

const BANNED: &str = "You have been banned. Please contact an administrator for help.";
const NO_COMMAND: &str = "No command detected";
const SUDO_LABEL: &str = "Enter Sudo Password:";
const SUDO_ACCEPTED: &str = "Correct Sudo Password";
const SUDO_REJECTED: &str = "Incorrect Sudo Password";
const NOTHING_RUN: &str = "No command executed";

/// Messages to post, in order, and the prompt to show after them, if any.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GatewayReply {
    pub messages: Vec<String>,
    pub prompt: Option<Prompt>,
}

impl GatewayReply {
    fn say(message: impl Into<String>) -> Self {
        Self {
            messages: vec![message.into()],
            prompt: None,
        }
    }

    fn ask(prompt: Prompt) -> Self {
        Self {
            messages: Vec::new(),
            prompt: Some(prompt),
        }
    }
}

pub struct Gateway {
    kernel: Arc<Kernel>,
}

impl Gateway {
    pub fn new(kernel: Arc<Kernel>) -> Self {
        Self { kernel }
    }

    pub fn kernel(&self) -> &Arc<Kernel> {
        &self.kernel
    }

    /// Handle one chat message. `Ok(None)` means it wasn't a shell command.
    pub async fn submit(
        &self,
        session: &mut Session,
        message: &str,
    ) -> Result<Option<GatewayReply>, ShellError> {
        let Some(command) = self.strip_prefix(message) else {
            return Ok(None);
        };
        if !session.identity().verified {
            return Err(ShellError::Unauthenticated);
        }
        session.challenge = None;

        if self.kernel.bans().is_banned(&session.identity().email).await? {
            info!(identity = %session.identity().email, "banned identity tried a command");
            return Ok(Some(GatewayReply::say(self.banner(BANNED))));
        }
        if command.is_empty() {
            return Ok(Some(GatewayReply::say(self.banner(NO_COMMAND))));
        }

        let keyword = &self.kernel.config().elevate_keyword;
        if command.split_whitespace().next() == Some(keyword.as_str()) {
            session.challenge = Some(command.to_string());
            return Ok(Some(GatewayReply::ask(Prompt::password(SUDO_LABEL))));
        }

        let reply = self.kernel.execute(session, command, None).await?;
        Ok(Some(self.relay(Vec::new(), reply)))
    }

    /// Answer whatever the session is waiting on. `None` cancels.
    pub async fn resume(
        &self,
        session: &mut Session,
        answer: Option<String>,
    ) -> Result<GatewayReply, ShellError> {
        if let Some(command) = session.challenge.take() {
            let elevation = answer.as_deref().and_then(|pw| self.kernel.sudo().verify(pw));
            let Some(elevation) = elevation else {
                warn!(identity = %session.identity().email, "elevation challenge failed");
                return Ok(GatewayReply {
                    messages: vec![SUDO_REJECTED.to_string(), NOTHING_RUN.to_string()],
                    prompt: None,
                });
            };
            info!(identity = %session.identity().email, "elevation granted");
            let reply = self.kernel.execute(session, &command, Some(&elevation)).await?;
            return Ok(self.relay(vec![SUDO_ACCEPTED.to_string()], reply));
        }

        let reply = self.kernel.resume(session, answer).await?;
        Ok(self.relay(Vec::new(), reply))
    }

    /// The command after the prefix, trimmed, if `message` starts with it.
    fn strip_prefix<'a>(&self, message: &'a str) -> Option<&'a str> {
        let prefix = &self.kernel.config().command_prefix;
        let message = message.trim();
        let head = message.get(..prefix.len())?;
        if !head.eq_ignore_ascii_case(prefix) {
            return None;
        }
        let rest = &message[prefix.len()..];
        if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
            return None;
        }
        Some(rest.trim())
    }

    fn banner(&self, text: &str) -> String {
        format!("{}\n\n{text}", self.kernel.config().banner)
    }

    fn relay(&self, mut messages: Vec<String>, reply: Reply) -> GatewayReply {
        match reply {
            Reply::Output(out) => {
                messages.push(self.banner(&out));
                GatewayReply {
                    messages,
                    prompt: None,
                }
            }
            Reply::Prompt(prompt) => GatewayReply {
                messages,
                prompt: Some(prompt),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Identity;

    fn gateway() -> Gateway {
        Gateway::new(Arc::new(Kernel::transient().unwrap()))
    }

    #[tokio::test]
    async fn test_ignores_plain_chat() {
        let gw = gateway();
        let mut session = gw.kernel().open_session(Identity::verified("a@b.c"));
        assert_eq!(gw.submit(&mut session, "hello there").await.unwrap(), None);
        assert_eq!(gw.submit(&mut session, "/shellfish").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_prefix_is_case_insensitive() {
        let gw = gateway();
        let mut session = gw.kernel().open_session(Identity::verified("a@b.c"));
        let reply = gw.submit(&mut session, "  /SHELL pwd").await.unwrap().unwrap();
        assert_eq!(reply.messages, vec!["Use /shell help to display help\n\n/".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_command() {
        let gw = gateway();
        let mut session = gw.kernel().open_session(Identity::verified("a@b.c"));
        let reply = gw.submit(&mut session, "/shell   ").await.unwrap().unwrap();
        assert_eq!(
            reply.messages,
            vec!["Use /shell help to display help\n\nNo command detected".to_string()]
        );
    }

    #[test]
    fn test_strip_prefix() {
        let gw = gateway();
        assert_eq!(gw.strip_prefix("/shell ls -r"), Some("ls -r"));
        assert_eq!(gw.strip_prefix("/shell"), Some(""));
        assert_eq!(gw.strip_prefix("/sh"), None);
        assert_eq!(gw.strip_prefix("/shells"), None);
    }
}
