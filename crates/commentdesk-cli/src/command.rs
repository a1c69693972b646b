use anyhow::{anyhow, bail, Result};
use commentdesk_core::models::AiModel;
use commentdesk_core::Route;

pub const USAGE: &str = "\
Usage: commentdesk <command> [args]

Commands:
  register <username> [email]                 Create an account
  login [username]                            Log in (password is prompted)
  logout                                      Forget the stored session
  whoami                                      Show the logged-in user
  open <path>                                 Navigate to a page (/, /login, /register)
  generate <student_name> <student_info> [model]
                                              Generate a comment (models: deepseek, zhipu, qwen, kimi)
  history [limit]                             List recent comments
  delete <id>                                 Delete a comment
  help                                        Show this message";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Register { username: String, email: Option<String> },
    Login { username: Option<String> },
    Logout,
    Whoami,
    Open { path: String },
    Generate { student_name: String, student_info: String, model: AiModel },
    History { limit: Option<u32> },
    Delete { id: i64 },
    Help,
}

impl Command {
    /// Parse arguments, excluding the program name
    pub fn parse(args: &[String]) -> Result<Self> {
        let Some((name, rest)) = args.split_first() else {
            return Ok(Command::Help);
        };
        let arg = |i: usize| rest.get(i).cloned();

        let command = match name.as_str() {
            "register" => Command::Register {
                username: arg(0).ok_or_else(|| anyhow!("register needs a username"))?,
                email: arg(1),
            },
            "login" => Command::Login { username: arg(0) },
            "logout" => Command::Logout,
            "whoami" => Command::Whoami,
            "open" => Command::Open {
                path: arg(0).ok_or_else(|| anyhow!("open needs a path"))?,
            },
            "generate" => {
                let (Some(student_name), Some(student_info)) = (arg(0), arg(1)) else {
                    bail!("generate needs a student name and student info");
                };
                let model = match arg(2) {
                    Some(m) => m.parse::<AiModel>().map_err(|e| anyhow!(e))?,
                    None => AiModel::default(),
                };
                Command::Generate {
                    student_name,
                    student_info,
                    model,
                }
            }
            "history" => Command::History {
                limit: arg(0)
                    .map(|l| l.parse().map_err(|_| anyhow!("limit must be a positive number")))
                    .transpose()?,
            },
            "delete" => Command::Delete {
                id: arg(0)
                    .ok_or_else(|| anyhow!("delete needs a comment id"))?
                    .parse()
                    .map_err(|_| anyhow!("comment id must be a number"))?,
            },
            "help" | "--help" | "-h" => Command::Help,
            other => bail!("Unknown command '{}'\n\n{}", other, USAGE),
        };
        Ok(command)
    }

    /// Page the command runs on; the route guard is consulted before running it
    pub fn page(&self) -> Option<Route> {
        match self {
            Command::Register { .. } => Some(Route::Register),
            Command::Login { .. } => Some(Route::Login),
            Command::Whoami
            | Command::Generate { .. }
            | Command::History { .. }
            | Command::Delete { .. } => Some(Route::Home),
            Command::Logout | Command::Open { .. } | Command::Help => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_empty_is_help() {
        assert_eq!(Command::parse(&[]).unwrap(), Command::Help);
    }

    #[test]
    fn test_parse_login() {
        assert_eq!(
            Command::parse(&args(&["login"])).unwrap(),
            Command::Login { username: None }
        );
        assert_eq!(
            Command::parse(&args(&["login", "alice"])).unwrap(),
            Command::Login {
                username: Some("alice".to_string())
            }
        );
    }

    #[test]
    fn test_parse_generate() {
        assert_eq!(
            Command::parse(&args(&["generate", "Li Lei", "diligent", "qwen"])).unwrap(),
            Command::Generate {
                student_name: "Li Lei".to_string(),
                student_info: "diligent".to_string(),
                model: AiModel::Qwen,
            }
        );
        assert!(Command::parse(&args(&["generate", "Li Lei"])).is_err());
        assert!(Command::parse(&args(&["generate", "a", "b", "gpt"])).is_err());
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(
            Command::parse(&args(&["history", "5"])).unwrap(),
            Command::History { limit: Some(5) }
        );
        assert!(Command::parse(&args(&["history", "-1"])).is_err());
        assert_eq!(
            Command::parse(&args(&["delete", "12"])).unwrap(),
            Command::Delete { id: 12 }
        );
        assert!(Command::parse(&args(&["delete"])).is_err());
    }

    #[test]
    fn test_parse_unknown() {
        assert!(Command::parse(&args(&["frobnicate"])).is_err());
    }

    #[test]
    fn test_command_pages() {
        assert_eq!(Command::Whoami.page(), Some(Route::Home));
        assert_eq!(Command::Login { username: None }.page(), Some(Route::Login));
        assert_eq!(Command::Logout.page(), None);
    }
}
