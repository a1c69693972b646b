//! Wiring of the core components for the terminal client.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use commentdesk_core::api::ApiError;
use commentdesk_core::auth::{FileStorage, KeyringStorage};
use commentdesk_core::models::GenerateCommentRequest;
use commentdesk_core::{
    ApiClient, Config, CredentialGateway, GuardDecision, HttpTransport, KeyValueStorage,
    ReqwestTransport, Route, RouteGuard, RouteTable, SessionStore,
};
use tracing::{debug, warn};

use crate::command::{Command, USAGE};
use crate::navigator::TerminalNavigator;

/// Selects the session storage backend ("keyring" or "file")
const STORAGE_ENV: &str = "COMMENTDESK_STORAGE";

pub struct App {
    config: Config,
    session: SessionStore,
    api: ApiClient,
    gateway: CredentialGateway,
    guard: RouteGuard,
    routes: RouteTable,
    navigator: Arc<TerminalNavigator>,
    out: Box<dyn Write + Send>,
}

impl App {
    pub fn new() -> Result<Self> {
        let config = Config::load().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        });
        let data_dir = config.data_dir()?;

        let storage: Arc<dyn KeyValueStorage> = match std::env::var(STORAGE_ENV).as_deref() {
            Ok("keyring") => Arc::new(KeyringStorage::new()),
            _ => Arc::new(FileStorage::new(&data_dir)),
        };

        let base_url = config.api_base_url();
        debug!(%base_url, "API base URL configured");
        let transport = Arc::new(ReqwestTransport::new(base_url)?);

        Self::with_parts(config, storage, transport, Box::new(io::stdout()))
    }

    /// Wire the client over the given storage and transport, writing
    /// user-facing output to `out`.
    pub fn with_parts(
        config: Config,
        storage: Arc<dyn KeyValueStorage>,
        transport: Arc<dyn HttpTransport>,
        out: Box<dyn Write + Send>,
    ) -> Result<Self> {
        let session = SessionStore::init(storage).context("Failed to load stored session")?;
        debug!(active = session.is_active(), "Session loaded");

        let start = if session.is_active() { Route::Home } else { Route::Login };
        let navigator = Arc::new(TerminalNavigator::new(start));

        let api = ApiClient::new(transport, session.clone(), navigator.clone());
        let gateway = CredentialGateway::new(api.clone(), session.clone(), navigator.clone());
        let guard = RouteGuard::new(session.clone());

        Ok(Self {
            config,
            session,
            api,
            gateway,
            guard,
            routes: RouteTable::default(),
            navigator,
            out,
        })
    }

    pub async fn run(&mut self, command: Command) -> Result<()> {
        if let Some(page) = command.page() {
            if !self.navigate(page.path())? {
                return Ok(());
            }
        }

        let result = self.dispatch(command).await;

        for route in self.navigator.take_redirects() {
            writeln!(self.out, "Redirected to {} ({})", route.name(), route.path())?;
        }
        result
    }

    /// Run the route guard and move to `path` or wherever it redirects.
    /// Returns true when the requested page was entered.
    fn navigate(&mut self, path: &str) -> Result<bool> {
        let target = self.routes.resolve(path);
        match self.guard.check(&target) {
            GuardDecision::Allow => {
                if let Some(route) = target.route {
                    self.navigator.enter(route);
                }
                Ok(true)
            }
            GuardDecision::Redirect(route) => {
                self.navigator.enter(route);
                let reason = if route == Route::Login {
                    "you need to log in first"
                } else {
                    "you are already logged in"
                };
                writeln!(
                    self.out,
                    "{} is not available: {}. Now on {} ({}).",
                    target.path,
                    reason,
                    route.name(),
                    route.path()
                )?;
                Ok(false)
            }
        }
    }

    async fn dispatch(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Help => writeln!(self.out, "{}", USAGE)?,
            Command::Open { path } => {
                if self.navigate(&path)? {
                    let current = self.navigator.current();
                    writeln!(self.out, "Now on {}", current.path())?;
                }
            }
            Command::Register { username, email } => {
                let password = prompt_password()?;
                match self.gateway.register(&username, &password, email.as_deref()).await {
                    Ok(data) => writeln!(self.out, "{}", data.message.unwrap_or_else(|| "Registered".to_string()))?,
                    Err(e) => return Err(self.report(e)),
                }
            }
            Command::Login { username } => {
                let username = match username {
                    Some(u) => u,
                    None => prompt_username(self.config.last_username.as_deref())?,
                };
                let password = prompt_password()?;
                match self.gateway.login(&username, &password).await {
                    Ok(data) if self.session.is_active() => {
                        self.config.last_username = Some(username);
                        if let Err(e) = self.config.save() {
                            warn!(error = %e, "Failed to save config");
                        }
                        self.navigator.enter(Route::Home);
                        writeln!(self.out, "Login successful")?;
                        debug!(message = ?data.message, "Login response");
                    }
                    Ok(data) => {
                        writeln!(self.out, "{}", data.message.unwrap_or_else(|| "Login failed".to_string()))?;
                    }
                    Err(e) => return Err(self.report(e)),
                }
            }
            Command::Logout => {
                self.gateway.logout().await;
                writeln!(self.out, "Logged out")?;
            }
            Command::Whoami => {
                let user = self.session.current();
                if let (Some(name), Some(id)) = (user.username, user.user_id) {
                    writeln!(self.out, "{} (id {})", name, id)?;
                }
                match self.api.user_info().await {
                    Ok(info) => {
                        if let Some(profile) = info.user {
                            if let Some(email) = profile.email.filter(|e| !e.is_empty()) {
                                writeln!(self.out, "email: {}", email)?;
                            }
                            if let Some(created) = profile.created_at {
                                writeln!(self.out, "member since: {}", created.format("%Y-%m-%d"))?;
                            }
                        }
                    }
                    Err(e) => return Err(self.report(e)),
                }
            }
            Command::Generate {
                student_name,
                student_info,
                model,
            } => {
                writeln!(self.out, "Generating with {}...", model.label())?;
                let request = GenerateCommentRequest {
                    student_name,
                    student_info,
                    ai_model: model,
                };
                match self.api.generate_comment(&request).await {
                    Ok(resp) => {
                        writeln!(self.out, "{}", resp.comment.unwrap_or_default())?;
                        if let Some(id) = resp.comment_id {
                            writeln!(self.out, "(saved as #{})", id)?;
                        }
                    }
                    Err(e) => return Err(self.report(e)),
                }
            }
            Command::History { limit } => match self.api.comment_history(limit).await {
                Ok(resp) if resp.comments.is_empty() => writeln!(self.out, "No comments yet")?,
                Ok(resp) => {
                    for c in resp.comments {
                        let when = c
                            .created_at
                            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                            .unwrap_or_default();
                        writeln!(self.out, "#{:<5} {:<16} {:<12} {}", c.id, when, c.student_name, c.generated_comment)?;
                    }
                }
                Err(e) => return Err(self.report(e)),
            },
            Command::Delete { id } => match self.api.delete_comment(id).await {
                Ok(resp) => writeln!(self.out, "{}", resp.message.unwrap_or_else(|| "Deleted".to_string()))?,
                Err(e) => return Err(self.report(e)),
            },
        }
        Ok(())
    }

    /// Turn an API failure into the message shown to the user
    fn report(&self, e: ApiError) -> anyhow::Error {
        let message = match self.gateway.last_error() {
            Some(message) => message,
            None if e.is_unauthorized() => "Your session has expired, please log in again".to_string(),
            None => e.user_message(&e.to_string()),
        };
        anyhow::Error::new(e).context(message)
    }
}

fn prompt_username(last: Option<&str>) -> Result<String> {
    match last {
        Some(last) => print!("Username [{}]: ", last),
        None => print!("Username: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    Ok(match (input.is_empty(), last) {
        (true, Some(last)) => last.to_string(),
        _ => input.to_string(),
    })
}

fn prompt_password() -> Result<String> {
    let password = rpassword::prompt_password("Password: ")?;
    Ok(password)
}
