use warden::prelude::*;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

const DEFAULT_SESSION_FILE: &str = "warden-session.json";

struct Settings {
    session_file: String,
    username: Option<String>,
    password: Option<String>,
    logout: bool,
}

impl Settings {
    fn from_env() -> Self {
        let var = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        Self {
            session_file: var("WARDEN_SESSION_FILE")
                .unwrap_or_else(|| DEFAULT_SESSION_FILE.into()),
            username: var("WARDEN_USERNAME"),
            password: var("WARDEN_PASSWORD"),
            logout: std::env::args().any(|a| a == "--logout"),
        }
    }
}

fn describe(session: &Session) -> String {
    match &session.user {
        Some(user) if session.is_authenticated() => {
            format!("{} as {} ({})", session.status, user.username, user.email)
        }
        _ => session.status.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), WardenError> {
    warden::init_tracing();
    let settings = Settings::from_env();

    let warden = WardenBuilder::from_env()?
        .store(FileStore::new(&settings.session_file))
        .build()?;
    let _sub = warden.subscribe(|s| println!("session: {}", describe(s)));

    let restored = warden.restore();
    if restored.is_authenticated() && !warden.ensure_fresh().await {
        println!("stored session was rejected by the backend");
    }

    if settings.logout {
        warden.logout();
        return Ok(());
    }

    if !warden.is_authenticated() {
        let (Some(username), Some(password)) = (&settings.username, &settings.password)
        else {
            println!("not signed in; set WARDEN_USERNAME and WARDEN_PASSWORD to log in");
            return Ok(());
        };
        if let Err(e) = warden.login(username, password).await {
            tracing::error!(error = %e, "login failed");
            return Err(e.into());
        }
    }

    if let Some((name, value)) = warden.auth_header() {
        let shown = value.chars().take("Bearer ".len() + 4).collect::<String>();
        println!("{name}: {shown}...");
    }
    Ok(())
}
