use tokenkeeper::application_impl::fake_login;
use tokenkeeper::application_port::TokenRefreshService;
use tokenkeeper::client::*;
use tokenkeeper::domain_model::*;
use tokenkeeper::logger::*;
use tokenkeeper::settings::*;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap();

    let project_settings = parse_settings(cli.settings.as_deref())?;
    debug!(?project_settings);
    let logger_config = LogConfig {
        filter: project_settings.log.filter.clone(),
    };
    logger.reload_from_config(&logger_config)?;

    let client = SessionClient::try_new(&project_settings)?;
    let service = client.refresh_service.clone();

    match cli.command {
        Command::Status => print_status(service.as_ref()),
        Command::Login {
            access_token,
            refresh_token,
            user,
        } => {
            let user = user.map(|username| SessionUser {
                id: username.clone(),
                username,
                role: None,
            });
            service.record_login(LoginTokens {
                access_token: AccessToken(access_token),
                refresh_token: RefreshToken(refresh_token),
                user,
            })?;
            print_status(service.as_ref());
        }
        Command::DemoLogin { user } => {
            if project_settings.session.backend != "fake" {
                return Err(anyhow::anyhow!("demo-login needs session.backend = \"fake\""));
            }
            service.record_login(fake_login(&user, chrono::Utc::now())?)?;
            print_status(service.as_ref());
        }
        Command::Refresh => {
            let token = service.refresh_token().await?;
            println!(
                "refreshed, {} second(s) left",
                token
                    .seconds_until_expiry(chrono::Utc::now())
                    .map_or_else(|| "unknown".to_string(), |s| s.to_string())
            );
        }
        Command::Logout => {
            service.logout();
            println!("logged out");
        }
        Command::Watch => {
            if service.access_token().is_none() {
                return Err(anyhow::anyhow!("no stored session, run `login` first"));
            }
            client.start_monitor();
            signal::ctrl_c().await?;

            let shutdown_timeout = std::time::Duration::from_secs(10);
            match tokio::time::timeout(shutdown_timeout, client.shutdown()).await {
                Ok(_) => info!("session client shutdown successfully"),
                Err(_) => error!("session client shutdown timed out"),
            }
            print_status(service.as_ref());
        }
    }

    Ok(())
}

fn print_status(service: &dyn TokenRefreshService) {
    let Some(token) = service.access_token() else {
        println!("not logged in");
        return;
    };
    let subject = token
        .unverified_claims()
        .and_then(|c| c.sub)
        .map_or_else(|| "unknown".to_string(), |s| s.to_string());
    match service.time_until_expiry() {
        Some(secs) => println!(
            "subject {subject}: {secs} second(s) left, authenticated = {}",
            service.is_authenticated()
        ),
        None => println!("subject {subject}: token payload unreadable"),
    }
}
