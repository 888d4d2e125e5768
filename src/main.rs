use tracing::{error, info, warn};

use ijara::auth::sms_sender_from_config;
use ijara::db::{NewStaff, StaffRepository};
use ijara::web::{AppState, WebServer};
use ijara::{hash_password, Config, Database};

/// Create the first staff account from the environment when none exists.
///
/// `IJARA_BOOTSTRAP_STAFF_EMAIL` and `IJARA_BOOTSTRAP_STAFF_PASSWORD` must
/// both be set; `IJARA_BOOTSTRAP_STAFF_PHONE` is optional.
async fn bootstrap_staff(db: &Database) -> ijara::Result<()> {
    let (Ok(email), Ok(password)) = (
        std::env::var("IJARA_BOOTSTRAP_STAFF_EMAIL"),
        std::env::var("IJARA_BOOTSTRAP_STAFF_PASSWORD"),
    ) else {
        return Ok(());
    };

    let repo = StaffRepository::new(db.pool());
    if repo.count().await? > 0 {
        return Ok(());
    }

    let password = hash_password(&password)
        .map_err(|e| ijara::IjaraError::Config(format!("bootstrap staff password: {e}")))?;
    let staff = repo
        .create(&NewStaff {
            firstname: "Admin".to_string(),
            lastname: "Admin".to_string(),
            phone: std::env::var("IJARA_BOOTSTRAP_STAFF_PHONE").unwrap_or_default(),
            email,
            password,
            role_id: 1,
        })
        .await?;

    info!(stuff_id = staff.id, "Bootstrap staff account created");
    Ok(())
}

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = ijara::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        ijara::logging::init_console_only(&config.logging.level);
    }

    info!("ijara - student housing marketplace");

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    let db = match Database::open(&config.database.url, config.database.max_connections).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = bootstrap_staff(&db).await {
        warn!("Failed to create bootstrap staff account: {}", e);
    }

    let sms = match sms_sender_from_config(&config.sms) {
        Ok(sms) => sms,
        Err(e) => {
            error!("Failed to configure SMS provider: {}", e);
            std::process::exit(1);
        }
    };

    let server = match AppState::new(db, &config, sms)
        .and_then(|state| WebServer::new(&config, state))
    {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to start web server: {}", e);
            std::process::exit(1);
        }
    };

    info!("Server configured on {}", server.addr());

    if let Err(e) = server.run().await {
        error!("Web server error: {}", e);
        std::process::exit(1);
    }
}
