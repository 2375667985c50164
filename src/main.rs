use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use unimate_match::config::{CollaboratorSettings, Settings, StorageBackend};
use unimate_match::core::Matcher;
use unimate_match::routes::{self, handle_json_payload_error, handle_query_payload_error, AppState};
use unimate_match::services::{
    CandidateCache, ConversationService, HttpConversationClient, HttpNotificationClient, InMemoryStore,
    LoggingConversations, LoggingNotifier, MatchService, NotificationService, PgStore, PreferenceStore,
    ProfileStore, RelationshipStore, ReviewService,
};

struct Stores {
    profiles: Arc<dyn ProfileStore>,
    preferences: Arc<dyn PreferenceStore>,
    relationships: Arc<dyn RelationshipStore>,
    reviews: Arc<dyn ReviewService>,
    database: Option<Arc<PgStore>>,
}

impl Stores {
    fn backed_by<S>(store: Arc<S>, database: Option<Arc<PgStore>>) -> Self
    where
        S: ProfileStore + PreferenceStore + RelationshipStore + ReviewService + 'static,
    {
        Self {
            profiles: store.clone(),
            preferences: store.clone(),
            relationships: store.clone(),
            reviews: store,
            database,
        }
    }
}

async fn build_stores(settings: &Settings) -> std::io::Result<Stores> {
    match settings.storage.backend {
        StorageBackend::Postgres => {
            let database = &settings.database;
            let store = PgStore::from_settings(
                &database.url,
                database.max_connections,
                database.min_connections,
                database.acquire_timeout_secs,
                database.idle_timeout_secs,
            )
            .await
            .map_err(|e| {
                error!("Failed to connect to PostgreSQL: {}", e);
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
            })?;

            info!("PostgreSQL store initialized");
            let store = Arc::new(store);
            Ok(Stores::backed_by(store.clone(), Some(store)))
        }
        StorageBackend::Memory => {
            info!("Using in-memory store; data is lost on restart");
            Ok(Stores::backed_by(Arc::new(InMemoryStore::new()), None))
        }
    }
}

fn build_collaborators(
    settings: &CollaboratorSettings,
) -> std::io::Result<(Arc<dyn ConversationService>, Arc<dyn NotificationService>)> {
    let to_io = |e: unimate_match::services::CollaboratorError| {
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    };

    let conversations: Arc<dyn ConversationService> = match &settings.conversation_url {
        Some(url) => Arc::new(HttpConversationClient::new(url.clone(), settings.timeout()).map_err(to_io)?),
        None => {
            info!("No conversation service configured, conversations are logged only");
            Arc::new(LoggingConversations)
        }
    };

    let notifications: Arc<dyn NotificationService> = match &settings.notification_url {
        Some(url) => Arc::new(HttpNotificationClient::new(url.clone(), settings.timeout()).map_err(to_io)?),
        None => {
            info!("No notification service configured, notifications are logged only");
            Arc::new(LoggingNotifier)
        }
    };

    Ok((conversations, notifications))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    // Initialize logging; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if settings.logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }

    info!("Starting Unimate matching service...");

    let stores = build_stores(&settings).await?;
    let (conversations, notifications) = build_collaborators(&settings.collaborators)?;

    let cache = Arc::new(CandidateCache::new(
        stores.profiles.clone(),
        settings.cache.profile_capacity,
    ));

    if settings.cache.warmup_enabled {
        CandidateCache::spawn_warm_up(
            cache.clone(),
            settings.cache.warmup_max_retries,
            settings.cache.warmup_retry_delay(),
        );
    }

    let weights = settings.scoring_weights();
    let matcher = Matcher::new(weights, settings.matching.recommendation_limit);

    info!("Matcher initialized with weights: {:?}", weights);

    let service = Arc::new(MatchService::new(
        cache.clone(),
        stores.preferences,
        stores.relationships,
        conversations,
        notifications,
        stores.reviews,
        matcher,
    ));

    // Build application state
    let app_state = AppState {
        service,
        cache,
        database: stores.database,
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
