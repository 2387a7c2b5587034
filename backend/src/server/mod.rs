//! Server construction and dependency wiring.

mod config;

pub use config::ServerConfig;

use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use tracing::warn;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[cfg(debug_assertions)]
use qbank::doc::ApiDoc;
use qbank::domain::ports::{
    AreaRepository, CountCache, FixtureAreaRepository, FixtureQuestionRepository,
    FixtureSourceRepository, MemoryObjectStorage, NoOpCountCache, ObjectStorage,
    QuestionRepository, SourceRepository,
};
use qbank::domain::{
    ChoiceSectionService, CitationSectionService, ContentSectionService, ImageReferenceResolver,
    ImageService, QuestionGuard, QuestionService, SolutionSectionService,
};
use qbank::inbound::http::health::{HealthState, live, ready};
use qbank::inbound::http::images::upload_image;
use qbank::inbound::http::questions::{
    create_question, delete_question, get_question, list_questions, update_areas,
    update_difficulty, update_question_type, update_subtopic,
};
use qbank::inbound::http::sections::{
    update_choice, update_question_content, update_question_source, update_solution,
};
use qbank::inbound::http::state::HttpState;
use qbank::outbound::cache::RedisCountCache;
use qbank::outbound::persistence::{
    DbPool, DieselAreaRepository, DieselQuestionRepository, DieselSourceRepository, PoolConfig,
};
use qbank::outbound::storage::ProxySignedStorage;

struct Repositories {
    questions: Arc<dyn QuestionRepository>,
    areas: Arc<dyn AreaRepository>,
    sources: Arc<dyn SourceRepository>,
}

async fn build_cache(config: &ServerConfig) -> std::io::Result<Arc<dyn CountCache>> {
    match &config.redis_url {
        Some(url) => {
            let cache = RedisCountCache::connect(url)
                .await
                .map_err(|err| std::io::Error::other(format!("redis cache setup failed: {err}")))?;
            Ok(Arc::new(cache))
        }
        None => {
            warn!("REDIS_URL unset; pagination totals hit the store on every page");
            Ok(Arc::new(NoOpCountCache))
        }
    }
}

fn build_storage(config: &ServerConfig) -> std::io::Result<Arc<dyn ObjectStorage>> {
    match &config.storage {
        Some(settings) => {
            let storage = ProxySignedStorage::new(settings.clone())
                .map_err(|err| std::io::Error::other(format!("storage client setup failed: {err}")))?;
            Ok(Arc::new(storage))
        }
        None => {
            warn!("storage settings unset; using in-memory object storage (dev only)");
            Ok(Arc::new(MemoryObjectStorage::new()))
        }
    }
}

async fn build_repositories(
    config: &ServerConfig,
    cache: Arc<dyn CountCache>,
) -> std::io::Result<Repositories> {
    match &config.database_url {
        Some(url) => {
            let pool = DbPool::new(PoolConfig::new(url))
                .await
                .map_err(|err| std::io::Error::other(format!("database pool setup failed: {err}")))?;
            Ok(Repositories {
                questions: Arc::new(DieselQuestionRepository::new(pool.clone(), cache)),
                areas: Arc::new(DieselAreaRepository::new(pool.clone())),
                sources: Arc::new(DieselSourceRepository::new(pool)),
            })
        }
        None => {
            warn!("DATABASE_URL unset; using fixture repositories (dev only)");
            Ok(Repositories {
                questions: Arc::new(FixtureQuestionRepository),
                areas: Arc::new(FixtureAreaRepository::default()),
                sources: Arc::new(FixtureSourceRepository::default()),
            })
        }
    }
}

fn build_http_state(config: &ServerConfig, repositories: Repositories, storage: Arc<dyn ObjectStorage>) -> HttpState {
    let Repositories {
        questions,
        areas,
        sources,
    } = repositories;

    let resolver = ImageReferenceResolver::new(storage.clone(), config.container.clone());
    let guard = QuestionGuard::new(questions.clone());

    HttpState {
        questions: QuestionService::new(
            questions.clone(),
            areas,
            sources.clone(),
            resolver.clone(),
        ),
        contents: ContentSectionService::new(questions.clone(), guard.clone(), resolver.clone()),
        choices: ChoiceSectionService::new(questions.clone(), guard.clone(), resolver.clone()),
        solutions: SolutionSectionService::new(questions.clone(), guard.clone(), resolver),
        citations: CitationSectionService::new(questions, sources, guard),
        images: ImageService::new(storage, config.container.clone()),
    }
}

fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let api = web::scope("/api/v1")
        .service(create_question)
        .service(list_questions)
        .service(get_question)
        .service(delete_question)
        .service(update_question_type)
        .service(update_subtopic)
        .service(update_difficulty)
        .service(update_areas)
        .service(update_question_content)
        .service(update_choice)
        .service(update_solution)
        .service(update_question_source)
        .service(upload_image);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .service(api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app;

    app
}

/// Construct an Actix HTTP server using the provided health state and
/// configuration.
///
/// # Errors
///
/// Propagates [`std::io::Error`] when a configured dependency cannot be
/// wired or when binding the socket fails.
pub async fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let cache = build_cache(&config).await?;
    let storage = build_storage(&config)?;
    let repositories = build_repositories(&config, cache).await?;
    let http_state = web::Data::new(build_http_state(&config, repositories, storage));

    let server_health_state = health_state.clone();
    let server = HttpServer::new(move || {
        build_app(server_health_state.clone(), http_state.clone())
    })
    .bind(config.bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
