//! Admin API example
//!
//! Exposes two CRUD controllers over in-memory storage:
//! - `articles`: declarative config loaded from `admin.yaml`, hooks in code
//! - `authors`: config built entirely in code, with a callable group
//!
//! Try it:
//!
//! ```text
//! curl -X POST localhost:3000/articles/create \
//!      -d '{"record": {"title": "Hello"}, "hydration": {"profile": "form"}}'
//! curl -X POST localhost:3000/articles/list -d '{"hydration": {"profile": "list"}}'
//! curl localhost:3000/api
//! ```

use anyhow::Result;
use this_admin::logging::init_tracing;
use this_admin::prelude::*;

impl_admin_entity!(Article, "article", {
    #[validate(length(min = 1, message = "is required"))]
    title: String,
    body: String,
    status: String,
});

fn check_author(author: &Author, method: &str, result: &mut ValidationResult) {
    if method == "validate" && !author.email.contains('@') {
        result.add_field_error("email", "is not an email address");
    }
}

impl_admin_entity!(Author, "author", validate_with = check_author, {
    #[validate(length(min = 1, message = "is required"))]
    name: String,
    email: String,
    articles: Vec<Uuid>,
});

const ARTICLE_CONFIG: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/admin_api/admin.yaml");

fn article_overrides() -> Result<ConfigOverrides<Article>> {
    let from_file = ConfigOverrides::from_yaml_file(ARTICLE_CONFIG)?;

    // New articles start as drafts
    Ok(from_file.merge(
        ConfigOverrides::<Article>::new().create_entity(|params, factory, config| {
            let mut article = factory.create(params, config)?;
            article.status = "draft".to_string();
            Ok(article)
        }),
    ))
}

fn author_overrides() -> ConfigOverrides<Author> {
    let hydration = HydrationConfig::new()
        .group(
            "main",
            HydrationGroup::properties([("id", "id"), ("label", "name")]),
        )
        .group(
            "stats",
            HydrationGroup::hydrator(|author: &Author, _ctx: &HydrationContext<'_>| {
                Ok(json!({ "article_count": author.articles.len() }).into())
            }),
        )
        .profile("list", HydrationProfile::flat(["main", "stats"]));

    ConfigOverrides::for_entity().hydration(hydration)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("info,this_admin=debug")?;

    let articles = CrudController::with_overrides(
        CrudServices::new(Arc::new(InMemoryPersistenceHandler::<Article>::new())),
        article_overrides()?,
    );
    let authors = CrudController::with_overrides(
        CrudServices::new(Arc::new(InMemoryPersistenceHandler::<Author>::new())),
        author_overrides(),
    );

    println!("🚀 Admin API on http://127.0.0.1:3000");
    println!("   POST /articles/{{action}}");
    println!("   POST /authors/{{action}}");
    println!("   GET  /api");

    AdminServerBuilder::new()
        .register("articles", articles)
        .register("authors", authors)
        .serve("127.0.0.1:3000")
        .await
}
