//! Seed data script - populates the database with the studio's starter data
//!
//! Run with: cargo run --bin seed-data -- --migrate
//!
//! This creates, skipping anything that already exists:
//! - the `admin` account
//! - the Roupas, Acessórios and Decoração categories
//! - six sample products (only when the catalog is empty)
//! - a sample customer with two approved testimonials

use anyhow::Context;
use clap::Parser;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use atelier_api::{
    auth::{AuthService, InMemorySessionStore},
    db,
    dto::{NewCategory, NewProduct, NewTestimonial, NewUser, ProductQuery},
    entities::user,
    services::{CatalogService, TestimonialService, UserService},
};

#[derive(Debug, Parser)]
#[command(name = "seed-data", about = "Populate the database with starter data")]
struct Args {
    /// Database URL; defaults to the configured one
    #[arg(long)]
    database_url: Option<String>,

    /// Run migrations before seeding
    #[arg(long)]
    migrate: bool,

    /// Password given to the admin account when it is created
    #[arg(long, default_value = "admin123")]
    admin_password: String,

    /// Skip the sample customer and testimonials
    #[arg(long)]
    no_samples: bool,
}

const CATEGORIES: [(&str, &str); 3] = [
    ("Roupas", "Peças de vestuário feitas à mão"),
    ("Acessórios", "Acessórios e bolsas artesanais"),
    ("Decoração", "Itens decorativos para sua casa"),
];

struct SampleProduct {
    name: &'static str,
    description: &'static str,
    price: Decimal,
    image_url: &'static str,
    category: &'static str,
}

fn sample_products() -> Vec<SampleProduct> {
    vec![
        SampleProduct {
            name: "Vestido Floral Artesanal",
            description: "Peça exclusiva em algodão com estampa floral e acabamento feito à mão.",
            price: dec!(289.90),
            image_url: "https://images.unsplash.com/photo-1594938298603-c8148c4dae35?auto=format&fit=crop&w=800&q=80",
            category: "Roupas",
        },
        SampleProduct {
            name: "Bolsa Artesanal Bordada",
            description: "Bolsa artesanal com detalhes em bordado manual, confeccionada com materiais sustentáveis.",
            price: dec!(159.90),
            image_url: "https://images.unsplash.com/photo-1576566588028-4147f3842f27?auto=format&fit=crop&w=800&q=80",
            category: "Acessórios",
        },
        SampleProduct {
            name: "Conjunto de Almofadas Decorativas",
            description: "Conjunto com 3 almofadas decorativas feitas com tecidos de alta qualidade e detalhes em bordado.",
            price: dec!(129.90),
            image_url: "https://images.unsplash.com/photo-1590139370383-9586f5be4294?auto=format&fit=crop&w=800&q=80",
            category: "Decoração",
        },
        SampleProduct {
            name: "Nécessaire Floral",
            description: "Nécessaire feita à mão em tecido impermeável com estampa floral exclusiva.",
            price: dec!(79.90),
            image_url: "https://images.unsplash.com/photo-1591047139829-d91aecb6caea?auto=format&fit=crop&w=800&q=80",
            category: "Acessórios",
        },
        SampleProduct {
            name: "Saia Midi Artesanal",
            description: "Saia midi confeccionada artesanalmente com tecido leve e confortável.",
            price: dec!(199.90),
            image_url: "https://images.unsplash.com/photo-1577900232427-18219b8349ed?auto=format&fit=crop&w=800&q=80",
            category: "Roupas",
        },
        SampleProduct {
            name: "Toalha de Mesa Bordada",
            description: "Toalha de mesa com bordados feitos à mão, perfeita para ocasiões especiais.",
            price: dec!(149.90),
            image_url: "https://images.unsplash.com/photo-1576757286722-de9a91eb0d64?auto=format&fit=crop&w=800&q=80",
            category: "Decoração",
        },
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    let database_url = match args.database_url.clone() {
        Some(url) => url,
        None => atelier_api::config::load_config()
            .context("no --database-url given and configuration could not be loaded")?
            .database_url,
    };

    info!("=== Atelier seed data ===");
    let db_config = db::DbConfig {
        url: database_url,
        max_connections: 5,
        ..Default::default()
    };
    let pool = db::establish_connection_with_config(&db_config).await?;
    if args.migrate {
        info!("Running migrations...");
        db::run_migrations(&pool).await?;
    }
    let pool = Arc::new(pool);

    let users = UserService::new(pool.clone());
    let auth = AuthService::new(
        users.clone(),
        Arc::new(InMemorySessionStore::new()),
        chrono::Duration::hours(1),
    );
    let catalog = CatalogService::new(pool.clone());

    seed_admin(&users, &auth, &args.admin_password).await?;
    let categories = seed_categories(&catalog).await?;
    seed_products(&catalog, &categories).await?;
    if !args.no_samples {
        seed_samples(&users, &auth, &TestimonialService::new(pool.clone())).await?;
    }

    info!("=== Seed data complete ===");
    Ok(())
}

async fn seed_admin(users: &UserService, auth: &AuthService, password: &str) -> anyhow::Result<()> {
    if users.get_user_by_username("admin").await?.is_some() {
        info!("Admin account already present");
        return Ok(());
    }
    auth.create_admin(NewUser {
        username: "admin".into(),
        password: password.into(),
        first_name: "Admin".into(),
        last_name: "User".into(),
        email: "admin@ateliedarosa.com".into(),
        phone: None,
    })
    .await?;
    info!("Created admin account");
    Ok(())
}

async fn seed_categories(catalog: &CatalogService) -> anyhow::Result<HashMap<String, i32>> {
    let mut by_name: HashMap<String, i32> = catalog
        .list_categories()
        .await?
        .into_iter()
        .map(|c| (c.name, c.id))
        .collect();

    for (name, description) in CATEGORIES {
        if by_name.contains_key(name) {
            continue;
        }
        let created = catalog
            .create_category(NewCategory {
                name: name.into(),
                description: Some(description.into()),
            })
            .await?;
        info!(category = name, "Created category");
        by_name.insert(created.name, created.id);
    }
    Ok(by_name)
}

async fn seed_products(catalog: &CatalogService, categories: &HashMap<String, i32>) -> anyhow::Result<()> {
    if !catalog.list_products(ProductQuery::default()).await?.is_empty() {
        info!("Catalog already has products; skipping samples");
        return Ok(());
    }

    let mut created = 0;
    for sample in sample_products() {
        let Some(&category_id) = categories.get(sample.category) else {
            continue;
        };
        catalog
            .create_product(NewProduct {
                name: sample.name.into(),
                description: sample.description.into(),
                price: sample.price.into(),
                image_url: sample.image_url.into(),
                category_id,
                in_stock: true,
            })
            .await?;
        created += 1;
    }
    info!("Created {} products", created);
    Ok(())
}

async fn seed_samples(
    users: &UserService,
    auth: &AuthService,
    testimonials: &TestimonialService,
) -> anyhow::Result<()> {
    let customer: user::Model = match users.get_user_by_username("cliente").await? {
        Some(existing) => existing,
        None => {
            let (created, _) = auth
                .register(NewUser {
                    username: "cliente".into(),
                    password: "cliente123".into(),
                    first_name: "Maria".into(),
                    last_name: "Silva".into(),
                    email: "maria@exemplo.com".into(),
                    phone: Some("(11) 98765-4321".into()),
                })
                .await?;
            info!("Created sample customer");
            created
        }
    };

    if !testimonials.list_all().await?.is_empty() {
        return Ok(());
    }

    let texts = [
        "O vestido sob medida que encomendei ficou perfeito! Cada detalhe foi cuidadosamente trabalhado e o acabamento é impecável.",
        "As almofadas decorativas que comprei são lindas e feitas com um acabamento incrível! Mudaram completamente o visual da minha sala.",
    ];
    for text in texts {
        let created = testimonials
            .create(
                customer.id,
                NewTestimonial {
                    text: text.into(),
                    rating: 5,
                },
            )
            .await?;
        testimonials.approve(created.id).await?;
    }
    info!("Created {} approved testimonials", texts.len());
    Ok(())
}
